use chrono::{DateTime, Utc};

/// Membership events emitted by orgauth actions.
///
/// Events are always fired from actions. If no listeners are registered,
/// they are silently ignored. Register listeners via
/// [`register_event_listeners`](crate::register_event_listeners) to handle events.
///
/// Events never carry invite tokens.
#[derive(Debug, Clone)]
pub enum MembershipEvent {
    // membership lifecycle
    MemberInvited {
        organization_id: i64,
        member_id: i64,
        email: String,
        role: String,
        at: DateTime<Utc>,
    },
    MemberAdded {
        organization_id: i64,
        member_id: i64,
        user_id: i64,
        role: String,
        at: DateTime<Utc>,
    },
    InviteAccepted {
        organization_id: i64,
        member_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
    },
    MemberRemoved {
        organization_id: i64,
        member_id: i64,
        at: DateTime<Utc>,
    },

    // access
    RoleChanged {
        organization_id: i64,
        member_id: i64,
        from: String,
        to: String,
        at: DateTime<Utc>,
    },
    TeamAssignmentChanged {
        organization_id: i64,
        member_id: i64,
        team_id: i64,
        is_active: bool,
        at: DateTime<Utc>,
    },
    SsoInvalidated {
        organization_id: i64,
        member_id: i64,
        at: DateTime<Utc>,
    },
}

impl MembershipEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberInvited { .. } => "member.invited",
            Self::MemberAdded { .. } => "member.added",
            Self::InviteAccepted { .. } => "member.invite_accepted",
            Self::MemberRemoved { .. } => "member.removed",
            Self::RoleChanged { .. } => "member.role.changed",
            Self::TeamAssignmentChanged { .. } => "member.team.changed",
            Self::SsoInvalidated { .. } => "member.sso.invalidated",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MemberInvited { at, .. }
            | Self::MemberAdded { at, .. }
            | Self::InviteAccepted { at, .. }
            | Self::MemberRemoved { at, .. }
            | Self::RoleChanged { at, .. }
            | Self::TeamAssignmentChanged { at, .. }
            | Self::SsoInvalidated { at, .. } => *at,
        }
    }

    /// The organization the event belongs to.
    pub fn organization_id(&self) -> i64 {
        match self {
            Self::MemberInvited {
                organization_id, ..
            }
            | Self::MemberAdded {
                organization_id, ..
            }
            | Self::InviteAccepted {
                organization_id, ..
            }
            | Self::MemberRemoved {
                organization_id, ..
            }
            | Self::RoleChanged {
                organization_id, ..
            }
            | Self::TeamAssignmentChanged {
                organization_id, ..
            }
            | Self::SsoInvalidated {
                organization_id, ..
            } => *organization_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let now = Utc::now();

        assert_eq!(
            MembershipEvent::MemberInvited {
                organization_id: 1,
                member_id: 2,
                email: "test@example.com".to_owned(),
                role: "member".to_owned(),
                at: now
            }
            .name(),
            "member.invited"
        );

        assert_eq!(
            MembershipEvent::MemberAdded {
                organization_id: 1,
                member_id: 2,
                user_id: 3,
                role: "admin".to_owned(),
                at: now
            }
            .name(),
            "member.added"
        );

        assert_eq!(
            MembershipEvent::InviteAccepted {
                organization_id: 1,
                member_id: 2,
                user_id: 3,
                at: now
            }
            .name(),
            "member.invite_accepted"
        );

        assert_eq!(
            MembershipEvent::MemberRemoved {
                organization_id: 1,
                member_id: 2,
                at: now
            }
            .name(),
            "member.removed"
        );

        assert_eq!(
            MembershipEvent::RoleChanged {
                organization_id: 1,
                member_id: 2,
                from: "member".to_owned(),
                to: "owner".to_owned(),
                at: now
            }
            .name(),
            "member.role.changed"
        );

        assert_eq!(
            MembershipEvent::TeamAssignmentChanged {
                organization_id: 1,
                member_id: 2,
                team_id: 10,
                is_active: false,
                at: now
            }
            .name(),
            "member.team.changed"
        );

        assert_eq!(
            MembershipEvent::SsoInvalidated {
                organization_id: 1,
                member_id: 2,
                at: now
            }
            .name(),
            "member.sso.invalidated"
        );
    }

    #[test]
    fn test_event_timestamp_and_organization() {
        let now = Utc::now();

        let event = MembershipEvent::InviteAccepted {
            organization_id: 4,
            member_id: 2,
            user_id: 3,
            at: now,
        };

        assert_eq!(event.timestamp(), now);
        assert_eq!(event.organization_id(), 4);
    }

    #[test]
    fn test_event_debug() {
        let event = MembershipEvent::RoleChanged {
            organization_id: 1,
            member_id: 2,
            from: "member".to_owned(),
            to: "manager".to_owned(),
            at: Utc::now(),
        };

        let debug_str = format!("{event:?}");
        assert!(debug_str.contains("RoleChanged"));
        assert!(debug_str.contains("manager"));
    }
}
