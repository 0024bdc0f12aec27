//! Core types for organization membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SecretString;

/// Top-level tenant owning members and teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

/// A project, only needed to find the organization it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub organization_id: i64,
    pub slug: String,
    pub name: String,
}

/// Single-sign-on state of a membership.
///
/// The two flags are independent; both may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberFlags {
    /// The member has linked an identity from the organization's SSO provider.
    pub sso_linked: bool,
    /// The linked identity failed validation and must be re-linked.
    pub sso_invalid: bool,
}

impl MemberFlags {
    const SSO_LINKED: i64 = 1;
    const SSO_INVALID: i64 = 1 << 1;

    /// Packs the flags into the stored bit field.
    pub fn bits(self) -> i64 {
        let mut bits = 0;
        if self.sso_linked {
            bits |= Self::SSO_LINKED;
        }
        if self.sso_invalid {
            bits |= Self::SSO_INVALID;
        }
        bits
    }

    /// Unpacks a stored bit field. Unknown bits are ignored.
    pub fn from_bits(bits: i64) -> Self {
        Self {
            sso_linked: bits & Self::SSO_LINKED != 0,
            sso_invalid: bits & Self::SSO_INVALID != 0,
        }
    }
}

/// A user's, or an invited email's, relationship to an organization.
///
/// `user_id` is `None` while the invitation is pending. At least one of
/// `user_id` and `email` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMember {
    pub id: i64,
    pub organization_id: i64,
    pub user_id: Option<i64>,
    /// Invited address. Kept as a historical record after acceptance.
    pub email: Option<String>,
    /// Role id, resolved through the role registry.
    pub role: String,
    #[serde(default)]
    pub flags: MemberFlags,
    /// Invite secret. Cleared on acceptance and never serialized.
    #[serde(default, skip_serializing)]
    pub token: Option<SecretString>,
    pub date_added: DateTime<Utc>,
    /// Legacy flag, independent of the role's global access.
    pub has_global_access: bool,
    /// Per-organization sequence number. Informational only.
    pub counter: Option<i64>,
}

impl OrganizationMember {
    /// A membership is pending until a user account claims it.
    pub fn is_pending(&self) -> bool {
        self.user_id.is_none()
    }

    /// Records a successful SSO link, clearing any earlier invalid mark.
    pub fn link_sso(&mut self) {
        self.flags.sso_linked = true;
        self.flags.sso_invalid = false;
    }

    /// Marks the linked SSO identity as needing re-validation.
    pub fn invalidate_sso(&mut self) {
        self.flags.sso_invalid = true;
    }

    pub fn unlink_sso(&mut self) {
        self.flags = MemberFlags::default();
    }
}

/// Assignment of a member to a team.
///
/// An inactive row grants no access but lets the member rejoin without a new
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMemberTeam {
    pub id: i64,
    pub organization_member_id: i64,
    pub team_id: i64,
    pub is_active: bool,
}

/// A user account as seen by the membership core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_managed: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Full name, falling back to email and then username.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.email.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(any(test, feature = "mocks"))]
impl User {
    pub fn mock(id: i64, email: &str) -> Self {
        Self {
            id,
            username: email.to_owned(),
            name: String::new(),
            email: email.to_owned(),
            is_active: true,
            is_managed: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }
}
