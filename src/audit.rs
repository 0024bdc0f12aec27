//! Audit-log payloads for membership changes.
//!
//! Snapshots record what the rows say. They list assignment rows only, so a
//! member with a global role shows just the teams they were explicitly put
//! on, not the teams they can see.

use serde::{Deserialize, Serialize};

use crate::members::{MembershipResolver, OrganizationMember, OrganizationMemberTeam, User};

/// State of a membership at the time of an audited change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAuditSnapshot {
    pub email: Option<String>,
    #[serde(rename = "user")]
    pub user_id: Option<i64>,
    /// Active assignment rows, ascending and without duplicates.
    #[serde(rename = "teams")]
    pub team_ids: Vec<i64>,
    pub has_global_access: bool,
    pub role: String,
}

impl MemberAuditSnapshot {
    /// The audit-log payload, keyed by the serde field names.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Builds the snapshot of `member`.
///
/// Rows of other members and inactive rows are skipped. The result does not
/// depend on the order of `assignments`.
pub fn snapshot<'a, A>(member: &OrganizationMember, assignments: A) -> MemberAuditSnapshot
where
    A: IntoIterator<Item = &'a OrganizationMemberTeam>,
{
    let mut team_ids: Vec<i64> = assignments
        .into_iter()
        .filter(|a| a.organization_member_id == member.id && a.is_active)
        .map(|a| a.team_id)
        .collect();
    team_ids.sort_unstable();
    team_ids.dedup();

    MemberAuditSnapshot {
        email: member.email.clone(),
        user_id: member.user_id,
        team_ids,
        has_global_access: member.has_global_access,
        role: member.role.clone(),
    }
}

/// A single team assignment at the time of an audited change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAssignmentSnapshot {
    pub team_id: i64,
    pub member_id: i64,
    pub email: Option<String>,
    pub is_active: bool,
}

impl TeamAssignmentSnapshot {
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Builds the audit entry for one assignment row.
///
/// `email` is the linked user's address when the user record is supplied,
/// otherwise the invited address.
pub fn assignment_snapshot(
    row: &OrganizationMemberTeam,
    member: &OrganizationMember,
    user: Option<&User>,
) -> TeamAssignmentSnapshot {
    TeamAssignmentSnapshot {
        team_id: row.team_id,
        member_id: member.id,
        email: MembershipResolver::effective_email(member, user).map(str::to_owned),
        is_active: row.is_active,
    }
}
