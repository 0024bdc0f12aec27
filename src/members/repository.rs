use std::collections::BTreeSet;

use async_trait::async_trait;

use super::types::{MemberFlags, OrganizationMember, OrganizationMemberTeam, User};
use crate::{MembershipError, SecretString};

/// A validated membership ready to be persisted.
///
/// Built by [`MembershipResolver::create`](super::MembershipResolver::create).
/// Pending records already carry their invite token so the store writes both
/// in one unit of work.
#[derive(Debug, Clone)]
pub struct CreateMember {
    pub organization_id: i64,
    pub user_id: Option<i64>,
    pub email: Option<String>,
    pub role: String,
    pub token: Option<SecretString>,
    pub flags: MemberFlags,
    pub has_global_access: bool,
}

/// Key for finding a membership within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberLookup<'a> {
    User(i64),
    Email(&'a str),
}

/// Persistence for memberships and their team assignments.
///
/// Every method may fail with `MembershipError::StoreUnavailable`.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn get_member(
        &self,
        organization_id: i64,
        member_id: i64,
    ) -> Result<Option<OrganizationMember>, MembershipError>;

    async fn find_member(
        &self,
        organization_id: i64,
        lookup: MemberLookup<'_>,
    ) -> Result<Option<OrganizationMember>, MembershipError>;

    async fn list_members(
        &self,
        organization_id: i64,
    ) -> Result<Vec<OrganizationMember>, MembershipError>;

    /// All assignment rows of a member, active or not.
    async fn list_assignments(
        &self,
        member_id: i64,
    ) -> Result<Vec<OrganizationMemberTeam>, MembershipError>;

    async fn list_teams(&self, organization_id: i64) -> Result<BTreeSet<i64>, MembershipError>;

    /// Inserts a membership and its token atomically.
    ///
    /// Fails with `ConstraintViolation` on a duplicate `(organization, user)`
    /// or `(organization, email)`.
    async fn create_member(&self, data: CreateMember)
    -> Result<OrganizationMember, MembershipError>;

    /// Updates an existing membership.
    ///
    /// Fails with `NotFound` for unknown ids and `ConstraintViolation` on
    /// uniqueness breaches or when an accepted membership still carries an
    /// invite token. Pending-to-accepted transitions go through
    /// [`accept_member`](Self::accept_member).
    async fn save_member(&self, member: &OrganizationMember) -> Result<(), MembershipError>;

    /// Claims a pending membership for `user_id` in one unit of work.
    ///
    /// Sets `user_id` and clears the token only if the row is still pending.
    /// Fails with `NotFound` for unknown ids, `AlreadyAccepted` when the row
    /// was claimed first, and `ConstraintViolation` when the user already
    /// holds another membership in the organization.
    async fn accept_member(
        &self,
        organization_id: i64,
        member_id: i64,
        user_id: i64,
    ) -> Result<OrganizationMember, MembershipError>;

    /// Inserts or updates the `(member, team)` row.
    async fn save_assignment(
        &self,
        member_id: i64,
        team_id: i64,
        is_active: bool,
    ) -> Result<OrganizationMemberTeam, MembershipError>;

    /// Deletes a membership together with its team rows.
    async fn delete_member(&self, organization_id: i64, member_id: i64)
    -> Result<(), MembershipError>;
}

/// Read access to user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the users that exist among `ids`, in any order.
    async fn find_users(&self, ids: &[i64]) -> Result<Vec<User>, MembershipError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, MembershipError> {
        Ok(self.find_users(&[id]).await?.into_iter().next())
    }
}

/// Delivers membership emails.
///
/// Delivery is best-effort: callers log failures and carry on.
#[async_trait]
pub trait InviteSender: Send + Sync {
    async fn send_invite(&self, email: &str, invite_link: &str) -> Result<(), MembershipError>;

    /// Asks a member to re-link their single-sign-on identity.
    async fn send_sso_link(&self, email: &str, link: &str) -> Result<(), MembershipError>;
}
