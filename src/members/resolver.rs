//! Access decisions over membership facts.
//!
//! Everything here is pure: callers load rows through a
//! [`MembershipStore`](super::MembershipStore) and pass them in.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::repository::CreateMember;
use super::types::{MemberFlags, OrganizationMember, OrganizationMemberTeam, User};
use crate::MembershipError;
use crate::crypto::{DEFAULT_INVITE_TOKEN_BYTES, generate_invite_token_with};
use crate::roles::{Role, RoleRegistry};
use crate::validators::validate_email;

/// Resolves roles, scopes and team visibility for memberships.
///
/// Holds one registry snapshot; build a new resolver per request to pick up
/// registry reloads.
#[derive(Debug, Clone)]
pub struct MembershipResolver {
    roles: Arc<RoleRegistry>,
    token_bytes: usize,
}

impl MembershipResolver {
    pub fn new(roles: Arc<RoleRegistry>) -> Self {
        Self {
            roles,
            token_bytes: DEFAULT_INVITE_TOKEN_BYTES,
        }
    }

    /// Uses `bytes` random bytes for newly minted invite tokens.
    #[must_use]
    pub fn with_token_bytes(mut self, bytes: usize) -> Self {
        self.token_bytes = bytes;
        self
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn is_pending(member: &OrganizationMember) -> bool {
        member.is_pending()
    }

    /// Label for lists and audit entries.
    ///
    /// The linked user's display name when available, else the invited email,
    /// else the membership id.
    pub fn display_label(member: &OrganizationMember, user: Option<&User>) -> String {
        if member.user_id.is_some() {
            if let Some(user) = user {
                return user.display_name().to_owned();
            }
        }
        member
            .email
            .clone()
            .unwrap_or_else(|| member.id.to_string())
    }

    /// The address to contact the member at.
    pub fn effective_email<'a>(
        member: &'a OrganizationMember,
        user: Option<&'a User>,
    ) -> Option<&'a str> {
        match (member.user_id, user) {
            (Some(_), Some(user)) => Some(user.email()),
            _ => member.email.as_deref(),
        }
    }

    /// The member's role definition.
    pub fn role(&self, member: &OrganizationMember) -> Result<&Role, MembershipError> {
        self.roles.get(&member.role)
    }

    pub fn scopes(
        &self,
        member: &OrganizationMember,
    ) -> Result<&BTreeSet<String>, MembershipError> {
        Ok(&self.role(member)?.scopes)
    }

    pub fn has_scope(
        &self,
        member: &OrganizationMember,
        scope: &str,
    ) -> Result<bool, MembershipError> {
        Ok(self.role(member)?.has_scope(scope))
    }

    /// Teams the member can see.
    ///
    /// Global roles see every team of the organization and assignment rows are
    /// not consulted. Other roles see exactly the teams of their active rows.
    /// Rows that belong to other members are ignored.
    pub fn accessible_teams<'a, T, A>(
        &self,
        member: &OrganizationMember,
        organization_teams: T,
        assignments: A,
    ) -> Result<BTreeSet<i64>, MembershipError>
    where
        T: IntoIterator<Item = &'a i64>,
        A: IntoIterator<Item = &'a OrganizationMemberTeam>,
    {
        if self.role(member)?.is_global {
            return Ok(organization_teams.into_iter().copied().collect());
        }

        Ok(assignments
            .into_iter()
            .filter(|a| a.organization_member_id == member.id && a.is_active)
            .map(|a| a.team_id)
            .collect())
    }

    /// Validates a new membership.
    ///
    /// At least one of `user_id` and `email` is required. A missing role means
    /// the registry default. Email-only memberships are pending and get a
    /// fresh invite token here, so the record is never stored without one.
    pub fn create(
        &self,
        organization_id: i64,
        user_id: Option<i64>,
        email: Option<&str>,
        role: Option<&str>,
    ) -> Result<CreateMember, MembershipError> {
        if user_id.is_none() && email.is_none() {
            return Err(MembershipError::InvalidMembership);
        }

        if let Some(email) = email {
            validate_email(email)?;
        }

        let role = self.roles.resolve(role)?;

        let token = user_id
            .is_none()
            .then(|| generate_invite_token_with(self.token_bytes));

        Ok(CreateMember {
            organization_id,
            user_id,
            email: email.map(str::to_owned),
            role: role.id.clone(),
            token,
            flags: MemberFlags::default(),
            has_global_access: true,
        })
    }

    /// Claims a pending membership for `user_id`.
    ///
    /// Clears the invite token; the invited email stays as a record.
    pub fn accept(
        mut member: OrganizationMember,
        user_id: i64,
    ) -> Result<OrganizationMember, MembershipError> {
        if !member.is_pending() {
            return Err(MembershipError::AlreadyAccepted);
        }
        member.user_id = Some(user_id);
        member.token = None;
        Ok(member)
    }

    /// Moves a membership to another role.
    pub fn change_role(
        &self,
        mut member: OrganizationMember,
        role_id: &str,
    ) -> Result<OrganizationMember, MembershipError> {
        let role = self.roles.get(role_id)?;
        role.id.clone_into(&mut member.role);
        Ok(member)
    }
}
