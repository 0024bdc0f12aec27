//! In-memory membership storage.
//!
//! Suitable for tests and single-process deployments. All state sits behind
//! one lock, so multi-row writes (create with token, cascade delete) are
//! atomic.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{CreateMember, MemberLookup, MembershipStore};
use super::types::{OrganizationMember, OrganizationMemberTeam};
use crate::MembershipError;

#[derive(Default)]
struct State {
    members: BTreeMap<i64, OrganizationMember>,
    assignments: BTreeMap<i64, OrganizationMemberTeam>,
    teams: HashMap<i64, BTreeSet<i64>>,
    counters: HashMap<i64, i64>,
    next_member_id: i64,
    next_assignment_id: i64,
}

impl State {
    /// Describes the uniqueness rule `candidate` would break, if any.
    fn conflict(
        &self,
        candidate_id: Option<i64>,
        organization_id: i64,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> Option<String> {
        self.members
            .values()
            .filter(|m| m.organization_id == organization_id && Some(m.id) != candidate_id)
            .find_map(|m| {
                if user_id.is_some() && m.user_id == user_id {
                    Some(format!(
                        "user {} is already a member of organization {organization_id}",
                        user_id.unwrap_or_default()
                    ))
                } else if email.is_some() && m.email.as_deref() == email {
                    Some(format!(
                        "email {} is already a member of organization {organization_id}",
                        email.unwrap_or_default()
                    ))
                } else {
                    None
                }
            })
    }
}

/// In-memory [`MembershipStore`].
///
/// Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryMembershipStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a team under an organization.
    pub fn add_team(&self, organization_id: i64, team_id: i64) -> Result<(), MembershipError> {
        self.write()?
            .teams
            .entry(organization_id)
            .or_default()
            .insert(team_id);
        Ok(())
    }

    /// Returns the number of memberships across all organizations.
    pub fn len(&self) -> usize {
        self.state.read().map(|guard| guard.members.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of team assignment rows, active or not.
    pub fn assignment_count(&self) -> usize {
        self.state
            .read()
            .map(|guard| guard.assignments.len())
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, MembershipError> {
        self.state
            .read()
            .map_err(|_| MembershipError::StoreUnavailable("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, MembershipError> {
        self.state
            .write()
            .map_err(|_| MembershipError::StoreUnavailable("lock poisoned".into()))
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn get_member(
        &self,
        organization_id: i64,
        member_id: i64,
    ) -> Result<Option<OrganizationMember>, MembershipError> {
        let state = self.read()?;
        Ok(state
            .members
            .get(&member_id)
            .filter(|m| m.organization_id == organization_id)
            .cloned())
    }

    async fn find_member(
        &self,
        organization_id: i64,
        lookup: MemberLookup<'_>,
    ) -> Result<Option<OrganizationMember>, MembershipError> {
        let state = self.read()?;
        Ok(state
            .members
            .values()
            .filter(|m| m.organization_id == organization_id)
            .find(|m| match lookup {
                MemberLookup::User(user_id) => m.user_id == Some(user_id),
                MemberLookup::Email(email) => m.email.as_deref() == Some(email),
            })
            .cloned())
    }

    async fn list_members(
        &self,
        organization_id: i64,
    ) -> Result<Vec<OrganizationMember>, MembershipError> {
        let state = self.read()?;
        Ok(state
            .members
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn list_assignments(
        &self,
        member_id: i64,
    ) -> Result<Vec<OrganizationMemberTeam>, MembershipError> {
        let state = self.read()?;
        Ok(state
            .assignments
            .values()
            .filter(|a| a.organization_member_id == member_id)
            .cloned()
            .collect())
    }

    async fn list_teams(&self, organization_id: i64) -> Result<BTreeSet<i64>, MembershipError> {
        let state = self.read()?;
        Ok(state.teams.get(&organization_id).cloned().unwrap_or_default())
    }

    async fn create_member(
        &self,
        data: CreateMember,
    ) -> Result<OrganizationMember, MembershipError> {
        if data.user_id.is_none() && data.email.is_none() {
            return Err(MembershipError::InvalidMembership);
        }

        let mut state = self.write()?;

        if let Some(conflict) =
            state.conflict(None, data.organization_id, data.user_id, data.email.as_deref())
        {
            return Err(MembershipError::ConstraintViolation(conflict));
        }

        state.next_member_id += 1;
        let id = state.next_member_id;

        let counter = state.counters.entry(data.organization_id).or_insert(0);
        *counter += 1;
        let counter = *counter;

        let member = OrganizationMember {
            id,
            organization_id: data.organization_id,
            user_id: data.user_id,
            email: data.email,
            role: data.role,
            flags: data.flags,
            token: data.token,
            date_added: Utc::now(),
            has_global_access: data.has_global_access,
            counter: Some(counter),
        };
        state.members.insert(id, member.clone());

        Ok(member)
    }

    async fn save_member(&self, member: &OrganizationMember) -> Result<(), MembershipError> {
        if member.user_id.is_none() && member.email.is_none() {
            return Err(MembershipError::InvalidMembership);
        }

        if !member.is_pending() && member.token.is_some() {
            return Err(MembershipError::ConstraintViolation(format!(
                "accepted membership {} still carries an invite token",
                member.id
            )));
        }

        let mut state = self.write()?;

        if !state
            .members
            .get(&member.id)
            .is_some_and(|m| m.organization_id == member.organization_id)
        {
            return Err(MembershipError::NotFound);
        }

        if let Some(conflict) = state.conflict(
            Some(member.id),
            member.organization_id,
            member.user_id,
            member.email.as_deref(),
        ) {
            return Err(MembershipError::ConstraintViolation(conflict));
        }

        state.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn accept_member(
        &self,
        organization_id: i64,
        member_id: i64,
        user_id: i64,
    ) -> Result<OrganizationMember, MembershipError> {
        let mut state = self.write()?;

        match state.members.get(&member_id) {
            Some(m) if m.organization_id == organization_id => {
                if !m.is_pending() {
                    return Err(MembershipError::AlreadyAccepted);
                }
            }
            _ => return Err(MembershipError::NotFound),
        }

        if let Some(conflict) =
            state.conflict(Some(member_id), organization_id, Some(user_id), None)
        {
            return Err(MembershipError::ConstraintViolation(conflict));
        }

        let member = state
            .members
            .get_mut(&member_id)
            .ok_or(MembershipError::NotFound)?;
        member.user_id = Some(user_id);
        member.token = None;

        Ok(member.clone())
    }

    async fn save_assignment(
        &self,
        member_id: i64,
        team_id: i64,
        is_active: bool,
    ) -> Result<OrganizationMemberTeam, MembershipError> {
        let mut state = self.write()?;

        if !state.members.contains_key(&member_id) {
            return Err(MembershipError::NotFound);
        }

        if let Some(row) = state
            .assignments
            .values_mut()
            .find(|a| a.organization_member_id == member_id && a.team_id == team_id)
        {
            row.is_active = is_active;
            return Ok(row.clone());
        }

        state.next_assignment_id += 1;
        let row = OrganizationMemberTeam {
            id: state.next_assignment_id,
            organization_member_id: member_id,
            team_id,
            is_active,
        };
        state.assignments.insert(row.id, row.clone());

        Ok(row)
    }

    async fn delete_member(
        &self,
        organization_id: i64,
        member_id: i64,
    ) -> Result<(), MembershipError> {
        let mut state = self.write()?;

        if !state
            .members
            .get(&member_id)
            .is_some_and(|m| m.organization_id == organization_id)
        {
            return Err(MembershipError::NotFound);
        }

        state.members.remove(&member_id);
        state
            .assignments
            .retain(|_, a| a.organization_member_id != member_id);

        Ok(())
    }
}
