use chrono::Utc;

use crate::MembershipError;
use crate::audit::{MemberAuditSnapshot, snapshot};
use crate::events::{MembershipEvent, dispatch};
use crate::members::MembershipStore;
use crate::roles::RoleRegistryHandle;

use super::ensure_can_manage;

/// Action to remove a membership and its team assignments.
pub struct RemoveMemberAction<S>
where
    S: MembershipStore,
{
    store: S,
    roles: RoleRegistryHandle,
}

impl<S: MembershipStore> RemoveMemberAction<S> {
    pub fn new(store: S, roles: RoleRegistryHandle) -> Self {
        Self { store, roles }
    }

    /// Deletes the membership and returns its last state for the audit log.
    ///
    /// `actor_role` must rank at least as high as the removed member's role.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization_id: i64,
        member_id: i64,
        actor_role: Option<&str>,
    ) -> Result<MemberAuditSnapshot, MembershipError> {
        let member = self
            .store
            .get_member(organization_id, member_id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        ensure_can_manage(&self.roles.load(), actor_role, &[member.role.as_str()])?;

        let assignments = self.store.list_assignments(member.id).await?;
        let audit = snapshot(&member, &assignments);

        self.store.delete_member(organization_id, member_id).await?;

        dispatch(MembershipEvent::MemberRemoved {
            organization_id,
            member_id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"member removed\", organization_id={organization_id}, member_id={member_id}, teams={}",
            audit.team_ids.len()
        );

        Ok(audit)
    }
}
