use chrono::Utc;

use crate::MembershipError;
use crate::events::{MembershipEvent, dispatch};
use crate::members::{MembershipResolver, MembershipStore, OrganizationMember};
use crate::roles::RoleRegistryHandle;

use super::ensure_can_manage;

#[derive(Debug, Clone)]
pub struct ChangeRoleInput {
    pub organization_id: i64,
    pub member_id: i64,
    /// Target role id.
    pub role: String,
    /// Role of the member making the change. `None` skips the hierarchy check.
    pub actor_role: Option<String>,
}

/// Action to move a member to another role.
///
/// The actor must rank at least as high as both the current and the target
/// role, so nobody can promote past themselves or demote a superior.
pub struct ChangeRoleAction<S>
where
    S: MembershipStore,
{
    store: S,
    roles: RoleRegistryHandle,
}

impl<S: MembershipStore> ChangeRoleAction<S> {
    pub fn new(store: S, roles: RoleRegistryHandle) -> Self {
        Self { store, roles }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "change_role", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: ChangeRoleInput,
    ) -> Result<OrganizationMember, MembershipError> {
        let registry = self.roles.load();
        let resolver = MembershipResolver::new(registry.clone());

        let member = self
            .store
            .get_member(input.organization_id, input.member_id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        let target = registry.get(&input.role)?;
        ensure_can_manage(
            &registry,
            input.actor_role.as_deref(),
            &[member.role.as_str(), target.id.as_str()],
        )?;

        if member.role == target.id {
            return Ok(member);
        }

        let previous = member.role.clone();
        let member = resolver.change_role(member, &input.role)?;
        self.store.save_member(&member).await?;

        dispatch(MembershipEvent::RoleChanged {
            organization_id: member.organization_id,
            member_id: member.id,
            from: previous.clone(),
            to: member.role.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"role changed\", organization_id={}, member_id={}, from=\"{}\", to=\"{}\"",
            member.organization_id,
            member.id,
            previous,
            member.role
        );

        Ok(member)
    }
}
