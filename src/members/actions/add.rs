use chrono::Utc;

use crate::MembershipError;
use crate::events::{MembershipEvent, dispatch};
use crate::members::{
    MemberLookup, MembershipResolver, MembershipStore, OrganizationMember, UserDirectory,
};
use crate::roles::RoleRegistryHandle;

use super::ensure_can_manage;

/// Input data for adding an existing user directly.
#[derive(Debug, Clone)]
pub struct AddMemberInput {
    pub organization_id: i64,
    pub user_id: i64,
    /// Role id; `None` means the registry default.
    pub role: Option<String>,
    /// Role of the member performing the add. `None` skips the hierarchy check.
    pub actor_role: Option<String>,
}

/// Action to add a known, active user to an organization without an invite.
pub struct AddMemberAction<S, U>
where
    S: MembershipStore,
    U: UserDirectory,
{
    store: S,
    users: U,
    roles: RoleRegistryHandle,
}

impl<S: MembershipStore, U: UserDirectory> AddMemberAction<S, U> {
    pub fn new(store: S, users: U, roles: RoleRegistryHandle) -> Self {
        Self {
            store,
            users,
            roles,
        }
    }

    /// Creates an accepted membership for `input.user_id`.
    ///
    /// Fails with `NotFound` when the user does not exist or is inactive and
    /// with `ConstraintViolation` when they already belong to the organization.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "add_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: AddMemberInput,
    ) -> Result<OrganizationMember, MembershipError> {
        let registry = self.roles.load();
        let resolver = MembershipResolver::new(registry.clone());

        let data = resolver.create(
            input.organization_id,
            Some(input.user_id),
            None,
            input.role.as_deref(),
        )?;

        ensure_can_manage(&registry, input.actor_role.as_deref(), &[data.role.as_str()])?;

        match self.users.find_user(input.user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(MembershipError::NotFound),
        }

        if self
            .store
            .find_member(input.organization_id, MemberLookup::User(input.user_id))
            .await?
            .is_some()
        {
            return Err(MembershipError::ConstraintViolation(format!(
                "user {} is already a member of organization {}",
                input.user_id, input.organization_id
            )));
        }

        let member = self.store.create_member(data).await?;

        dispatch(MembershipEvent::MemberAdded {
            organization_id: member.organization_id,
            member_id: member.id,
            user_id: input.user_id,
            role: member.role.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"member added\", organization_id={}, member_id={}, user_id={}, role=\"{}\"",
            member.organization_id,
            member.id,
            input.user_id,
            member.role
        );

        Ok(member)
    }
}
