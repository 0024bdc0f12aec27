use chrono::Utc;

use crate::config::OrgConfig;
use crate::crypto::invite_link;
use crate::events::{MembershipEvent, dispatch};
use crate::members::{
    InviteSender, MemberLookup, MembershipResolver, MembershipStore, OrganizationMember,
};
use crate::roles::RoleRegistryHandle;
use crate::{MembershipError, SecretString};

use super::ensure_can_manage;

/// Input data for inviting an email address to an organization.
#[derive(Debug, Clone)]
pub struct InviteMemberInput {
    pub organization_id: i64,
    pub email: String,
    /// Role id; `None` means the registry default.
    pub role: Option<String>,
    /// Role of the member sending the invite. `None` skips the hierarchy check.
    pub inviter_role: Option<String>,
}

/// Output from creating an invitation.
#[derive(Debug)]
pub struct InviteMemberOutput {
    /// The pending membership.
    pub member: OrganizationMember,
    /// Accept URL for the invitee. Contains the token.
    pub invite_link: SecretString,
}

/// Action to invite an email address into an organization.
///
/// This action:
/// 1. Validates the email and resolves the role
/// 2. Checks the inviter may grant that role
/// 3. Rejects addresses that already hold a membership
/// 4. Stores the pending membership together with a fresh token
/// 5. Sends the invite link
///
/// Delivery is best-effort. A failed send is logged and the membership stays;
/// the caller can resend with the returned link.
pub struct InviteMemberAction<S, N>
where
    S: MembershipStore,
    N: InviteSender,
{
    store: S,
    sender: N,
    roles: RoleRegistryHandle,
    config: OrgConfig,
}

impl<S: MembershipStore, N: InviteSender> InviteMemberAction<S, N> {
    pub fn new(store: S, sender: N, roles: RoleRegistryHandle, config: OrgConfig) -> Self {
        Self {
            store,
            sender,
            roles,
            config,
        }
    }

    /// Creates a pending membership and sends its invite link.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - Membership stored, link built
    /// - `Err(MembershipError::Validation(_))` - Malformed email
    /// - `Err(MembershipError::UnknownRole(_))` - Role id not in the registry
    /// - `Err(MembershipError::Forbidden)` - Inviter ranks below the role
    /// - `Err(MembershipError::ConstraintViolation(_))` - Email already a member
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "invite_member", skip_all, err)
    )]
    pub async fn execute(
        &self,
        input: InviteMemberInput,
    ) -> Result<InviteMemberOutput, MembershipError> {
        let registry = self.roles.load();
        let resolver = MembershipResolver::new(registry.clone())
            .with_token_bytes(self.config.invite.effective_token_bytes());

        let data = resolver.create(
            input.organization_id,
            None,
            Some(&input.email),
            input.role.as_deref(),
        )?;

        ensure_can_manage(&registry, input.inviter_role.as_deref(), &[data.role.as_str()])?;

        if self
            .store
            .find_member(input.organization_id, MemberLookup::Email(&input.email))
            .await?
            .is_some()
        {
            return Err(MembershipError::ConstraintViolation(format!(
                "email {} is already a member of organization {}",
                input.email, input.organization_id
            )));
        }

        let member = self.store.create_member(data).await?;

        let link = invite_link(
            &member,
            &self.config.invite.base_url,
            &self.config.secret_key,
        )
        .ok_or_else(|| {
            MembershipError::StoreUnavailable("store returned an accepted membership".to_owned())
        })?;

        if let Err(err) = self.sender.send_invite(&input.email, &link).await {
            log::error!(
                target: "orgauth",
                "msg=\"invite delivery failed\", organization_id={}, member_id={}, error=\"{}\"",
                member.organization_id,
                member.id,
                err
            );
        }

        dispatch(MembershipEvent::MemberInvited {
            organization_id: member.organization_id,
            member_id: member.id,
            email: input.email.clone(),
            role: member.role.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"member invited\", organization_id={}, member_id={}, role=\"{}\"",
            member.organization_id,
            member.id,
            member.role
        );

        Ok(InviteMemberOutput {
            member,
            invite_link: SecretString::new(link),
        })
    }
}
