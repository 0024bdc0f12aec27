use chrono::Utc;

use crate::config::OrgConfig;
use crate::crypto::check_token;
use crate::events::{MembershipEvent, dispatch};
use crate::members::{MemberLookup, MembershipStore, OrganizationMember};
use crate::{MembershipError, SecretString};

/// Action to accept an organization invite.
///
/// This action:
/// 1. Loads the pending membership named in the invite link
/// 2. Checks the presented token, stored or legacy
/// 3. Verifies the user is not already in the organization
/// 4. Links the user and clears the token
///
/// The final claim is a single store call that re-checks the pending state,
/// so of two concurrent accepts exactly one wins.
pub struct AcceptInviteAction<S>
where
    S: MembershipStore,
{
    store: S,
    config: OrgConfig,
}

impl<S: MembershipStore> AcceptInviteAction<S> {
    pub fn new(store: S, config: OrgConfig) -> Self {
        Self { store, config }
    }

    /// Claims membership `member_id` for `user_id`.
    ///
    /// # Returns
    ///
    /// - `Ok(member)` - The accepted membership
    /// - `Err(MembershipError::NotFound)` - No such membership in the organization
    /// - `Err(MembershipError::AlreadyAccepted)` - Invite already used
    /// - `Err(MembershipError::InvalidToken)` - Token does not match
    /// - `Err(MembershipError::ConstraintViolation(_))` - User already a member
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "accept_invite", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization_id: i64,
        member_id: i64,
        token: &SecretString,
        user_id: i64,
    ) -> Result<OrganizationMember, MembershipError> {
        let member = self
            .store
            .get_member(organization_id, member_id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        if !member.is_pending() {
            return Err(MembershipError::AlreadyAccepted);
        }

        if let Err(err) = check_token(&member, token, &self.config.secret_key) {
            log::warn!(
                target: "orgauth",
                "msg=\"invite token rejected\", organization_id={organization_id}, member_id={member_id}"
            );
            return Err(err);
        }

        if self
            .store
            .find_member(organization_id, MemberLookup::User(user_id))
            .await?
            .is_some()
        {
            return Err(MembershipError::ConstraintViolation(format!(
                "user {user_id} is already a member of organization {organization_id}"
            )));
        }

        let member = self
            .store
            .accept_member(organization_id, member_id, user_id)
            .await?;

        dispatch(MembershipEvent::InviteAccepted {
            organization_id,
            member_id,
            user_id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"invite accepted\", organization_id={organization_id}, member_id={member_id}, user_id={user_id}"
        );

        Ok(member)
    }
}
