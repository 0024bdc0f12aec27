use chrono::Utc;

use crate::MembershipError;
use crate::config::OrgConfig;
use crate::events::{MembershipEvent, dispatch};
use crate::members::{
    InviteSender, MembershipResolver, MembershipStore, Organization, OrganizationMember,
    UserDirectory,
};

/// URL where a member re-links their identity for `organization_slug`.
///
/// The format is `{base_url}/auth/{organization_slug}/`.
pub fn sso_link(base_url: &str, organization_slug: &str) -> String {
    format!(
        "{}/auth/{}/",
        base_url.trim_end_matches('/'),
        organization_slug
    )
}

/// Action to flag a member's SSO identity as invalid and ask them to re-link.
///
/// This action:
/// 1. Marks the membership `sso_invalid` and stores it
/// 2. Sends the re-link URL to the member's effective email
///
/// Delivery is best-effort, as with invites. A failed send is logged and the
/// flag stays set.
pub struct RequestSsoLinkAction<S, U, N>
where
    S: MembershipStore,
    U: UserDirectory,
    N: InviteSender,
{
    store: S,
    users: U,
    sender: N,
    config: OrgConfig,
}

impl<S, U, N> RequestSsoLinkAction<S, U, N>
where
    S: MembershipStore,
    U: UserDirectory,
    N: InviteSender,
{
    pub fn new(store: S, users: U, sender: N, config: OrgConfig) -> Self {
        Self {
            store,
            users,
            sender,
            config,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "request_sso_link", skip_all, err)
    )]
    pub async fn execute(
        &self,
        organization: &Organization,
        member_id: i64,
    ) -> Result<OrganizationMember, MembershipError> {
        let mut member = self
            .store
            .get_member(organization.id, member_id)
            .await?
            .ok_or(MembershipError::NotFound)?;

        member.invalidate_sso();
        self.store.save_member(&member).await?;

        let user = match member.user_id {
            Some(user_id) => self.users.find_user(user_id).await?,
            None => None,
        };
        let link = sso_link(&self.config.invite.base_url, &organization.slug);

        match MembershipResolver::effective_email(&member, user.as_ref()) {
            Some(email) => {
                if let Err(err) = self.sender.send_sso_link(email, &link).await {
                    log::error!(
                        target: "orgauth",
                        "msg=\"sso link delivery failed\", organization_id={}, member_id={}, error=\"{}\"",
                        organization.id,
                        member.id,
                        err
                    );
                }
            }
            None => log::warn!(
                target: "orgauth",
                "msg=\"sso link not sent, no email\", organization_id={}, member_id={}",
                organization.id,
                member.id
            ),
        }

        dispatch(MembershipEvent::SsoInvalidated {
            organization_id: organization.id,
            member_id: member.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "orgauth",
            "msg=\"sso link requested\", organization_id={}, member_id={}",
            organization.id,
            member.id
        );

        Ok(member)
    }
}
