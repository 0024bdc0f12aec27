mod accept;
mod access;
mod add;
mod invite;
mod remove;
mod role;
mod sso;
mod teams;

pub use accept::AcceptInviteAction;
pub use access::{MemberAccess, ResolveMemberAccessAction};
pub use add::{AddMemberAction, AddMemberInput};
pub use invite::{InviteMemberAction, InviteMemberInput, InviteMemberOutput};
pub use remove::RemoveMemberAction;
pub use role::{ChangeRoleAction, ChangeRoleInput};
pub use sso::{RequestSsoLinkAction, sso_link};
pub use teams::{SetTeamAssignmentAction, SetTeamAssignmentInput};

use crate::MembershipError;
use crate::roles::RoleRegistry;

/// Fails with `Forbidden` unless `actor_role` may manage every role in
/// `targets`. No actor means a trusted caller.
fn ensure_can_manage(
    registry: &RoleRegistry,
    actor_role: Option<&str>,
    targets: &[&str],
) -> Result<(), MembershipError> {
    let Some(actor) = actor_role else {
        return Ok(());
    };

    for target in targets {
        if !registry.can_manage(actor, target)? {
            log::warn!(
                target: "orgauth",
                "msg=\"role management denied\", actor_role=\"{actor}\", target_role=\"{target}\""
            );
            return Err(MembershipError::Forbidden);
        }
    }

    Ok(())
}
