//! Organization memberships: types, storage seam, access resolution and the
//! use-case actions built on them.

mod actions;
mod memory_store;
mod repository;
mod resolver;
mod types;

pub use actions::{
    AcceptInviteAction, AddMemberAction, AddMemberInput, ChangeRoleAction, ChangeRoleInput,
    InviteMemberAction, InviteMemberInput, InviteMemberOutput, MemberAccess, RemoveMemberAction,
    RequestSsoLinkAction, ResolveMemberAccessAction, SetTeamAssignmentAction,
    SetTeamAssignmentInput, sso_link,
};
pub use memory_store::InMemoryMembershipStore;
pub use repository::{CreateMember, InviteSender, MemberLookup, MembershipStore, UserDirectory};
pub use resolver::MembershipResolver;
pub use types::{
    MemberFlags, Organization, OrganizationMember, OrganizationMemberTeam, Project, User,
};

#[cfg(any(test, feature = "mocks"))]
mod mocks;

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockInviteSender, MockUserDirectory};
