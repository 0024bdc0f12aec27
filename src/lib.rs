//! Organization membership authorization and invitation engine.
//!
//! Decides, from persisted membership facts, which teams a member can see,
//! which permission scopes they hold, whether a membership is still waiting on
//! an invite, and how invite tokens are minted and checked.
//!
//! Storage, email delivery and profile decoration are reached through traits
//! (see [`members::MembershipStore`], [`members::InviteSender`],
//! [`listing::ProfileSource`]). An in-memory store ships for tests and
//! single-process use.

pub mod audit;
pub mod config;
pub mod crypto;
pub mod events;
pub mod listing;
pub mod members;
pub mod roles;
pub mod validators;

mod secret;

pub use audit::{MemberAuditSnapshot, TeamAssignmentSnapshot};
pub use config::{InviteConfig, OrgConfig, UserOptionsDefaults};
pub use events::{dispatch, register_event_listeners};
pub use listing::{ListProjectMembersAction, MemberUser, ProfileSource, Viewer};
pub use members::{
    AcceptInviteAction, AddMemberAction, AddMemberInput, ChangeRoleAction, ChangeRoleInput,
    CreateMember, InMemoryMembershipStore, InviteMemberAction, InviteMemberInput,
    InviteMemberOutput, InviteSender, MemberAccess, MemberFlags, MemberLookup, MembershipResolver,
    MembershipStore, Organization, OrganizationMember, OrganizationMemberTeam, Project,
    RemoveMemberAction, RequestSsoLinkAction, ResolveMemberAccessAction, SetTeamAssignmentAction,
    SetTeamAssignmentInput, User, UserDirectory,
};
pub use roles::{Role, RoleRegistry, RoleRegistryHandle, can_manage};
pub use secret::SecretString;
pub use validators::ValidationError;

#[cfg(any(test, feature = "mocks"))]
pub use members::{MockInviteSender, MockUserDirectory};

/// Failures surfaced by the membership core.
///
/// The core never recovers from these locally; the boundary layer maps them
/// to transport responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    /// Neither a user nor an email was supplied.
    #[error("membership requires a user or an email")]
    InvalidMembership,
    /// The membership has already been claimed by a user.
    #[error("invitation has already been accepted")]
    AlreadyAccepted,
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// A uniqueness constraint was violated by the store.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// Deliberately silent about whether the stored or legacy token was tried.
    #[error("invalid invitation token")]
    InvalidToken,
    /// Transient storage failure. Safe to retry.
    #[error("membership store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MembershipError {
    /// Returns true for transient failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Returns true when the failure was caused by the request itself.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMembership
                | Self::AlreadyAccepted
                | Self::ConstraintViolation(_)
                | Self::InvalidToken
                | Self::NotFound
                | Self::Forbidden
                | Self::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(MembershipError::StoreUnavailable("down".to_owned()).is_retryable());
        assert!(!MembershipError::InvalidToken.is_retryable());

        assert!(MembershipError::InvalidToken.is_caller_error());
        assert!(MembershipError::ConstraintViolation("dup".to_owned()).is_caller_error());
        assert!(!MembershipError::UnknownRole("ghost".to_owned()).is_caller_error());
        assert!(!MembershipError::StoreUnavailable("down".to_owned()).is_caller_error());
    }

    #[test]
    fn test_invalid_token_message_is_generic() {
        assert_eq!(
            MembershipError::InvalidToken.to_string(),
            "invalid invitation token"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: MembershipError = ValidationError::EmailEmpty.into();
        assert_eq!(err, MembershipError::Validation(ValidationError::EmailEmpty));
    }
}
