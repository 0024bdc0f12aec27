//! Input validation for membership records.

pub mod email;

pub use email::validate_email;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationError {
    #[error("email cannot be empty")]
    EmailEmpty,
    #[error("email is too long (max 75 characters)")]
    EmailTooLong,
    #[error("invalid email format")]
    EmailInvalidFormat,
}
