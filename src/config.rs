//! Configuration for the membership engine.
//!
//! Everything has code defaults; there is no file or environment loader.
//!
//! # Example
//!
//! ```rust
//! use orgauth::config::{InviteConfig, OrgConfig};
//!
//! let config = OrgConfig {
//!     invite: InviteConfig {
//!         base_url: "https://errors.example.com".to_owned(),
//!         ..Default::default()
//!     },
//!     ..OrgConfig::new("server-secret-key")
//! };
//! assert_eq!(config.invite.token_bytes, 32);
//! ```

use serde::{Deserialize, Serialize};

use crate::SecretString;
use crate::crypto::{DEFAULT_INVITE_TOKEN_BYTES, MIN_INVITE_TOKEN_BYTES};

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct OrgConfig {
    /// Server secret mixed into legacy invite tokens.
    pub secret_key: SecretString,

    /// Invitation settings.
    pub invite: InviteConfig,

    /// Defaults for per-user display options.
    pub user_options: UserOptionsDefaults,
}

impl OrgConfig {
    /// Creates a configuration with default invite and option settings.
    pub fn new(secret_key: impl Into<SecretString>) -> Self {
        Self {
            secret_key: secret_key.into(),
            invite: InviteConfig::default(),
            user_options: UserOptionsDefaults::default(),
        }
    }

    /// Local development settings with a fixed, non-secret key.
    pub fn development() -> Self {
        Self {
            secret_key: SecretString::new("development-secret-key"),
            invite: InviteConfig {
                base_url: "http://localhost:9000".to_owned(),
                token_bytes: DEFAULT_INVITE_TOKEN_BYTES,
            },
            user_options: UserOptionsDefaults::default(),
        }
    }
}

/// Invitation settings.
#[derive(Debug, Clone)]
pub struct InviteConfig {
    /// Absolute URL the accept path is appended to.
    ///
    /// Default: `http://localhost:9000`
    pub base_url: String,

    /// Random bytes per invite token.
    ///
    /// Default: 32. Values below 16 are raised to 16.
    pub token_bytes: usize,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_owned(),
            token_bytes: DEFAULT_INVITE_TOKEN_BYTES,
        }
    }
}

impl InviteConfig {
    /// Token size actually used, never below the 128-bit floor.
    #[inline]
    pub fn effective_token_bytes(&self) -> usize {
        self.token_bytes.max(MIN_INVITE_TOKEN_BYTES)
    }
}

/// Stack trace ordering preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StacktraceOrder {
    #[default]
    Default,
    NewestLast,
    NewestFirst,
}

impl StacktraceOrder {
    /// Maps the stored integer preference. Unknown values fall back to `Default`.
    pub fn from_stored(value: i32) -> Self {
        match value {
            1 => Self::NewestLast,
            2 => Self::NewestFirst,
            _ => Self::Default,
        }
    }
}

/// Values used when a user has not stored a preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOptionsDefaults {
    /// Default: `en`
    pub language: String,
    /// Default: `UTC`
    pub timezone: String,
    /// Default: [`StacktraceOrder::Default`]
    pub stacktrace_order: StacktraceOrder,
    /// Default: `false`
    pub clock_24_hours: bool,
}

impl Default for UserOptionsDefaults {
    fn default() -> Self {
        Self {
            language: "en".to_owned(),
            timezone: "UTC".to_owned(),
            stacktrace_order: StacktraceOrder::Default,
            clock_24_hours: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_invite_config() {
        let config = InviteConfig::default();
        assert_eq!(config.token_bytes, 32);
        assert_eq!(config.effective_token_bytes(), 32);
    }

    #[test]
    fn test_token_bytes_floor() {
        let config = InviteConfig {
            token_bytes: 4,
            ..Default::default()
        };
        assert_eq!(config.effective_token_bytes(), 16);
    }

    #[test]
    fn test_user_option_defaults() {
        let defaults = UserOptionsDefaults::default();
        assert_eq!(defaults.language, "en");
        assert_eq!(defaults.timezone, "UTC");
        assert_eq!(defaults.stacktrace_order, StacktraceOrder::Default);
        assert!(!defaults.clock_24_hours);
    }

    #[test]
    fn test_stacktrace_order_from_stored() {
        assert_eq!(StacktraceOrder::from_stored(-1), StacktraceOrder::Default);
        assert_eq!(StacktraceOrder::from_stored(0), StacktraceOrder::Default);
        assert_eq!(StacktraceOrder::from_stored(1), StacktraceOrder::NewestLast);
        assert_eq!(StacktraceOrder::from_stored(2), StacktraceOrder::NewestFirst);
        assert_eq!(StacktraceOrder::from_stored(7), StacktraceOrder::Default);
    }

    #[test]
    fn test_development_config() {
        let config = OrgConfig::development();
        assert!(!config.secret_key.is_empty());
        assert_eq!(config.invite.base_url, "http://localhost:9000");
    }
}
