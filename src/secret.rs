//! Sensitive string wrapper.
//!
//! Invite tokens and the legacy signing key travel through the crate as
//! [`SecretString`] so they never end up in logs or debug output.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;

/// A wrapper for sensitive string data that prevents accidental logging.
///
/// `Debug` and `Display` render `[REDACTED]`. Equality is constant-time.
///
/// # Example
///
/// ```rust
/// use orgauth::SecretString;
///
/// let token = SecretString::new("3f9a0c");
///
/// assert_eq!(format!("{:?}", token), "SecretString([REDACTED])");
/// assert_eq!(token.expose_secret(), "3f9a0c");
/// assert!(token.matches("3f9a0c"));
/// ```
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new `SecretString` from any type that can be converted to a `String`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the secret value.
    ///
    /// Only call this where the raw value has to leave the process, such as
    /// when building an invite link.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Compares against a presented value in constant time.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the length of the secret in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for SecretString {}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_debug_redacted() {
        let secret = SecretString::new("invite-token");
        assert_eq!(format!("{secret:?}"), "SecretString([REDACTED])");
    }

    #[test]
    fn test_secret_string_display_redacted() {
        let secret = SecretString::new("invite-token");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn test_matches_exact_value_only() {
        let secret = SecretString::new("abcdef");
        assert!(secret.matches("abcdef"));
        assert!(!secret.matches("abcdeF"));
        assert!(!secret.matches("abcde"));
        assert!(!secret.matches("abcdefg"));
        assert!(!secret.matches(""));
    }

    #[test]
    fn test_equality_uses_value() {
        assert_eq!(SecretString::from("k"), SecretString::new("k"));
        assert_ne!(SecretString::from("k"), SecretString::new("j"));
    }

    #[test]
    fn test_secret_string_deserialize() {
        let secret: SecretString = serde_json::from_str("\"signing-key\"").unwrap();
        assert_eq!(secret.expose_secret(), "signing-key");
        assert_eq!(secret.len(), 11);
        assert!(!secret.is_empty());
    }
}
