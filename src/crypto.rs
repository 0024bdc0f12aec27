//! Invite token engine.
//!
//! New pending memberships get a random token from the OS CSPRNG. Links minted
//! before tokens were stored carry a deterministic "legacy" token derived from
//! the organization id, the invited email and the server secret; those are
//! only ever recomputed for validation and never stored.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::members::OrganizationMember;
use crate::{MembershipError, SecretString};

/// Default invite token size in random bytes (256 bits).
pub const DEFAULT_INVITE_TOKEN_BYTES: usize = 32;

/// Smallest token size ever issued (128 bits).
pub const MIN_INVITE_TOKEN_BYTES: usize = 16;

/// Generates an invite token with the default size.
///
/// The token is 64 lowercase hex characters.
///
/// # Example
///
/// ```rust
/// use orgauth::crypto::generate_invite_token;
///
/// let token = generate_invite_token();
/// assert_eq!(token.len(), 64);
/// ```
pub fn generate_invite_token() -> SecretString {
    generate_invite_token_with(DEFAULT_INVITE_TOKEN_BYTES)
}

/// Generates an invite token from `bytes` random bytes, hex encoded.
///
/// Sizes below [`MIN_INVITE_TOKEN_BYTES`] are raised to the minimum.
pub fn generate_invite_token_with(bytes: usize) -> SecretString {
    let mut buf = vec![0u8; bytes.max(MIN_INVITE_TOKEN_BYTES)];
    OsRng.fill_bytes(&mut buf);
    SecretString::new(hex::encode(buf))
}

/// Deterministic token for invite links that predate stored tokens.
///
/// SHA-256 over the decimal organization id, the email and the secret key,
/// hex encoded.
pub fn legacy_token(organization_id: i64, email: &str, secret_key: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(organization_id.to_string().as_bytes());
    hasher.update(email.as_bytes());
    hasher.update(secret_key.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented invite token against a membership.
///
/// Uses the stored token when one is set, otherwise the legacy token derived
/// from the stored email. Both comparisons run in constant time.
pub fn validate_token(
    member: &OrganizationMember,
    presented: &str,
    secret_key: &SecretString,
) -> bool {
    if let Some(token) = &member.token {
        return token.matches(presented);
    }

    match &member.email {
        Some(email) => {
            let expected = legacy_token(member.organization_id, email, secret_key);
            expected.as_bytes().ct_eq(presented.as_bytes()).into()
        }
        None => false,
    }
}

/// [`validate_token`] as a `Result`.
///
/// The error is the same whichever path failed.
pub fn check_token(
    member: &OrganizationMember,
    presented: &SecretString,
    secret_key: &SecretString,
) -> Result<(), MembershipError> {
    if validate_token(member, presented.expose_secret(), secret_key) {
        Ok(())
    } else {
        Err(MembershipError::InvalidToken)
    }
}

/// Builds the accept-invite URL for a pending membership.
///
/// Returns `None` once the membership has been accepted. The format is
/// `{base_url}/accept/{member_id}/{token}/`.
pub fn invite_link(
    member: &OrganizationMember,
    base_url: &str,
    secret_key: &SecretString,
) -> Option<String> {
    if !member.is_pending() {
        return None;
    }

    let token = match &member.token {
        Some(token) => token.expose_secret().to_owned(),
        None => legacy_token(member.organization_id, member.email.as_deref()?, secret_key),
    };

    Some(format!(
        "{}/accept/{}/{}/",
        base_url.trim_end_matches('/'),
        member.id,
        token
    ))
}
