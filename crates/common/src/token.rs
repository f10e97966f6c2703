//! Invitation token generation and hashing.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A freshly issued single-use invitation secret.
///
/// Only [`InvitationToken::hash`] is ever persisted; the plaintext leaves the
/// process once, inside the invitation notification.
#[derive(Clone, PartialEq, Eq)]
pub struct InvitationToken {
    plain: String,
}

impl InvitationToken {
    /// Generate a new random token.
    #[must_use]
    pub fn generate() -> Self {
        // UUID v4 has no time component
        Self {
            plain: Uuid::new_v4().to_string(),
        }
    }

    /// The plaintext token handed to the recipient.
    #[must_use]
    pub fn plain(&self) -> &str {
        &self.plain
    }

    /// Hex-encoded SHA-256 of the plaintext, as stored.
    #[must_use]
    pub fn hash(&self) -> String {
        hash_token(&self.plain)
    }

    /// Consume the token, returning the plaintext.
    #[must_use]
    pub fn into_plain(self) -> String {
        self.plain
    }
}

impl std::fmt::Debug for InvitationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationToken")
            .field("plain", &"<redacted>")
            .finish()
    }
}

/// Hash a presented plaintext token for lookup.
#[must_use]
pub fn hash_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = InvitationToken::generate();
        assert_eq!(token.plain().len(), 36);
        assert_ne!(token, InvitationToken::generate());
    }

    #[test]
    fn test_hash_is_stable_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_token_hash_matches_free_function() {
        let token = InvitationToken::generate();
        assert_eq!(token.hash(), hash_token(token.plain()));
        assert_ne!(token.hash(), token.plain());
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let token = InvitationToken::generate();
        let rendered = format!("{token:?}");
        assert!(!rendered.contains(token.plain()));
    }
}
