//! Password hashing, password strength, and opaque token generation.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::Argon2;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

use gridbase_core::{Error, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Number of random bytes behind every opaque token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Display prefix length for API keys.
const API_KEY_PREFIX_LEN: usize = 8;

/// Argon2-backed password hasher.
#[derive(Clone, Default)]
pub struct AuthHasher {
    argon2: Argon2<'static>,
}

impl AuthHasher {
    /// Creates a hasher with the default Argon2id parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let hash = self
            .argon2
            .hash_password(password.as_bytes())
            .map_err(|e| Error::auth(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verifies a password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for AuthHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHasher").finish_non_exhaustive()
    }
}

/// Password strength checking on top of the minimum-length rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordStrength;

impl PasswordStrength {
    /// Creates a new strength checker.
    pub fn new() -> Self {
        Self
    }

    /// Returns whether a password meets the minimum length.
    pub fn meets_minimum_length(&self, password: &str) -> bool {
        password.chars().count() >= MIN_PASSWORD_LENGTH
    }

    /// Scores a password from 0 (guessable) to 4 (very strong).
    ///
    /// Used for advisory feedback; only the length rule rejects.
    pub fn score(&self, password: &str, user_inputs: &[&str]) -> u8 {
        match zxcvbn::zxcvbn(password, user_inputs).score() {
            zxcvbn::Score::Zero => 0,
            zxcvbn::Score::One => 1,
            zxcvbn::Score::Two => 2,
            zxcvbn::Score::Three => 3,
            _ => 4,
        }
    }
}

/// An opaque token paired with the digest the database stores.
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    /// The raw token handed to the client, exactly once.
    pub raw: String,
    /// SHA-256 digest of the raw token.
    pub digest: Vec<u8>,
}

/// Generates an opaque random token (256 bits, URL-safe base64).
pub fn generate_token() -> GeneratedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let raw = URL_SAFE_NO_PAD.encode(bytes);
    let digest = Sha256::digest(raw.as_bytes()).to_vec();

    GeneratedToken { raw, digest }
}

/// An API key with its digest and display prefix.
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The raw key handed to the owner, exactly once.
    pub raw: String,
    /// SHA-256 digest of the raw key.
    pub digest: Vec<u8>,
    /// First characters of the raw key, stored for display.
    pub prefix: String,
}

/// Generates an API key with the `gb_` product prefix.
pub fn generate_api_key() -> GeneratedApiKey {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let raw = format!("gb_{}", URL_SAFE_NO_PAD.encode(bytes));
    let digest = Sha256::digest(raw.as_bytes()).to_vec();
    let prefix = raw.chars().take(API_KEY_PREFIX_LEN).collect();

    GeneratedApiKey { raw, digest, prefix }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hasher = AuthHasher::new();
        let hash = hasher.hash_password("correct horse battery").unwrap();

        assert!(hasher.verify_password("correct horse battery", &hash));
        assert!(!hasher.verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let hasher = AuthHasher::new();
        assert!(!hasher.verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn minimum_length_rule() {
        let strength = PasswordStrength::new();
        assert!(!strength.meets_minimum_length("short"));
        assert!(strength.meets_minimum_length("exactly8"));
    }

    #[test]
    fn generated_tokens_are_unique_and_digested() {
        let first = generate_token();
        let second = generate_token();

        assert_ne!(first.raw, second.raw);
        assert_eq!(first.digest.len(), 32);
        assert_eq!(
            first.digest,
            Sha256::digest(first.raw.as_bytes()).to_vec()
        );
        // 256 bits of entropy encode to 43 URL-safe characters.
        assert_eq!(first.raw.len(), 43);
    }

    #[test]
    fn api_keys_carry_product_prefix() {
        let key = generate_api_key();
        assert!(key.raw.starts_with("gb_"));
        assert_eq!(key.prefix.len(), 8);
        assert!(key.raw.starts_with(&key.prefix));
    }
}
