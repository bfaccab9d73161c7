//! PKCE (Proof Key for Code Exchange) for OAuth 2.0
//!
//! RFC 7636 helpers for public clients that cannot hold a client secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

fn random_urlsafe(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// 32 random bytes, base64url without padding (43 characters).
#[must_use]
pub fn generate_code_verifier() -> String {
    random_urlsafe(32)
}

/// `BASE64URL(SHA256(verifier))`
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random CSRF token for the `state` parameter.
#[must_use]
pub fn generate_state() -> String {
    random_urlsafe(32)
}

/// Compare states in constant time.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    let (expected, actual) = (expected.as_bytes(), actual.as_bytes());
    if expected.len() != actual.len() {
        return false;
    }
    expected.iter().zip(actual).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Verifier, challenge and state for one authorization request.
#[derive(Clone)]
pub struct PKCEChallenge {
    /// Kept secret until the code exchange
    pub code_verifier: String,
    /// Sent with the authorization request
    pub code_challenge: String,
    /// Must round-trip unchanged through the redirect
    pub state: String,
}

impl PKCEChallenge {
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge, state: generate_state() }
    }

    /// Always `S256`.
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

impl std::fmt::Debug for PKCEChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PKCEChallenge")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Validates `PKCEChallenge::generate` output format.
    ///
    /// Assertions:
    /// - Verifier length is within RFC 7636 bounds (43-128).
    /// - All values are base64url without padding.
    /// - The challenge is the S256 hash of the verifier.
    #[test]
    fn test_generate_pkce_challenge() {
        let challenge = PKCEChallenge::generate();

        assert!((43..=128).contains(&challenge.code_verifier.len()));
        for value in [&challenge.code_verifier, &challenge.code_challenge, &challenge.state] {
            assert!(value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
        assert_eq!(challenge.code_challenge, generate_code_challenge(&challenge.code_verifier));
        assert_eq!(challenge.challenge_method(), "S256");
    }

    /// Validates the RFC 7636 appendix B test vector.
    ///
    /// Assertions:
    /// - Confirms the published challenge for the published verifier.
    #[test]
    fn test_rfc7636_vector() {
        assert_eq!(
            generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    /// Validates uniqueness and state comparison.
    ///
    /// Assertions:
    /// - Two generations differ.
    /// - Only identical states validate.
    #[test]
    fn test_unique_challenges_and_state_validation() {
        let first = PKCEChallenge::generate();
        let second = PKCEChallenge::generate();

        assert_ne!(first.code_verifier, second.code_verifier);
        assert_ne!(first.state, second.state);
        assert!(validate_state(&first.state, &first.state));
        assert!(!validate_state(&first.state, &second.state));
        assert!(!validate_state(&first.state, "short"));
    }

    /// Validates the verifier never appears in debug output.
    ///
    /// Assertions:
    /// - Confirms the redacted placeholder replaces the verifier.
    #[test]
    fn test_debug_redacts_verifier() {
        let challenge = PKCEChallenge::generate();
        let debug = format!("{challenge:?}");
        assert!(!debug.contains(&challenge.code_verifier));
        assert!(debug.contains("<redacted>"));
    }
}
