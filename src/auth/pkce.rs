// PKCE (RFC 7636) verifier and challenge generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, VolvoError};

/// Shortest verifier allowed by RFC 7636
pub const MIN_CODE_VERIFIER_LENGTH: usize = 43;

/// Longest verifier allowed by RFC 7636
pub const MAX_CODE_VERIFIER_LENGTH: usize = 128;

/// Random bytes drawn per verifier; base64url encodes them to exactly 128 characters
const VERIFIER_ENTROPY_BYTES: usize = 96;

/// PKCE code verifier and challenge pair
#[derive(Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a new pair with a verifier of `length` characters
    pub fn generate(length: usize) -> Result<Self> {
        let verifier = generate_code_verifier(length)?;
        let challenge = compute_code_challenge(&verifier)?;

        Ok(Self {
            verifier,
            challenge,
        })
    }
}

impl std::fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("verifier", &"**REDACTED**")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Check that a verifier length is within 43..=128
pub fn validate_verifier_length(length: usize) -> Result<()> {
    if (MIN_CODE_VERIFIER_LENGTH..=MAX_CODE_VERIFIER_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(VolvoError::Configuration(format!(
            "code verifier length must be between {} and {}, got {}",
            MIN_CODE_VERIFIER_LENGTH, MAX_CODE_VERIFIER_LENGTH, length
        )))
    }
}

/// Generate a verifier from the operating system CSPRNG.
/// The base64url alphabet is a subset of the RFC 7636 unreserved characters.
pub fn generate_code_verifier(length: usize) -> Result<String> {
    validate_verifier_length(length)?;

    let mut bytes = [0u8; VERIFIER_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let mut verifier = URL_SAFE_NO_PAD.encode(bytes);
    verifier.truncate(length);
    Ok(verifier)
}

/// S256 challenge: BASE64URL-NOPAD(SHA256(ASCII(verifier)))
pub fn compute_code_challenge(verifier: &str) -> Result<String> {
    validate_verifier_length(verifier.len())?;

    if !verifier.bytes().all(is_unreserved) {
        return Err(VolvoError::Configuration(
            "code verifier contains characters outside [A-Za-z0-9-._~]".to_string(),
        ));
    }

    let digest = Sha256::digest(verifier.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(digest))
}

/// Random opaque value for the `state` parameter
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}
