// Authentication module
// OAuth 2.0 authorization code flow with PKCE and token lifecycle

mod credentials;
mod exchange;
mod manager;
mod pkce;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use credentials::{is_loopback_redirect, validate_for_authorization, validate_for_token};
pub use manager::AuthManager;
pub use pkce::{
    compute_code_challenge, generate_code_verifier, generate_state, PkceChallenge,
    MAX_CODE_VERIFIER_LENGTH, MIN_CODE_VERIFIER_LENGTH,
};
pub use types::{
    AuthConfig, AuthState, ClientAuthMethod, Credentials, TokenState, AUTHORIZE_URL,
    DEFAULT_EXPIRY_MARGIN_SECS, MAX_TOKEN_LIFETIME_SECS, TOKEN_URL,
};

/// Source of bearer tokens for API requests
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a currently valid access token
    async fn access_token(&self) -> Result<String>;
}
