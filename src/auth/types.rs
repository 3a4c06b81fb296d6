// Authentication types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::pkce::MAX_CODE_VERIFIER_LENGTH;

/// Volvo ID authorization endpoint
pub const AUTHORIZE_URL: &str = "https://volvoid.eu.volvocars.com/as/authorization.oauth2";

/// Volvo ID token endpoint
pub const TOKEN_URL: &str = "https://volvoid.eu.volvocars.com/as/token.oauth2";

/// Seconds subtracted from `expires_in` so a token is never used right at its expiry
pub const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 60;

/// Longest `expires_in` honoured; larger values from the server are capped
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Client credentials registered with the authorization server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,

    /// Must match the registered redirect URI exactly
    pub redirect_uri: String,

    /// Requested scopes, space-joined on the wire
    pub scopes: Vec<String>,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
        }
    }

    /// Scope parameter value
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"**REDACTED**")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// How the client authenticates itself at the token endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuthMethod {
    /// client_id and client_secret in the form body
    #[default]
    ClientSecretPost,

    /// HTTP Basic authorization header
    ClientSecretBasic,
}

/// Everything an AuthManager needs to talk to the authorization server
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub credentials: Credentials,
    pub authorize_url: String,
    pub token_url: String,
    pub auth_method: ClientAuthMethod,
    pub code_verifier_length: usize,
    pub expiry_margin: Duration,
}

impl AuthConfig {
    /// Config pointing at the production Volvo ID endpoints
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            auth_method: ClientAuthMethod::default(),
            code_verifier_length: MAX_CODE_VERIFIER_LENGTH,
            expiry_margin: Duration::seconds(DEFAULT_EXPIRY_MARGIN_SECS),
        }
    }

    pub fn with_endpoints(
        mut self,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self
    }

    pub fn with_auth_method(mut self, auth_method: ClientAuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    pub fn with_code_verifier_length(mut self, length: usize) -> Self {
        self.code_verifier_length = length;
        self
    }

    pub fn with_expiry_margin(mut self, margin: Duration) -> Self {
        self.expiry_margin = margin;
        self
    }
}

/// Tokens issued by the authorization server.
/// Serializable so callers can persist and later `restore` them.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub scope: Option<String>,

    /// Issuance time + expires_in - expiry margin
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// Build token state from a token endpoint response received at `now`
    pub(crate) fn from_response(
        response: TokenResponse,
        now: DateTime<Utc>,
        margin: Duration,
        previous_refresh_token: Option<String>,
    ) -> Self {
        let seconds = i64::try_from(response.expires_in)
            .unwrap_or(MAX_TOKEN_LIFETIME_SECS)
            .min(MAX_TOKEN_LIFETIME_SECS);
        let lifetime = Duration::seconds(seconds)
            .checked_sub(&margin)
            .unwrap_or_else(Duration::zero)
            .max(Duration::zero());
        let expires_at = now.checked_add_signed(lifetime).unwrap_or(now);

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh_token),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            scope: response.scope,
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &"**REDACTED**")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "**REDACTED**"),
            )
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Lifecycle of an AuthManager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AuthorizationRequested,
    Authenticated,
    Expired,
}

/// Token endpoint success response
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// Token endpoint error response (RFC 6749 section 5.2)
#[derive(Deserialize, Default)]
pub(crate) struct OAuthErrorResponse {
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Some servers send `expires_in` as a string
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
