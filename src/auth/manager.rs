use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, RwLock};

use super::credentials;
use super::exchange;
use super::pkce::{self, PkceChallenge};
use super::types::{AuthConfig, AuthState, TokenState};
use super::AccessTokenProvider;
use crate::error::{Result, VolvoError};

/// Authorization attempt waiting for its code
struct PendingAuthorization {
    pkce: PkceChallenge,
    state: String,
}

/// Authentication manager
/// Drives the PKCE authorization flow and keeps the access token fresh
pub struct AuthManager {
    /// Credentials, endpoints and token policy
    config: AuthConfig,

    /// HTTP client for the token endpoint
    client: Client,

    /// Most recent authorization attempt; a new attempt replaces it
    pending: StdMutex<Option<PendingAuthorization>>,

    /// Current tokens
    token: RwLock<Option<TokenState>>,

    /// Serializes token endpoint calls so concurrent callers share one refresh
    refresh_lock: Mutex<()>,
}

impl AuthManager {
    /// Create a new AuthManager with its own HTTP client
    pub fn new(config: AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                VolvoError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Self::with_client(config, client)
    }

    /// Create a new AuthManager on a caller supplied HTTP client
    pub fn with_client(config: AuthConfig, client: Client) -> Result<Self> {
        pkce::validate_verifier_length(config.code_verifier_length)?;

        Ok(Self {
            config,
            client,
            pending: StdMutex::new(None),
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Build the authorization URI for a fresh PKCE pair.
    /// Any earlier authorization attempt can no longer complete.
    pub fn get_auth_uri(&self, state: Option<&str>) -> Result<String> {
        credentials::validate_for_authorization(&self.config)?;

        let pkce = PkceChallenge::generate(self.config.code_verifier_length)?;
        let state = state
            .map(str::to_string)
            .unwrap_or_else(pkce::generate_state);

        let uri = build_authorization_url(&self.config, &pkce.challenge, &state);

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.is_some() {
            tracing::debug!("Replacing pending authorization attempt");
        }
        *pending = Some(PendingAuthorization { pkce, state });

        tracing::info!("Authorization URI created");
        Ok(uri)
    }

    /// `state` sent with the pending authorization attempt
    pub fn pending_state(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.state.clone())
    }

    /// Exchange the authorization code from the redirect for tokens.
    /// On failure the current token state is left untouched.
    pub async fn async_request_token(&self, code: &str) -> Result<TokenState> {
        credentials::validate_for_token(&self.config)?;

        let verifier = self.pending_verifier().ok_or_else(|| {
            VolvoError::Configuration(
                "No authorization in progress; call get_auth_uri first".to_string(),
            )
        })?;

        let _guard = self.refresh_lock.lock().await;

        let token = exchange::request_token(&self.client, &self.config, code, &verifier).await?;

        {
            // Only consume the attempt we used; a newer one may have started meanwhile
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if pending.as_ref().is_some_and(|p| p.pkce.verifier == verifier) {
                *pending = None;
            }
        }

        *self.token.write().await = Some(token.clone());
        tracing::info!("Authentication successful");

        Ok(token)
    }

    /// Get a valid access token, refreshing if necessary
    /// Thread-safe method that ensures only one refresh occurs at a time
    pub async fn async_ensure_token(&self) -> Result<String> {
        if let Some(token) = self.current_valid_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock
        let refresh_token = {
            let token = self.token.read().await;
            match token.as_ref() {
                Some(t) if !t.is_expired() => return Ok(t.access_token.clone()),
                Some(t) => t.refresh_token.clone(),
                None => None,
            }
        };

        let Some(refresh_token) = refresh_token else {
            // Nothing left to refresh with
            let mut token = self.token.write().await;
            if token.take().is_some() {
                tracing::warn!("Access token expired and no refresh token is available");
            }
            return Err(VolvoError::TokenExpired);
        };

        tracing::debug!("Access token expired, refreshing...");
        let token = self.refresh_locked(&refresh_token).await?;
        Ok(token.access_token)
    }

    /// Refresh now, regardless of expiry
    pub async fn async_refresh_token(&self) -> Result<TokenState> {
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = self
            .token
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or(VolvoError::TokenExpired)?;

        self.refresh_locked(&refresh_token).await
    }

    /// Caller must hold `refresh_lock`
    async fn refresh_locked(&self, refresh_token: &str) -> Result<TokenState> {
        match exchange::refresh_token(&self.client, &self.config, refresh_token).await {
            Ok(token) => {
                *self.token.write().await = Some(token.clone());
                Ok(token)
            }
            Err(e @ VolvoError::Auth { status: Some(400 | 401 | 403), .. }) => {
                // The server rejected the refresh token; only a new authorization helps
                tracing::error!("Token refresh rejected: {}", e);
                *self.token.write().await = None;
                Err(e)
            }
            Err(e) => {
                tracing::error!("Token refresh failed: {}", e);
                Err(e)
            }
        }
    }

    async fn current_valid_token(&self) -> Option<String> {
        let token = self.token.read().await;
        token
            .as_ref()
            .filter(|t| !t.is_expired())
            .map(|t| t.access_token.clone())
    }

    fn pending_verifier(&self) -> Option<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|p| p.pkce.verifier.clone())
    }

    /// Snapshot of the current tokens, e.g. for persisting them
    pub async fn token_state(&self) -> Option<TokenState> {
        self.token.read().await.clone()
    }

    /// Reinstate previously issued tokens
    pub async fn restore(&self, token: TokenState) {
        tracing::debug!("Restoring token state, expires: {}", token.expires_at.to_rfc3339());
        *self.token.write().await = Some(token);
    }

    /// Forget tokens and any pending authorization
    pub async fn clear(&self) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self.token.write().await = None;
    }

    /// Check if the current access token is still usable
    pub async fn is_token_valid(&self) -> bool {
        self.current_valid_token().await.is_some()
    }

    pub async fn state(&self) -> AuthState {
        let token_state = self
            .token
            .read()
            .await
            .as_ref()
            .map(|t| t.is_expired());

        match token_state {
            Some(false) => AuthState::Authenticated,
            Some(true) => AuthState::Expired,
            None if self.pending_verifier().is_some() => AuthState::AuthorizationRequested,
            None => AuthState::Unauthenticated,
        }
    }
}

#[async_trait]
impl AccessTokenProvider for AuthManager {
    async fn access_token(&self) -> Result<String> {
        self.async_ensure_token().await
    }
}

/// Build the authorization URL. Spaces are encoded as `%20`.
fn build_authorization_url(config: &AuthConfig, challenge: &str, state: &str) -> String {
    let creds = &config.credentials;
    let scope = creds.scope_string();

    let params = [
        ("response_type", "code"),
        ("client_id", creds.client_id.as_str()),
        ("redirect_uri", creds.redirect_uri.as_str()),
        ("scope", scope.as_str()),
        ("code_challenge", challenge),
        ("code_challenge_method", "S256"),
        ("state", state),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if config.authorize_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", config.authorize_url, separator, query)
}
