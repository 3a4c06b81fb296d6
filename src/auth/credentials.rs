// Credential validation
// Runs before any network call

use url::Url;

use super::types::{AuthConfig, Credentials};
use crate::error::{Result, VolvoError};

/// Check everything needed to build an authorization URI
pub fn validate_for_authorization(config: &AuthConfig) -> Result<()> {
    let creds = &config.credentials;

    require("client_id", &creds.client_id)?;
    require("redirect_uri", &creds.redirect_uri)?;
    parse_url("redirect_uri", &creds.redirect_uri)?;
    parse_url("authorize_url", &config.authorize_url)?;

    if creds.scopes.iter().any(|s| s.trim().is_empty() || s.contains(' ')) {
        return Err(VolvoError::Configuration(
            "scopes must be non-empty and must not contain spaces".to_string(),
        ));
    }

    Ok(())
}

/// Check everything needed to call the token endpoint
pub fn validate_for_token(config: &AuthConfig) -> Result<()> {
    let creds = &config.credentials;

    require("client_id", &creds.client_id)?;
    require("client_secret", &creds.client_secret)?;
    require("redirect_uri", &creds.redirect_uri)?;
    parse_url("token_url", &config.token_url)?;

    Ok(())
}

/// Detect whether the redirect URI points back to this machine
pub fn is_loopback_redirect(creds: &Credentials) -> bool {
    Url::parse(&creds.redirect_uri)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.to_string()))
        .map(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
        .unwrap_or(false)
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VolvoError::Configuration(format!("{} is required", name)));
    }
    Ok(())
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| VolvoError::Configuration(format!("{} is not a valid URL ({}): {}", name, e, value)))
}
