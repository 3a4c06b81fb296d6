// Error handling module
// Defines the error taxonomy shared by the auth and API layers

use thiserror::Error;

/// Errors returned by the Volvo Cars client
#[derive(Error, Debug)]
pub enum VolvoError {
    /// Missing or invalid client configuration, detected before any network call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The authorization server or the API rejected the credentials
    #[error(
        "Authentication failed ({operation}): {}",
        describe_auth_failure(.status, .code, .description)
    )]
    Auth {
        operation: String,
        status: Option<u16>,
        code: Option<String>,
        description: Option<String>,
    },

    /// No valid access token and nothing to refresh it with
    #[error("Access token expired and no refresh token is available; authorization is required")]
    TokenExpired,

    /// Error returned by the Volvo Cars API
    #[error("API error ({operation}): {message}")]
    Api {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// Transport failure while talking to the token endpoint
    #[error("Network error ({operation}): {source}")]
    Network {
        operation: String,
        source: reqwest::Error,
    },

    /// The server answered with a body that could not be decoded
    #[error("Invalid response ({operation}): {message}")]
    InvalidResponse { operation: String, message: String },
}

impl VolvoError {
    /// Build an auth error carrying only a human readable description
    pub fn auth(operation: impl Into<String>, description: impl Into<String>) -> Self {
        VolvoError::Auth {
            operation: operation.into(),
            status: None,
            code: None,
            description: Some(description.into()),
        }
    }

    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            VolvoError::Auth { status, .. } | VolvoError::Api { status, .. } => *status,
            VolvoError::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the caller has to redo the authorization flow
    pub fn is_auth_error(&self) -> bool {
        matches!(self, VolvoError::Auth { .. } | VolvoError::TokenExpired)
    }
}

fn describe_auth_failure(
    status: &Option<u16>,
    code: &Option<String>,
    description: &Option<String>,
) -> String {
    let detail = match (code, description) {
        (Some(code), Some(description)) => format!("{} - {}", code, description),
        (Some(code), None) => code.clone(),
        (None, Some(description)) => description.clone(),
        (None, None) => "no error details".to_string(),
    };

    match status {
        Some(status) => format!("HTTP {} {}", status, detail),
        None => detail,
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, VolvoError>;
