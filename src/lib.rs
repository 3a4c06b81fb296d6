// Volvo Cars API client - library root

pub mod api;
pub mod auth;
pub mod callback;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod scopes;
pub mod util;

pub use api::{FieldMap, VolvoCarsApi};
pub use auth::{AccessTokenProvider, AuthConfig, AuthManager, AuthState, Credentials, TokenState};
pub use error::{Result, VolvoError};
