use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Input, Password};

use crate::auth::{AuthConfig, ClientAuthMethod, Credentials, DEFAULT_EXPIRY_MARGIN_SECS};
use crate::scopes;

/// Volvo Cars API sample client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// OAuth client id
    #[arg(long, env = "VOLVO_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "VOLVO_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Application API key (vcc-api-key)
    #[arg(short = 'k', long, env = "VOLVO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Redirect URI registered for the application
    #[arg(
        short = 'r',
        long,
        env = "VOLVO_REDIRECT_URI",
        default_value = "http://localhost:8080/callback"
    )]
    pub redirect_uri: String,

    /// Space or comma separated scopes; defaults to every non-deprecated scope
    #[arg(short = 's', long, env = "VOLVO_SCOPES")]
    pub scopes: Option<String>,

    /// Vehicle to query; defaults to the first linked vehicle
    #[arg(long, env = "VOLVO_VIN")]
    pub vin: Option<String>,

    /// Client authentication at the token endpoint (post, basic)
    #[arg(long, env = "VOLVO_AUTH_METHOD", default_value = "post")]
    pub auth_method: String,

    /// Paste the redirect URL instead of running a local callback listener
    #[arg(long)]
    pub no_callback: bool,

    /// Seconds to wait for the browser redirect
    #[arg(long, env = "VOLVO_CALLBACK_TIMEOUT", default_value = "300")]
    pub callback_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,

    /// Command to invoke after fetching telemetry (e.g. lock, honk-flash)
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Largest accepted token expiry margin
const MAX_EXPIRY_MARGIN_SECS: i64 = 3600;

#[derive(Clone, Debug)]
pub struct Config {
    // Application credentials
    pub client_id: String,
    pub client_secret: String,
    pub api_key: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_method: ClientAuthMethod,

    // Vehicle
    pub vin: Option<String>,
    pub command: Option<String>,

    // Authorization flow
    pub use_callback_listener: bool,
    pub callback_timeout: u64,
    pub expiry_margin: i64,

    // HTTP client
    pub http_max_connections: usize,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > .env > prompt
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();
        let config = Self::from_args(args, true)?;

        Ok(config)
    }

    /// Build configuration from parsed arguments, prompting for missing secrets when `interactive`
    pub fn from_args(args: CliArgs, interactive: bool) -> Result<Self> {
        let client_id = required(args.client_id, "VOLVO_CLIENT_ID", interactive, false)?;
        let client_secret = required(args.client_secret, "VOLVO_CLIENT_SECRET", interactive, true)?;
        let api_key = required(args.api_key, "VOLVO_API_KEY", interactive, true)?;

        let scopes = args
            .scopes
            .as_deref()
            .map(parse_scopes)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(scopes::default_scopes);

        let config = Config {
            client_id,
            client_secret,
            api_key,
            redirect_uri: args.redirect_uri,
            scopes,
            auth_method: parse_auth_method(&args.auth_method)?,

            vin: args.vin.filter(|v| !v.trim().is_empty()),
            command: args.command,

            use_callback_listener: !args.no_callback,
            callback_timeout: args.callback_timeout,
            expiry_margin: std::env::var("VOLVO_EXPIRY_MARGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EXPIRY_MARGIN_SECS),

            http_max_connections: std::env::var("HTTP_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            http_connect_timeout: std::env::var("HTTP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            http_request_timeout: args.http_timeout,

            log_level: args.log_level,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.redirect_uri)
            .with_context(|| format!("VOLVO_REDIRECT_URI is not a valid URL: {}", self.redirect_uri))?;

        if self.callback_timeout == 0 {
            anyhow::bail!("Callback timeout must be greater than zero");
        }

        if !(0..=MAX_EXPIRY_MARGIN_SECS).contains(&self.expiry_margin) {
            anyhow::bail!(
                "VOLVO_EXPIRY_MARGIN must be between 0 and {} seconds",
                MAX_EXPIRY_MARGIN_SECS
            );
        }

        Ok(())
    }

    /// Library-level auth configuration
    pub fn auth_config(&self) -> AuthConfig {
        let credentials = Credentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.redirect_uri.clone(),
            self.scopes.clone(),
        );

        AuthConfig::new(credentials)
            .with_auth_method(self.auth_method)
            .with_expiry_margin(chrono::Duration::seconds(
                self.expiry_margin.clamp(0, MAX_EXPIRY_MARGIN_SECS),
            ))
    }
}

/// Use the supplied value or prompt for it
fn required(value: Option<String>, name: &str, interactive: bool, secret: bool) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }

    if !interactive {
        anyhow::bail!("{} is required", name);
    }

    let value: String = if secret {
        Password::new()
            .with_prompt(format!("Enter {}", name))
            .interact()
            .with_context(|| format!("Failed to read {}", name))?
    } else {
        Input::new()
            .with_prompt(format!("Enter {}", name))
            .interact_text()
            .with_context(|| format!("Failed to read {}", name))?
    };

    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }

    Ok(value)
}

/// Split a scope list on spaces or commas
fn parse_scopes(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse client authentication method from string
fn parse_auth_method(s: &str) -> Result<ClientAuthMethod> {
    match s.to_lowercase().as_str() {
        "post" | "client_secret_post" => Ok(ClientAuthMethod::ClientSecretPost),
        "basic" | "client_secret_basic" => Ok(ClientAuthMethod::ClientSecretBasic),
        other => anyhow::bail!("Unknown auth method: {} (expected post or basic)", other),
    }
}
