use anyhow::{Context, Result};
use dialoguer::Input;
use std::sync::Arc;
use std::time::Duration;

use volvocars_api::auth::{self, AuthManager};
use volvocars_api::callback::{AuthorizationCallback, CallbackListener};
use volvocars_api::config::Config;
use volvocars_api::http_client::VolvoHttpClient;
use volvocars_api::models::VehicleCommand;
use volvocars_api::{FieldMap, VolvoCarsApi};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    print_startup_banner(&config);

    let auth_manager = Arc::new(
        AuthManager::new(config.auth_config()).context("Failed to create auth manager")?,
    );

    let auth_uri = auth_manager.get_auth_uri(None)?;
    println!("Open this URL in a browser and sign in with your Volvo ID:");
    println!();
    println!("  {}", auth_uri);
    println!();

    let callback = wait_for_redirect(&config, &auth_manager).await?;
    callback.verify_state(auth_manager.pending_state().as_deref())?;

    let token = auth_manager.async_request_token(&callback.code).await?;
    tracing::info!(
        "✅ Authorized (scope: {}, expires at {})",
        token.scope.as_deref().unwrap_or("-"),
        token.expires_at
    );

    let http_client = VolvoHttpClient::new(
        config.http_max_connections,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;
    let mut api = VolvoCarsApi::new(
        http_client,
        auth_manager.clone(),
        config.api_key.clone(),
        config.vin.clone().unwrap_or_default(),
    );

    println!("API status: {}", api.get_api_status().await);

    let vehicles = api.get_vehicles().await?;
    println!("Vehicles: {}", vehicles.join(", "));

    if api.vin().is_empty() {
        match vehicles.first() {
            Some(vin) => api.set_vin(vin.clone()),
            None => anyhow::bail!("No vehicles are linked to this account"),
        }
    }

    print_vehicle(&api).await;

    if let Some(command) = &config.command {
        run_command(&api, &config, command).await?;
    }

    Ok(())
}

/// Capture the redirect either through the loopback listener or a pasted URL
async fn wait_for_redirect(config: &Config, auth_manager: &AuthManager) -> Result<AuthorizationCallback> {
    let credentials = &auth_manager.config().credentials;

    if config.use_callback_listener && auth::is_loopback_redirect(credentials) {
        let listener = CallbackListener::bind(&credentials.redirect_uri).await?;
        tracing::info!("Waiting for the redirect on {}", credentials.redirect_uri);

        let callback = tokio::select! {
            callback = listener.wait(Duration::from_secs(config.callback_timeout)) => callback?,
            _ = tokio::signal::ctrl_c() => {
                anyhow::bail!("Interrupted while waiting for the redirect");
            }
        };
        return Ok(callback);
    }

    let redirect_url: String = Input::new()
        .with_prompt("Paste the URL you were redirected to")
        .interact_text()
        .context("Failed to read redirect URL")?;

    Ok(AuthorizationCallback::from_redirect_url(&redirect_url)?)
}

/// Print details and telemetry; failures of individual endpoints are logged and skipped
async fn print_vehicle(api: &VolvoCarsApi) {
    match api.get_vehicle_details(None).await {
        Ok(Some(vehicle)) => {
            println!();
            println!(
                "{} {} ({})",
                vehicle.model_year.map(|y| y.to_string()).unwrap_or_default(),
                vehicle.descriptions.model.as_deref().unwrap_or("Unknown model"),
                vehicle.fuel_type.as_deref().unwrap_or("unknown fuel")
            );
        }
        Ok(None) => tracing::warn!("No details for vehicle"),
        Err(e) => tracing::warn!("Failed to fetch vehicle details: {}", e),
    }

    print_fields("Odometer", api.get_odometer(None).await);
    print_fields("Fuel", api.get_fuel_status(None).await);
    print_fields("Doors", api.get_doors_status(None).await);
    print_fields("Windows", api.get_window_states(None).await);
    print_fields("Tyres", api.get_tyre_states(None).await);
    print_fields("Warnings", api.get_warnings(None).await);

    match api.get_energy_state(None).await {
        Ok(state) if !state.is_empty() => {
            println!();
            println!("Energy:");
            let mut keys: Vec<_> = state.keys().collect();
            keys.sort();
            for key in keys {
                let field = &state[key];
                match (&field.value, field.is_ok()) {
                    (Some(value), true) => println!(
                        "  {:<32} {} {}",
                        key,
                        value,
                        field.unit.as_deref().unwrap_or("")
                    ),
                    _ => println!(
                        "  {:<32} {}",
                        key,
                        field.message.as_deref().unwrap_or(&field.status)
                    ),
                }
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to fetch energy state: {}", e),
    }

    match api.get_location(None).await {
        Ok(Some(location)) => {
            if let (Some(lat), Some(lon)) = (location.latitude(), location.longitude()) {
                println!();
                println!("Location: {:.5}, {:.5}", lat, lon);
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to fetch location: {}", e),
    }
}

fn print_fields(title: &str, result: volvocars_api::Result<FieldMap>) {
    let fields = match result {
        Ok(fields) if fields.is_empty() => return,
        Ok(fields) => fields,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", title.to_lowercase(), e);
            return;
        }
    };

    println!();
    println!("{}:", title);

    let mut keys: Vec<_> = fields.keys().collect();
    keys.sort();
    for key in keys {
        let field = &fields[key];
        println!(
            "  {:<32} {} {}",
            key,
            field.value,
            field.unit.as_deref().unwrap_or("")
        );
    }
}

async fn run_command(api: &VolvoCarsApi, config: &Config, command: &str) -> Result<()> {
    let command: VehicleCommand = command.parse().map_err(anyhow::Error::msg)?;

    if !config.scopes.iter().any(|s| s == command.required_scope()) {
        tracing::warn!(
            "Scope {} was not requested; {} will probably be rejected",
            command.required_scope(),
            command
        );
    }

    match api.execute_command(command.as_str(), None, None).await? {
        Some(result) => println!(
            "Command {}: {:?} {}",
            command,
            result.invoke_status,
            result.message.unwrap_or_default()
        ),
        None => println!("Command {}: no result", command),
    }

    Ok(())
}

/// Print startup banner
fn print_startup_banner(config: &Config) {
    let banner = r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║                 🚗 Volvo Cars API client                  ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner);
    println!("  Version:      {}", env!("CARGO_PKG_VERSION"));
    println!("  Redirect URI: {}", config.redirect_uri);
    println!("  Scopes:       {}", config.scopes.len());
    println!("  Auth method:  {:?}", config.auth_method);
    println!("  Log Level:    {}", config.log_level);
    println!();
}
