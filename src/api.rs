// Volvo Cars API endpoint wrappers
// Each call fetches a valid token, attaches the API key and parses JSON

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::AccessTokenProvider;
use crate::error::{Result, VolvoError};
use crate::http_client::VolvoHttpClient;
use crate::models::{
    AvailableCommand, CommandResult, ErrorResult, Location, ValueField, ValueStatusField, Vehicle,
};
use crate::util::{redact_data, redact_url};

/// Production API host
pub const API_URL: &str = "https://api.volvocars.com";

/// Developer portal backend status endpoint
pub const API_STATUS_URL: &str =
    "https://public-developer-portal-bff.weu-prod.ecpaz.volvocars.biz/api/v1/backend-status";

/// Header carrying the application's API key
pub const API_KEY_HEADER: &str = "vcc-api-key";

const CONNECTED_ENDPOINT: &str = "/connected-vehicle/v2/vehicles";
const ENERGY_ENDPOINT: &str = "/energy/v1/vehicles";
const ENERGY_V2_ENDPOINT: &str = "/energy/v2/vehicles";
const LOCATION_ENDPOINT: &str = "/location/v1/vehicles";

const DATA_TO_REDACT: &[&str] = &["coordinates", "heading", "href", "vin"];

/// Field name to value, as returned by the connected-vehicle endpoints
pub type FieldMap = HashMap<String, ValueField>;

/// Typed access to the Volvo Cars API
pub struct VolvoCarsApi {
    http: VolvoHttpClient,
    token_provider: Arc<dyn AccessTokenProvider>,
    api_key: String,

    /// Used when a call does not name a VIN
    vin: String,

    base_url: String,
    status_url: String,
}

impl VolvoCarsApi {
    pub fn new(
        http: VolvoHttpClient,
        token_provider: Arc<dyn AccessTokenProvider>,
        api_key: impl Into<String>,
        vin: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_provider,
            api_key: api_key.into(),
            vin: vin.into(),
            base_url: API_URL.to_string(),
            status_url: API_STATUS_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_status_url(mut self, status_url: impl Into<String>) -> Self {
        self.status_url = status_url.into();
        self
    }

    pub fn vin(&self) -> &str {
        &self.vin
    }

    pub fn set_vin(&mut self, vin: impl Into<String>) {
        self.vin = vin.into();
    }

    /// Backend status message; "OK" when healthy, "Unknown" when unreachable. Never fails.
    pub async fn get_api_status(&self) -> String {
        tracing::debug!("Request [API status]");

        let result = async {
            let response = self.http.client().get(&self.status_url).send().await?;
            tracing::debug!("Request [API status] status: {}", response.status());
            response.error_for_status()?.json::<Value>().await
        }
        .await;

        match result {
            Ok(data) => {
                tracing::debug!("Request [API status] response: {}", data);
                data.get("message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or("OK")
                    .to_string()
            }
            Err(e) => {
                tracing::debug!("Request [API status] error: {}", e);
                "Unknown".to_string()
            }
        }
    }

    /// Required scopes: openid conve:brake_status
    pub async fn get_brakes_status(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "brakes", vin).await
    }

    /// Required scopes: openid conve:command_accessibility
    pub async fn get_command_accessibility(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "command-accessibility", vin)
            .await
    }

    /// Required scopes: openid conve:commands
    pub async fn get_commands(&self, vin: Option<&str>) -> Result<Vec<AvailableCommand>> {
        let body = self.get(CONNECTED_ENDPOINT, "commands", vin).await?;
        Ok(parse_list(&body, "commands"))
    }

    /// Required scopes: openid conve:diagnostics_workshop
    pub async fn get_diagnostics(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "diagnostics", vin).await
    }

    /// Required scopes: openid conve:doors_status conve:lock_status
    pub async fn get_doors_status(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "doors", vin).await
    }

    /// Required scopes: openid energy:capability:read
    pub async fn get_energy_capabilities(&self, vin: Option<&str>) -> Result<Value> {
        let body = self.get(ENERGY_V2_ENDPOINT, "capabilities", vin).await?;
        Ok(take_key(body, "getEnergyState"))
    }

    /// Required scopes: openid energy:state:read
    pub async fn get_energy_state(
        &self,
        vin: Option<&str>,
    ) -> Result<HashMap<String, ValueStatusField>> {
        let body = self.get(ENERGY_V2_ENDPOINT, "state", vin).await?;
        Ok(parse_entries(&body, "energy state"))
    }

    /// Required scopes: openid conve:engine_status
    pub async fn get_engine_status(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "engine-status", vin).await
    }

    /// Required scopes: openid conve:diagnostics_engine_status
    pub async fn get_engine_warnings(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "engine", vin).await
    }

    /// Required scopes: openid conve:fuel_status conve:battery_charge_level
    pub async fn get_fuel_status(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "fuel", vin).await
    }

    /// Required scopes: openid location:read
    pub async fn get_location(&self, vin: Option<&str>) -> Result<Option<Location>> {
        let body = self.get(LOCATION_ENDPOINT, "location", vin).await?;
        Ok(parse_optional(take_key(body, "data"), "location"))
    }

    /// Required scopes: openid conve:odometer_status
    pub async fn get_odometer(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "odometer", vin).await
    }

    /// Required scopes: openid plus at least one of the deprecated energy v1 scopes
    pub async fn get_recharge_status(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(ENERGY_ENDPOINT, "recharge-status", vin).await
    }

    /// Required scopes: openid conve:trip_statistics
    pub async fn get_statistics(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "statistics", vin).await
    }

    /// Required scopes: openid conve:tyre_status
    pub async fn get_tyre_states(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "tyres", vin).await
    }

    /// VINs of the vehicles linked to the account.
    /// Required scopes: openid conve:vehicle_relation
    pub async fn get_vehicles(&self) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, CONNECTED_ENDPOINT);
        let body = self
            .request(Method::GET, &url, "vehicles", None, "")
            .await?;

        let vins = body
            .get("data")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("vin").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(vins)
    }

    /// Required scopes: openid conve:vehicle_relation
    pub async fn get_vehicle_details(&self, vin: Option<&str>) -> Result<Option<Vehicle>> {
        let body = self.get(CONNECTED_ENDPOINT, "", vin).await?;
        Ok(parse_optional(take_key(body, "data"), "vehicle details"))
    }

    /// Required scopes: openid conve:warnings
    pub async fn get_warnings(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "warnings", vin).await
    }

    /// Required scopes: openid conve:windows_status
    pub async fn get_window_states(&self, vin: Option<&str>) -> Result<FieldMap> {
        self.get_field(CONNECTED_ENDPOINT, "windows", vin).await
    }

    /// Invoke a command such as `lock` or `honk-flash`.
    /// Each command needs its own scope, see `VehicleCommand::required_scope`.
    pub async fn execute_command(
        &self,
        command: &str,
        body: Option<&Value>,
        vin: Option<&str>,
    ) -> Result<Option<CommandResult>> {
        let vin = self.resolve_vin(vin)?;
        let operation = format!("commands/{}", command);
        let url = self.vin_url(CONNECTED_ENDPOINT, &operation, vin);

        let response = self
            .request(Method::POST, &url, &operation, body, vin)
            .await?;

        Ok(parse_optional(take_key(response, "data"), "command result"))
    }

    /// Valid access token from the provider, with token endpoint failures
    /// other than 400/401/403 reported as API errors
    pub async fn get_access_token(&self) -> Result<String> {
        let operation = "token refresh";

        match self.token_provider.access_token().await {
            Ok(token) => Ok(token),
            Err(VolvoError::Auth {
                status: Some(status),
                code,
                description,
                ..
            }) if !matches!(status, 400 | 401 | 403) => {
                tracing::debug!("Request [{}] error: HTTP {}", operation, status);
                Err(VolvoError::Api {
                    operation: operation.to_string(),
                    status: Some(status),
                    message: description
                        .or(code)
                        .unwrap_or_else(|| format!("HTTP {}", status)),
                })
            }
            Err(VolvoError::Network { source, .. }) => {
                tracing::debug!("Request [{}] error: {}", operation, source);
                Err(VolvoError::Api {
                    operation: operation.to_string(),
                    status: None,
                    message: source.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn get_field(&self, endpoint: &str, operation: &str, vin: Option<&str>) -> Result<FieldMap> {
        let body = self.get(endpoint, operation, vin).await?;
        let data = take_key(body, "data");
        Ok(parse_entries(&data, operation))
    }

    async fn get(&self, endpoint: &str, operation: &str, vin: Option<&str>) -> Result<Value> {
        let vin = self.resolve_vin(vin)?;
        let url = self.vin_url(endpoint, operation, vin);
        let operation = if operation.is_empty() { "vehicle" } else { operation };

        self.request(Method::GET, &url, operation, None, vin).await
    }

    fn resolve_vin<'a>(&'a self, vin: Option<&'a str>) -> Result<&'a str> {
        let vin = vin.filter(|v| !v.is_empty()).unwrap_or(&self.vin);
        if vin.is_empty() {
            return Err(VolvoError::Configuration(
                "VIN is required; pass one or set a default".to_string(),
            ));
        }
        Ok(vin)
    }

    fn vin_url(&self, endpoint: &str, operation: &str, vin: &str) -> String {
        if operation.is_empty() {
            format!("{}{}/{}", self.base_url, endpoint, vin)
        } else {
            format!("{}{}/{}/{}", self.base_url, endpoint, vin, operation)
        }
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        operation: &str,
        body: Option<&Value>,
        vin: &str,
    ) -> Result<Value> {
        let access_token = self.get_access_token().await?;

        let mut builder = self
            .http
            .client()
            .request(method.clone(), url)
            .bearer_auth(access_token)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json");

        if method == Method::POST {
            builder = builder.header(CONTENT_TYPE, "application/json");
            if let Some(body) = body {
                builder = builder.body(body.to_string());
            }
        }

        let request = builder.build().map_err(|e| VolvoError::Api {
            operation: operation.to_string(),
            status: None,
            message: format!("Failed to build request: {}", e),
        })?;

        let display_url = redact_url(url, vin);
        let response = self.http.execute(request, operation, &display_url).await?;
        let status = response.status();

        let text = response.text().await.map_err(|e| VolvoError::Api {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;

        let data = if text.trim().is_empty() {
            Some(Value::Object(Map::new()))
        } else {
            serde_json::from_str::<Value>(&text).ok()
        };

        if let Some(data) = &data {
            tracing::debug!(
                "Request [{}] response: {}",
                operation,
                redact_data(data, DATA_TO_REDACT)
            );
        }

        if status.is_success() {
            return data.ok_or_else(|| VolvoError::InvalidResponse {
                operation: operation.to_string(),
                message: "Response body is not valid JSON".to_string(),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Ok(Value::Object(Map::new()));
        }

        tracing::debug!("Request [{}] error: {}", operation, status);

        if status == StatusCode::UNPROCESSABLE_ENTITY && url.contains("/commands") {
            return Ok(json!({
                "data": {
                    "vin": vin,
                    "invokeStatus": "UNKNOWN",
                    "message": "",
                }
            }));
        }

        let message = data
            .as_ref()
            .and_then(|d| d.get("error"))
            .and_then(|e| serde_json::from_value::<ErrorResult>(e.clone()).ok())
            .and_then(|e| e.summary())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(VolvoError::Auth {
                operation: operation.to_string(),
                status: Some(status.as_u16()),
                code: None,
                description: Some(message),
            });
        }

        Err(VolvoError::Api {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            message,
        })
    }
}

fn take_key(mut body: Value, key: &str) -> Value {
    body.get_mut(key)
        .map(Value::take)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Parse every entry of a JSON object, skipping entries that do not fit `T`
fn parse_entries<T: DeserializeOwned>(data: &Value, operation: &str) -> HashMap<String, T> {
    let Some(object) = data.as_object() else {
        return HashMap::new();
    };

    object
        .iter()
        .filter_map(|(key, value)| match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some((key.clone(), parsed)),
            Err(e) => {
                tracing::debug!("Request [{}] skipping field {}: {}", operation, key, e);
                None
            }
        })
        .collect()
}

fn parse_list<T: DeserializeOwned>(body: &Value, operation: &str) -> Vec<T> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match serde_json::from_value(item.clone()) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        tracing::debug!("Request [{}] skipping item: {}", operation, e);
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// None for an empty object (e.g. after a 404) or an unparsable body
fn parse_optional<T: DeserializeOwned>(data: Value, operation: &str) -> Option<T> {
    if data.as_object().is_some_and(Map::is_empty) {
        return None;
    }

    serde_json::from_value(data)
        .map_err(|e| tracing::debug!("Request [{}] unexpected response: {}", operation, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvokeStatus;
    use async_trait::async_trait;
    use mockito::Matcher;

    const VIN: &str = "YV1TESTVIN0000001";

    struct StaticToken(&'static str);

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn access_token(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingToken(u16);

    #[async_trait]
    impl AccessTokenProvider for FailingToken {
        async fn access_token(&self) -> Result<String> {
            Err(VolvoError::Auth {
                operation: "token refresh".to_string(),
                status: Some(self.0),
                code: Some("server_error".to_string()),
                description: None,
            })
        }
    }

    fn api(server: &mockito::ServerGuard, provider: Arc<dyn AccessTokenProvider>) -> VolvoCarsApi {
        VolvoCarsApi::new(
            VolvoHttpClient::from_client(reqwest::Client::new()),
            provider,
            "secretapikey",
            VIN,
        )
        .with_base_url(server.url())
        .with_status_url(format!("{}/backend-status", server.url()))
    }

    fn path(operation: &str) -> String {
        format!("{}/{}/{}", CONNECTED_ENDPOINT, VIN, operation)
    }

    #[tokio::test]
    async fn test_get_odometer_successful() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", path("odometer").as_str())
            .match_header("authorization", "Bearer valid_token_123")
            .match_header("vcc-api-key", "secretapikey")
            .with_status(200)
            .with_body(
                r#"{"data": {"odometer": {"value": 30000, "unit": "km", "timestamp": "2024-12-30T14:18:56Z"}}}"#,
            )
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("valid_token_123")));
        let result = api.get_odometer(None).await.unwrap();

        mock.assert_async().await;
        let odometer = &result["odometer"];
        assert_eq!(odometer.as_f64(), Some(30000.0));
        assert_eq!(odometer.unit.as_deref(), Some("km"));
    }

    #[tokio::test]
    async fn test_explicit_vin_overrides_default() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/connected-vehicle/v2/vehicles/OTHERVIN/windows")
            .with_status(200)
            .with_body(r#"{"data": {"frontLeftWindow": {"value": "CLOSED"}}}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let result = api.get_window_states(Some("OTHERVIN")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result["frontLeftWindow"].as_str(), Some("CLOSED"));
    }

    #[tokio::test]
    async fn test_missing_vin_is_configuration_error() {
        let server = mockito::Server::new_async().await;
        let mut api = api(&server, Arc::new(StaticToken("t")));
        api.set_vin("");

        assert!(matches!(
            api.get_odometer(None).await,
            Err(VolvoError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_not_found_returns_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", path("tyres").as_str())
            .with_status(404)
            .with_body(r#"{"error": {"message": "Not found"}}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        assert!(api.get_tyre_states(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", path("odometer").as_str())
            .with_status(401)
            .with_body(r#"{"error": {"message": "Unauthorized", "description": "Token is invalid"}}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let err = api.get_odometer(None).await.unwrap_err();

        match err {
            VolvoError::Auth {
                status,
                description,
                ..
            } => {
                assert_eq!(status, Some(401));
                assert_eq!(description.as_deref(), Some("Unauthorized Token is invalid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", path("odometer").as_str())
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let err = api.get_odometer(None).await.unwrap_err();

        assert!(matches!(
            err,
            VolvoError::Api {
                status: Some(500),
                ..
            }
        ));
        assert_eq!(err.to_string(), "API error (odometer): Internal Server Error");
    }

    #[tokio::test]
    async fn test_token_failure_mapping() {
        let server = mockito::Server::new_async().await;

        for status in [400u16, 401, 403] {
            let api = api(&server, Arc::new(FailingToken(status)));
            assert!(matches!(
                api.get_access_token().await,
                Err(VolvoError::Auth { .. })
            ));
        }

        for status in [404u16, 500] {
            let api = api(&server, Arc::new(FailingToken(status)));
            let err = api.get_odometer(None).await.unwrap_err();
            assert!(matches!(err, VolvoError::Api { .. }));
        }
    }

    #[tokio::test]
    async fn test_get_vehicles() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", CONNECTED_ENDPOINT)
            .with_status(200)
            .with_body(r#"{"data": [{"vin": "YV1A"}, {"vin": "YV1B"}]}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        assert_eq!(api.get_vehicles().await.unwrap(), vec!["YV1A", "YV1B"]);
    }

    #[tokio::test]
    async fn test_get_vehicle_details() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/{}", CONNECTED_ENDPOINT, VIN).as_str())
            .with_status(200)
            .with_body(format!(
                r#"{{"data": {{"vin": "{}", "modelYear": 2023, "fuelType": "PETROL/ELECTRIC"}}}}"#,
                VIN
            ))
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let vehicle = api.get_vehicle_details(None).await.unwrap().unwrap();
        assert_eq!(vehicle.vin, VIN);
        assert_eq!(vehicle.fuel_type.as_deref(), Some("PETROL/ELECTRIC"));
    }

    #[tokio::test]
    async fn test_get_commands() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", path("commands").as_str())
            .with_status(200)
            .with_body(
                r#"{"data": [{"command": "LOCK", "href": "/lock"}, {"command": "HONK"}, {"bogus": 1}]}"#,
            )
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let commands = api.get_commands(None).await.unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command, "LOCK");
        assert!(commands[1].href.is_none());
    }

    #[tokio::test]
    async fn test_get_energy_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/{}/state", ENERGY_V2_ENDPOINT, VIN).as_str())
            .with_status(200)
            .with_body(
                r#"{
                    "batteryChargeLevel": {"status": "OK", "value": 53, "unit": "percentage", "updatedAt": "2025-07-02T08:51:23Z"},
                    "chargingPower": {"status": "ERROR", "code": "NOT_SUPPORTED", "message": "Not supported"}
                }"#,
            )
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let state = api.get_energy_state(None).await.unwrap();
        assert!(state["batteryChargeLevel"].is_ok());
        assert!(!state["chargingPower"].is_ok());
    }

    #[tokio::test]
    async fn test_get_energy_capabilities() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/{}/capabilities", ENERGY_V2_ENDPOINT, VIN).as_str())
            .with_status(200)
            .with_body(r#"{"getEnergyState": {"isSupported": true}}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let capabilities = api.get_energy_capabilities(None).await.unwrap();
        assert_eq!(capabilities["isSupported"], true);
    }

    #[tokio::test]
    async fn test_get_location() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/{}/location", LOCATION_ENDPOINT, VIN).as_str())
            .with_status(200)
            .with_body(
                r#"{"data": {"type": "Feature", "properties": {"heading": "90"}, "geometry": {"type": "Point", "coordinates": [11.9, 57.7, 0.0]}}}"#,
            )
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let location = api.get_location(None).await.unwrap().unwrap();
        assert_eq!(location.latitude(), Some(57.7));
    }

    #[tokio::test]
    async fn test_execute_command() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", path("commands/lock").as_str())
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(format!(
                r#"{{"data": {{"vin": "{}", "invokeStatus": "COMPLETED", "message": ""}}}}"#,
                VIN
            ))
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let result = api.execute_command("lock", None, None).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(result.invoke_status, InvokeStatus::Completed);
    }

    #[tokio::test]
    async fn test_execute_command_with_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", path("commands/climatization-start").as_str())
            .match_body(Matcher::Json(json!({"targetTemperature": 21})))
            .with_status(200)
            .with_body(r#"{"data": {"invokeStatus": "DELIVERED"}}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let body = json!({"targetTemperature": 21});
        let result = api
            .execute_command("climatization-start", Some(&body), None)
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.invoke_status, InvokeStatus::Delivered);
    }

    #[tokio::test]
    async fn test_execute_command_unprocessable_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", path("commands/unlock").as_str())
            .with_status(422)
            .with_body(r#"{"error": {"message": "Unprocessable"}}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        let result = api.execute_command("unlock", None, None).await.unwrap().unwrap();

        assert_eq!(result.invoke_status, InvokeStatus::Unknown);
        assert_eq!(result.vin.as_deref(), Some(VIN));
    }

    #[tokio::test]
    async fn test_api_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/backend-status")
            .with_status(200)
            .with_body(r#"{"message": ""}"#)
            .create_async()
            .await;

        let api = api(&server, Arc::new(StaticToken("t")));
        assert_eq!(api.get_api_status().await, "OK");
    }

    #[tokio::test]
    async fn test_api_status_unreachable() {
        let server = mockito::Server::new_async().await;
        let api = api(&server, Arc::new(StaticToken("t")))
            .with_status_url("http://127.0.0.1:1/backend-status");
        assert_eq!(api.get_api_status().await, "Unknown");
    }
}
