// Vehicle, location and command models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Vehicle details from the connected-vehicle API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vin: String,
    #[serde(default)]
    pub model_year: Option<u32>,
    #[serde(default)]
    pub gearbox: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub external_colour: Option<String>,
    #[serde(default, rename = "batteryCapacityKWH")]
    pub battery_capacity_kwh: Option<f64>,
    #[serde(default)]
    pub images: VehicleImages,
    #[serde(default)]
    pub descriptions: VehicleDescriptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleImages {
    #[serde(default)]
    pub exterior_image_url: Option<String>,
    #[serde(default)]
    pub internal_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleDescriptions {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub upholstery: Option<String>,
    #[serde(default)]
    pub steering: Option<String>,
}

/// GeoJSON feature returned by the location API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: LocationProperties,
    pub geometry: LocationGeometry,
}

impl Location {
    /// Latitude, when the geometry is a point
    pub fn latitude(&self) -> Option<f64> {
        self.geometry.coordinates.get(1).copied()
    }

    pub fn longitude(&self) -> Option<f64> {
        self.geometry.coordinates.first().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationProperties {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Sent as a string or a number depending on the vehicle
    #[serde(default)]
    pub heading: Option<Value>,
}

/// GeoJSON point: `[longitude, latitude, altitude]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGeometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Command supported by a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableCommand {
    pub command: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// Outcome of a command invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    #[serde(default)]
    pub vin: Option<String>,
    pub invoke_status: InvokeStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Invoke status reported for a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvokeStatus {
    Completed,
    Delivered,
    Running,
    Rejected,
    Timeout,
    Failed,
    CarOffline,
    Unknown,
    #[serde(other)]
    Other,
}

/// Error body from the API: `{"error": {"message": ..., "description": ...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ErrorResult {
    /// "message description", or None when both are empty
    pub fn summary(&self) -> Option<String> {
        let summary = format!(
            "{} {}",
            self.message.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();

        (!summary.is_empty()).then_some(summary)
    }
}

/// Commands accepted by `POST .../commands/{command}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleCommand {
    ClimatizationStart,
    ClimatizationStop,
    EngineStart,
    EngineStop,
    Flash,
    Honk,
    HonkFlash,
    Lock,
    LockReducedGuard,
    Unlock,
}

impl VehicleCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCommand::ClimatizationStart => "climatization-start",
            VehicleCommand::ClimatizationStop => "climatization-stop",
            VehicleCommand::EngineStart => "engine-start",
            VehicleCommand::EngineStop => "engine-stop",
            VehicleCommand::Flash => "flash",
            VehicleCommand::Honk => "honk",
            VehicleCommand::HonkFlash => "honk-flash",
            VehicleCommand::Lock => "lock",
            VehicleCommand::LockReducedGuard => "lock-reduced-guard",
            VehicleCommand::Unlock => "unlock",
        }
    }

    /// Scope needed besides `openid`
    pub fn required_scope(&self) -> &'static str {
        match self {
            VehicleCommand::ClimatizationStart | VehicleCommand::ClimatizationStop => {
                "conve:climatization_start_stop"
            }
            VehicleCommand::EngineStart | VehicleCommand::EngineStop => "conve:engine_start_stop",
            VehicleCommand::Flash | VehicleCommand::Honk | VehicleCommand::HonkFlash => {
                "conve:honk_flash"
            }
            VehicleCommand::Lock | VehicleCommand::LockReducedGuard => "conve:lock",
            VehicleCommand::Unlock => "conve:unlock",
        }
    }
}

impl fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VehicleCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s.to_lowercase().replace('_', "-").as_str() {
            "climatization-start" => VehicleCommand::ClimatizationStart,
            "climatization-stop" => VehicleCommand::ClimatizationStop,
            "engine-start" => VehicleCommand::EngineStart,
            "engine-stop" => VehicleCommand::EngineStop,
            "flash" => VehicleCommand::Flash,
            "honk" => VehicleCommand::Honk,
            "honk-flash" => VehicleCommand::HonkFlash,
            "lock" => VehicleCommand::Lock,
            "lock-reduced-guard" => VehicleCommand::LockReducedGuard,
            "unlock" => VehicleCommand::Unlock,
            other => return Err(format!("unknown command: {}", other)),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_details() {
        let vehicle: Vehicle = serde_json::from_str(
            r#"{
                "vin": "YV1ABCDEFG1234567",
                "modelYear": 2024,
                "gearbox": "AUTOMATIC",
                "fuelType": "ELECTRIC",
                "externalColour": "Vapour Grey",
                "batteryCapacityKWH": 82.0,
                "images": {
                    "exteriorImageUrl": "https://cas.volvocars.com/image/exterior",
                    "internalImageUrl": "https://cas.volvocars.com/image/interior"
                },
                "descriptions": {"model": "EX30", "upholstery": "null", "steering": "LEFT"}
            }"#,
        )
        .unwrap();

        assert_eq!(vehicle.model_year, Some(2024));
        assert_eq!(vehicle.battery_capacity_kwh, Some(82.0));
        assert_eq!(vehicle.descriptions.model.as_deref(), Some("EX30"));
    }

    #[test]
    fn test_vehicle_minimal() {
        let vehicle: Vehicle = serde_json::from_str(r#"{"vin": "YV1"}"#).unwrap();
        assert!(vehicle.images.exterior_image_url.is_none());
    }

    #[test]
    fn test_location() {
        let location: Location = serde_json::from_str(
            r#"{
                "type": "Feature",
                "properties": {"timestamp": "2024-12-30T15:00:00Z", "heading": "90"},
                "geometry": {"type": "Point", "coordinates": [11.97, 57.70, 0.0]}
            }"#,
        )
        .unwrap();

        assert_eq!(location.latitude(), Some(57.70));
        assert_eq!(location.longitude(), Some(11.97));
        assert_eq!(location.properties.heading, Some(Value::from("90")));
    }

    #[test]
    fn test_command_result_unknown_status() {
        let result: CommandResult =
            serde_json::from_str(r#"{"vin": "YV1", "invokeStatus": "SOMETHING_NEW"}"#).unwrap();
        assert_eq!(result.invoke_status, InvokeStatus::Other);

        let result: CommandResult =
            serde_json::from_str(r#"{"invokeStatus": "CAR_OFFLINE", "message": ""}"#).unwrap();
        assert_eq!(result.invoke_status, InvokeStatus::CarOffline);
    }

    #[test]
    fn test_error_result_summary() {
        let error = ErrorResult {
            message: Some("Bad request".to_string()),
            description: Some("Invalid VIN".to_string()),
        };
        assert_eq!(error.summary().as_deref(), Some("Bad request Invalid VIN"));
        assert_eq!(ErrorResult::default().summary(), None);
    }

    #[test]
    fn test_vehicle_command_parse() {
        assert_eq!("lock".parse::<VehicleCommand>(), Ok(VehicleCommand::Lock));
        assert_eq!(
            "HONK_FLASH".parse::<VehicleCommand>(),
            Ok(VehicleCommand::HonkFlash)
        );
        assert!("self-destruct".parse::<VehicleCommand>().is_err());
        assert_eq!(VehicleCommand::EngineStart.to_string(), "engine-start");
        assert_eq!(VehicleCommand::Unlock.required_scope(), "conve:unlock");
    }
}
