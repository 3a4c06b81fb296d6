// OAuth scopes understood by the Volvo Cars API

use std::fmt;

/// Privacy and security related scopes, not requested by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestrictedScope {
    Lock,
    Unlock,
    EngineStartStop,
    HonkFlash,
    Location,
}

impl RestrictedScope {
    pub const ALL: [RestrictedScope; 5] = [
        RestrictedScope::Lock,
        RestrictedScope::Unlock,
        RestrictedScope::EngineStartStop,
        RestrictedScope::HonkFlash,
        RestrictedScope::Location,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RestrictedScope::Lock => "conve:lock",
            RestrictedScope::Unlock => "conve:unlock",
            RestrictedScope::EngineStartStop => "conve:engine_start_stop",
            RestrictedScope::HonkFlash => "conve:honk_flash",
            RestrictedScope::Location => "location:read",
        }
    }
}

impl fmt::Display for RestrictedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scopes needed for the read-only telemetry endpoints
pub const DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "conve:battery_charge_level",
    "conve:brake_status",
    "conve:climatization_start_stop",
    "conve:command_accessibility",
    "conve:commands",
    "conve:diagnostics_engine_status",
    "conve:diagnostics_workshop",
    "conve:doors_status",
    "conve:engine_status",
    "conve:fuel_status",
    "conve:lock_status",
    "conve:odometer_status",
    "conve:trip_statistics",
    "conve:tyre_status",
    "conve:vehicle_relation",
    "conve:warnings",
    "conve:windows_status",
    "energy:capability:read",
    "energy:state:read",
];

/// Energy v1 scopes, superseded by `energy:state:read`
pub const DEPRECATED_SCOPES: &[&str] = &[
    "energy:battery_charge_level",
    "energy:charging_connection_status",
    "energy:charging_current_limit",
    "energy:charging_system_status",
    "energy:electric_range",
    "energy:estimated_charging_time",
    "energy:recharge_status",
    "energy:target_battery_level",
];

/// Default scopes as owned strings
pub fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

/// Default scopes plus every restricted scope
pub fn all_scopes() -> Vec<String> {
    let mut scopes = default_scopes();
    scopes.extend(RestrictedScope::ALL.iter().map(|s| s.as_str().to_string()));
    scopes
}
