// Redaction helpers for debug logging

use serde_json::{Map, Value};

/// Placeholder written in place of sensitive values
pub const REDACTED: &str = "**REDACTED**";

/// Return a copy of `data` with the values of `to_redact` keys replaced, at any depth.
/// Null and empty string values are left as they are.
pub fn redact_data(data: &Value, to_redact: &[&str]) -> Value {
    match data {
        Value::Object(map) => {
            let redacted: Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), redact_entry(key, value, to_redact)))
                .collect();
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_data(item, to_redact))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn redact_entry(key: &str, value: &Value, to_redact: &[&str]) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) if s.is_empty() => value.clone(),
        _ if to_redact.contains(&key) => Value::String(REDACTED.to_string()),
        _ => redact_data(value, to_redact),
    }
}

/// Replace the VIN in a URL
pub fn redact_url(url: &str, vin: &str) -> String {
    if vin.is_empty() {
        url.to_string()
    } else {
        url.replace(vin, REDACTED)
    }
}
