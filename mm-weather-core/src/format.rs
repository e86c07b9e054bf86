//! Turning a provider JSON document into the message posted to the channel.

use serde_json::Value;
use thiserror::Error;

use crate::model::WeatherSnapshot;

const LOCATION_NAME: (&str, &str) = ("/location/name", "location.name");
const TEMPERATURE_C: (&str, &str) = ("/current/temp_c", "current.temp_c");
const CONDITION_TEXT: (&str, &str) = ("/current/condition/text", "current.condition.text");

/// How to treat a missing or mistyped field in the provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Substitute an empty string or zero.
    #[default]
    Lenient,
    /// Fail the request.
    Strict,
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("weather response is missing field `{0}`")]
    MissingField(&'static str),
}

pub fn extract_snapshot(doc: &Value, policy: FieldPolicy) -> Result<WeatherSnapshot, FormatError> {
    let name = doc.pointer(LOCATION_NAME.0).and_then(Value::as_str);
    let temp = doc.pointer(TEMPERATURE_C.0).and_then(Value::as_f64);
    let condition = doc.pointer(CONDITION_TEXT.0).and_then(Value::as_str);

    match policy {
        FieldPolicy::Lenient => Ok(WeatherSnapshot {
            location_name: name.unwrap_or_default().to_owned(),
            temperature_c: temp.unwrap_or_default(),
            condition: condition.unwrap_or_default().to_owned(),
        }),
        FieldPolicy::Strict => Ok(WeatherSnapshot {
            location_name: name
                .ok_or(FormatError::MissingField(LOCATION_NAME.1))?
                .to_owned(),
            temperature_c: temp.ok_or(FormatError::MissingField(TEMPERATURE_C.1))?,
            condition: condition
                .ok_or(FormatError::MissingField(CONDITION_TEXT.1))?
                .to_owned(),
        }),
    }
}

/// Renders e.g. `Current weather in Paris: 21.5°C - Sunny`.
pub fn render_message(snapshot: &WeatherSnapshot) -> String {
    format!(
        "Current weather in {}: {}\u{00b0}C - {}",
        snapshot.location_name, snapshot.temperature_c, snapshot.condition
    )
}
