// weather_gateway - HTTP gateway for the OpenWeatherMap current weather API
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const UNKNOWN_ERROR: &str = "Unknown error from weather API";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("{0}")]
    ProviderError(String),
}

/// Simplified view of the upstream current weather response.
///
/// Every field is `None` when the corresponding part of the upstream response is missing
/// or has an unexpected type.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NormalizedWeather {
    pub city: Option<String>,
    pub country: Option<String>,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub weather: Option<String>,
    pub icon: Option<String>,
    pub coordinates: Option<Value>,
    pub timestamp: Option<i64>,
}

/// Convert a raw upstream payload into a `NormalizedWeather`.
///
/// Fails if the payload isn't an object or if it reports a `cod` other than 200. Otherwise
/// this never fails, missing fields are simply `None`.
pub fn normalize(raw: &Value) -> Result<NormalizedWeather, ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;

    if let Some(cod) = obj.get("cod") {
        if !is_ok_code(cod) {
            return Err(ValidationError::ProviderError(provider_message(raw)));
        }
    }

    let main = raw.get("main");
    let condition = raw.get("weather").and_then(Value::as_array).and_then(|w| w.first());

    Ok(NormalizedWeather {
        city: string_at(Some(raw), "name"),
        country: string_at(raw.get("sys"), "country"),
        temperature: float_at(main, "temp"),
        feels_like: float_at(main, "feels_like"),
        humidity: int_at(main, "humidity"),
        wind_speed: float_at(raw.get("wind"), "speed"),
        weather: string_at(condition, "description"),
        icon: string_at(condition, "icon"),
        coordinates: raw.get("coord").filter(|c| !c.is_null()).cloned(),
        timestamp: int_at(Some(raw), "dt"),
    })
}

// The API reports success as the number 200 and errors as strings like "404"
fn is_ok_code(cod: &Value) -> bool {
    match cod {
        Value::Number(n) => n.as_f64() == Some(200.0),
        Value::String(s) => s == "200",
        _ => false,
    }
}

fn provider_message(raw: &Value) -> String {
    match raw.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_ERROR.to_owned(),
        Some(other) => other.to_string(),
    }
}

fn string_at(parent: Option<&Value>, key: &str) -> Option<String> {
    parent?.get(key)?.as_str().map(str::to_owned)
}

fn float_at(parent: Option<&Value>, key: &str) -> Option<f64> {
    parent?.get(key)?.as_f64()
}

fn int_at(parent: Option<&Value>, key: &str) -> Option<i64> {
    let v = parent?.get(key)?;
    v.as_i64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod test {
    use super::{normalize, NormalizedWeather, ValidationError};
    use serde_json::json;

    #[test]
    fn test_normalize_full_payload() {
        let raw = json!({
            "cod": 200,
            "name": "Paris",
            "sys": {"country": "FR"},
            "main": {"temp": 15.2, "feels_like": 14.8, "humidity": 70},
            "wind": {"speed": 3.1},
            "weather": [{"description": "clear sky", "icon": "01d"}],
            "coord": {"lon": 2.35, "lat": 48.85},
            "dt": 1700000000
        });

        let normalized = normalize(&raw).unwrap();
        assert_eq!(
            json!({
                "city": "Paris",
                "country": "FR",
                "temperature": 15.2,
                "feels_like": 14.8,
                "humidity": 70,
                "wind_speed": 3.1,
                "weather": "clear sky",
                "icon": "01d",
                "coordinates": {"lon": 2.35, "lat": 48.85},
                "timestamp": 1700000000
            }),
            serde_json::to_value(&normalized).unwrap()
        );
    }

    #[test]
    fn test_normalize_empty_object() {
        let normalized = normalize(&json!({})).unwrap();
        assert_eq!(NormalizedWeather::default(), normalized);

        let as_json = serde_json::to_value(&normalized).unwrap();
        let fields = as_json.as_object().unwrap();
        assert_eq!(10, fields.len());
        assert!(fields.values().all(|v| v.is_null()));
    }

    #[test]
    fn test_normalize_partial_and_mistyped() {
        let raw = json!({
            "cod": 200,
            "name": 42,
            "sys": null,
            "main": {"temp": "warm", "humidity": 55.0},
            "wind": [],
            "weather": [],
            "dt": 1700000000
        });

        let normalized = normalize(&raw).unwrap();
        assert_eq!(
            NormalizedWeather {
                humidity: Some(55),
                timestamp: Some(1700000000),
                ..Default::default()
            },
            normalized
        );
    }

    #[test]
    fn test_normalize_weather_first_entry_only() {
        let raw = json!({
            "weather": [
                {"description": "light rain"},
                {"description": "mist", "icon": "50d"}
            ]
        });

        let normalized = normalize(&raw).unwrap();
        assert_eq!(Some("light rain".to_owned()), normalized.weather);
        assert_eq!(None, normalized.icon);
    }

    #[test]
    fn test_normalize_not_an_object() {
        assert_eq!(Err(ValidationError::NotAnObject), normalize(&json!([1, 2, 3])));
        assert_eq!(Err(ValidationError::NotAnObject), normalize(&json!("ok")));
        assert_eq!(Err(ValidationError::NotAnObject), normalize(&json!(null)));
    }

    #[test]
    fn test_normalize_provider_error_message() {
        let raw = json!({"cod": "404", "message": "city not found", "name": "Paris"});
        assert_eq!(
            Err(ValidationError::ProviderError("city not found".to_owned())),
            normalize(&raw)
        );
    }

    #[test]
    fn test_normalize_provider_error_fallback() {
        assert_eq!(
            Err(ValidationError::ProviderError("Unknown error from weather API".to_owned())),
            normalize(&json!({"cod": 401}))
        );
        assert_eq!(
            Err(ValidationError::ProviderError("Unknown error from weather API".to_owned())),
            normalize(&json!({"cod": null}))
        );
    }

    #[test]
    fn test_normalize_success_code_as_string() {
        let normalized = normalize(&json!({"cod": "200", "name": "Oslo"})).unwrap();
        assert_eq!(Some("Oslo".to_owned()), normalized.city);

        let normalized = normalize(&json!({"cod": 200.0, "name": "Oslo"})).unwrap();
        assert_eq!(Some("Oslo".to_owned()), normalized.city);
    }

    #[test]
    fn test_normalize_integer_out_of_range() {
        let raw = json!({
            "dt": u64::MAX,
            "main": {"humidity": 1.0e300}
        });

        let normalized = normalize(&raw).unwrap();
        assert_eq!(None, normalized.timestamp);
        assert_eq!(None, normalized.humidity);
    }
}
