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

use crate::config::{ApiKey, Config, ConfigError};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::error;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, Span};

/// Failure to complete an HTTP exchange with the upstream API.
///
/// Timeouts are kept separate from other failures since they're reported to callers
/// with a different status code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            // The request URL includes the API key as a query parameter, don't leak it
            Self::Network(error_chain(&e.without_url()))
        }
    }
}

/// Join an error and all of its sources into a single message.
fn error_chain(e: &dyn error::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }

    out
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidLocation {
    #[error("city_name must not be empty unless both lat and lon are provided")]
    Missing,
    #[error("lat must be between -90 and 90, got {0}")]
    Latitude(f64),
    #[error("lon must be between -180 and 180, got {0}")]
    Longitude(f64),
}

/// Location to fetch the current weather for.
///
/// When both `lat` and `lon` are present they're used instead of `city_name`. A coordinate
/// of `0.0` is a real location and counts as present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationInput {
    pub city_name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl LocationInput {
    pub fn city<S: Into<String>>(city_name: S) -> Self {
        LocationInput {
            city_name: city_name.into(),
            lat: None,
            lon: None,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidLocation> {
        match self.query() {
            Query::City(c) if c.trim().is_empty() => Err(InvalidLocation::Missing),
            Query::City(_) => Ok(()),
            Query::Coordinates { lat, .. } if !(-90.0..=90.0).contains(&lat) => Err(InvalidLocation::Latitude(lat)),
            Query::Coordinates { lon, .. } if !(-180.0..=180.0).contains(&lon) => Err(InvalidLocation::Longitude(lon)),
            Query::Coordinates { .. } => Ok(()),
        }
    }

    pub fn query(&self) -> Query<'_> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Query::Coordinates { lat, lon },
            _ => Query::City(&self.city_name),
        }
    }
}

/// How a location is identified to the upstream API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Query<'a> {
    City(&'a str),
    Coordinates { lat: f64, lon: f64 },
}

impl Query<'_> {
    /// Query string parameters identifying this location (excluding the API key and units).
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::City(c) => vec![("q", c.to_string())],
            Self::Coordinates { lat, lon } => vec![("lat", lat.to_string()), ("lon", lon.to_string())],
        }
    }
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City(c) => write!(f, "{}", c),
            Self::Coordinates { lat, lon } => write!(f, "lat={}, lon={}", lat, lon),
        }
    }
}

/// Client for the OpenWeatherMap current weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    endpoint: Url,
    api_key: ApiKey,
    timeout: Duration,
}

impl OpenWeatherClient {
    const USER_AGENT: &'static str = concat!("weather_gateway/", env!("CARGO_PKG_VERSION"));
    const JSON_RESPONSE: &'static str = "application/json";
    const UNITS: &'static str = "metric";

    pub fn new(client: Client, config: &Config) -> Result<Self, ConfigError> {
        let mut endpoint = config.api_url().clone();
        {
            endpoint
                .path_segments_mut()
                .map(|mut p| {
                    p.pop_if_empty().extend(["data", "2.5", "weather"]);
                })
                .map_err(|_| ConfigError::InvalidApiUrl(config.api_url().clone()))?;
        }

        Ok(OpenWeatherClient {
            client,
            endpoint,
            api_key: config.api_key().clone(),
            timeout: config.timeout(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch the current weather for a location, returning the decoded JSON body as-is.
    ///
    /// The body is returned even when the upstream API responds with an error status as
    /// long as it's valid JSON, since error details are reported in the body.
    pub async fn fetch(&self, location: &LocationInput) -> Result<Value, TransportError> {
        let query = location.query();
        let span = tracing::info_span!(
            "weather_api_request",
            otel.kind = "client",
            location = %query,
            http.status_code = tracing::field::Empty,
        );

        self.make_request(query).instrument(span).await
    }

    async fn make_request(&self, query: Query<'_>) -> Result<Value, TransportError> {
        tracing::info!(message = "fetching weather", location = %query);

        let res = self
            .client
            .get(self.endpoint.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .query(&query.params())
            .query(&[("appid", self.api_key.expose()), ("units", Self::UNITS)])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = res.status();
        Span::current().record("http.status_code", status.as_u16());

        let body = res.bytes().await?;
        match serde_json::from_slice::<Value>(&body) {
            Ok(v) if status.is_success() => Ok(v),
            // Error bodies from the API itself carry a `cod` and message for the caller
            Ok(v) if v.get("cod").is_some() => Ok(v),
            Err(e) if status.is_success() => Err(TransportError::Network(format!("invalid JSON body: {}", e))),
            _ => Err(TransportError::Network(format!("unexpected status {}", status))),
        }
    }
}
