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

use crate::client::{InvalidLocation, LocationInput, OpenWeatherClient, TransportError};
use crate::normalize::{normalize, NormalizedWeather, ValidationError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const HEALTH_STATUS: &str = "Ok";
const HEALTH_MESSAGE: &str = "Weather API is running smoothly!";

/// Shared state for all requests.
#[derive(Debug)]
pub struct RequestContext {
    client: OpenWeatherClient,
}

impl RequestContext {
    pub fn new(client: OpenWeatherClient) -> Self {
        Self { client }
    }
}

/// Build the router for all endpoints, with CORS and request tracing applied.
pub fn router(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route("/weather", get(weather_by_query).post(weather_by_body))
        .route("/health", get(health))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

/// Every way a weather request can fail, along with the status it's reported as.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Location(#[from] InvalidLocation),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::Location(_) => StatusCode::BAD_REQUEST,
            Self::Transport(TransportError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Transport(TransportError::Network(_)) => StatusCode::BAD_REQUEST,
            Self::Validation(ValidationError::NotAnObject) => StatusCode::BAD_GATEWAY,
            Self::Validation(ValidationError::ProviderError(_)) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Transport(TransportError::Timeout) => "Weather API request timed out".to_owned(),
            Self::Transport(TransportError::Network(e)) => format!("Weather API request failed: {}", e),
            Self::Validation(ValidationError::NotAnObject) => "Invalid response from weather API".to_owned(),
            _ => self.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::InvalidInput(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::InvalidInput(e.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if matches!(self, Self::Transport(_) | Self::Validation(_)) {
            tracing::error!(message = "weather request failed", status = %status, error = %detail);
        } else {
            tracing::warn!(message = "invalid weather request", status = %status, error = %detail);
        }

        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CityQuery {
    city_name: String,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    message: &'static str,
}

async fn weather_by_body(
    State(context): State<Arc<RequestContext>>,
    body: Result<Json<LocationInput>, JsonRejection>,
) -> Result<Json<NormalizedWeather>, ApiError> {
    let Json(location) = body?;
    current_weather(&context, location).await.map(Json)
}

async fn weather_by_query(
    State(context): State<Arc<RequestContext>>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<NormalizedWeather>, ApiError> {
    let Query(q) = query?;
    current_weather(&context, LocationInput::city(q.city_name)).await.map(Json)
}

async fn current_weather(context: &RequestContext, location: LocationInput) -> Result<NormalizedWeather, ApiError> {
    location.validate()?;
    let raw = context.client.fetch(&location).await?;
    Ok(normalize(&raw)?)
}

async fn health() -> Json<HealthStatus> {
    tracing::debug!("health check");
    Json(HealthStatus {
        status: HEALTH_STATUS,
        message: HEALTH_MESSAGE,
    })
}
