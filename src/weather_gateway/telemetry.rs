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

use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

pub const SERVICE_NAME: &str = "weather_gateway";
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

const SERVICE_NAME_KEY: &str = "service.name";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("unable to create OTLP span exporter: {0}")]
    Exporter(#[from] TraceError),
    #[error("unable to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Where to send spans when OTLP export is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtlpConfig {
    pub endpoint: String,
}

/// Flushes any buffered spans and stops the exporter when dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(message = "failed to flush spans to OTLP collector", error = %e);
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// Log output is always written to stdout. When `otlp` is given, spans are additionally
/// exported to an OpenTelemetry collector using a batch exporter tagged with [`SERVICE_NAME`].
/// Must be called from within a tokio runtime.
pub fn init(level: Level, otlp: Option<&OtlpConfig>) -> Result<TelemetryGuard, TelemetryError> {
    let provider = otlp.map(tracer_provider).transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()?;

    if let Some(p) = provider.as_ref() {
        opentelemetry::global::set_tracer_provider(p.clone());
    }

    Ok(TelemetryGuard { provider })
}

fn tracer_provider(cfg: &OtlpConfig) -> Result<TracerProvider, TraceError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(cfg.endpoint.clone())
        .build()?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource())
        .build())
}

fn resource() -> Resource {
    Resource::new(vec![KeyValue::new(SERVICE_NAME_KEY, SERVICE_NAME)])
}
