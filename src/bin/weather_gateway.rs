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

use clap::Parser;
use reqwest::{Client, Url};
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;
use weather_gateway::client::OpenWeatherClient;
use weather_gateway::config::{Config, DEFAULT_API_URL};
use weather_gateway::http::RequestContext;
use weather_gateway::telemetry::{self, OtlpConfig, DEFAULT_OTLP_ENDPOINT};

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);
const DEFAULT_TIMEOUT_MILLIS: u64 = 10_000;

#[derive(Debug, Parser)]
#[clap(name = "weather_gateway", version = clap::crate_version!())]
struct WeatherGatewayApplication {
    /// API key for OpenWeatherMap. Required.
    #[clap(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL for the OpenWeatherMap API
    #[clap(long, env = "OPENWEATHER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: Url,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, env = "WEATHER_GATEWAY_LOG_LEVEL", default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Timeout for requests to the OpenWeatherMap API, in milliseconds.
    #[clap(long, env = "WEATHER_GATEWAY_TIMEOUT_MILLIS", default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Address to bind to.
    #[clap(long, env = "WEATHER_GATEWAY_BIND", default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,

    /// Export spans to an OpenTelemetry collector over OTLP/gRPC
    #[clap(long, env = "WEATHER_GATEWAY_OTLP_EXPORT")]
    otlp_export: bool,

    /// OpenTelemetry collector address to export spans to when `--otlp-export` is set
    #[clap(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT", default_value_t = DEFAULT_OTLP_ENDPOINT.into())]
    otlp_endpoint: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Variables already set in the environment take precedence over the .env file
    let _ = dotenv::dotenv();

    let opts = WeatherGatewayApplication::parse();
    let otlp = opts.otlp_export.then(|| OtlpConfig {
        endpoint: opts.otlp_endpoint.clone(),
    });

    let guard = telemetry::init(opts.log_level, otlp.as_ref()).unwrap_or_else(|e| {
        eprintln!("weather_gateway: {}", e);
        process::exit(1)
    });

    let timeout = Duration::from_millis(opts.timeout_millis);
    let config = Config::new(opts.api_key, opts.api_url, timeout).unwrap_or_else(|e| {
        tracing::error!(message = "invalid configuration", error = %e);
        process::exit(1)
    });

    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = OpenWeatherClient::new(http_client, &config).unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize weather API client", error = %e);
        process::exit(1)
    });

    let context = Arc::new(RequestContext::new(client));
    let server = axum::Server::try_bind(&opts.bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
            process::exit(1)
        })
        .serve(weather_gateway::http::router(context).into_make_service());

    tracing::info!(
        message = "server started",
        address = %server.local_addr(),
        api_url = %config.api_url(),
        otlp_export = guard.is_exporting(),
    );

    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
