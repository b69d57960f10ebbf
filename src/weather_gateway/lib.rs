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

//! HTTP gateway for the OpenWeatherMap current weather API
//!
//! ## Features
//!
//! `weather_gateway` accepts requests for the current weather at a city or a latitude/longitude
//! pair, forwards them to the [OpenWeatherMap] current weather API, and returns a simplified
//! version of the response. Any field missing from the upstream response is returned as `null`.
//!
//! ```json
//! {
//!   "city": "Paris",
//!   "country": "FR",
//!   "temperature": 15.2,
//!   "feels_like": 14.8,
//!   "humidity": 70,
//!   "wind_speed": 3.1,
//!   "weather": "clear sky",
//!   "icon": "01d",
//!   "coordinates": {"lon": 2.35, "lat": 48.85},
//!   "timestamp": 1700000000
//! }
//! ```
//!
//! The following endpoints are exposed.
//!
//! * `POST /weather` - JSON body of the form `{"city_name": "Paris"}` or
//!   `{"city_name": "", "lat": 48.85, "lon": 2.35}`. Coordinates win when both are given.
//! * `GET /weather?city_name=Paris` - Same as above, by city name only.
//! * `GET /health` - Liveness check, never contacts the upstream API.
//!
//! Failures are returned as `{"detail": "..."}` with one of the following statuses.
//!
//! * `400` - Invalid input, a network failure talking to the upstream API, or an error
//!   reported by the upstream API (e.g. an unknown city).
//! * `502` - The upstream API returned something that isn't a JSON object.
//! * `504` - The upstream API didn't respond before the timeout.
//!
//! [OpenWeatherMap]: https://openweathermap.org/current
//!
//! ## Build
//!
//! `weather_gateway` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! An OpenWeatherMap API key is required. It can be passed with `--api-key`, the
//! `OPENWEATHER_API_KEY` environment variable, or a `.env` file in the working directory.
//! The gateway refuses to start without one.
//!
//! ```text
//! OPENWEATHER_API_KEY=abc123 ./weather_gateway --bind 127.0.0.1:8000
//! curl -sS 'http://127.0.0.1:8000/weather?city_name=Paris' | jq
//! ```
//!
//! ### Tracing
//!
//! Spans for incoming requests and upstream API calls can be exported to an OpenTelemetry
//! collector over OTLP/gRPC by passing `--otlp-export`. The collector address is taken from
//! `--otlp-endpoint` or `OTEL_EXPORTER_OTLP_ENDPOINT` and defaults to `http://localhost:4317`.
//!
//! ```text
//! ./weather_gateway --otlp-export --otlp-endpoint http://collector:4317
//! ```
//!

pub mod client;
pub mod config;
pub mod http;
pub mod normalize;
pub mod telemetry;
