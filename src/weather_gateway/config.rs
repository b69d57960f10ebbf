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

use reqwest::Url;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an OpenWeatherMap API key is required")]
    MissingApiKey,
    #[error("API URL {0} cannot be used as a base URL")]
    InvalidApiUrl(Url),
}

/// Credential sent to the upstream API as the `appid` query parameter.
///
/// The key is redacted when formatted with `Debug` so that it doesn't end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(key: S) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            Err(ConfigError::MissingApiKey)
        } else {
            Ok(ApiKey(key))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Settings for talking to the upstream weather API, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    api_key: ApiKey,
    api_url: Url,
    timeout: Duration,
}

impl Config {
    pub fn new<S: Into<String>>(api_key: S, api_url: Url, timeout: Duration) -> Result<Self, ConfigError> {
        let api_key = ApiKey::new(api_key)?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        Ok(Config {
            api_key,
            api_url,
            timeout,
        })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod test {
    use super::{ApiKey, Config, ConfigError, DEFAULT_API_URL, DEFAULT_TIMEOUT};
    use reqwest::Url;

    #[test]
    fn test_api_key_empty() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::MissingApiKey)));
        assert!(matches!(ApiKey::new("  \t"), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("s3cr3t").unwrap();
        let formatted = format!("{:?}", key);

        assert!(!formatted.contains("s3cr3t"));
        assert_eq!("s3cr3t", key.expose());
    }

    #[test]
    fn test_config_valid() {
        let url = Url::parse(DEFAULT_API_URL).unwrap();
        let cfg = Config::new("abc123", url.clone(), DEFAULT_TIMEOUT).unwrap();

        assert_eq!("abc123", cfg.api_key().expose());
        assert_eq!(&url, cfg.api_url());
        assert_eq!(DEFAULT_TIMEOUT, cfg.timeout());
        assert!(!format!("{:?}", cfg).contains("abc123"));
    }

    #[test]
    fn test_config_missing_key() {
        let url = Url::parse(DEFAULT_API_URL).unwrap();
        assert!(matches!(
            Config::new("", url, DEFAULT_TIMEOUT),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_config_invalid_url() {
        let url = Url::parse("mailto:weather@example.com").unwrap();
        assert!(matches!(
            Config::new("abc123", url, DEFAULT_TIMEOUT),
            Err(ConfigError::InvalidApiUrl(_))
        ));
    }
}
