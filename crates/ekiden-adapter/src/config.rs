/*
[INPUT]:  Environment presets or caller-supplied settings (any serde format)
[OUTPUT]: Validated endpoint URLs, timeouts and WebSocket tuning
[POS]:    Configuration layer - shared by HTTP and WebSocket clients
[UPDATE]: When adding endpoints or connection tuning knobs
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{EkidenError, Result};

const TESTNET_BASE_URL: &str = "https://api.staging.ekiden.fi";
const TESTNET_WS_URL: &str = "wss://api.staging.ekiden.fi/ws/public";
const TESTNET_PRIVATE_WS_URL: &str = "wss://api.staging.ekiden.fi/ws/private";
const MAINNET_BASE_URL: &str = "https://api.ekiden.fi";
const MAINNET_WS_URL: &str = "wss://api.ekiden.fi/ws/public";
const MAINNET_PRIVATE_WS_URL: &str = "wss://api.ekiden.fi/ws/private";
const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Interval between heartbeat pings on an authenticated stream
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

/// Client configuration for gateway endpoints and connection behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default)]
    pub private_ws_url: Option<String>,
    #[serde(rename = "timeout_ms", with = "duration_ms", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(
        rename = "connect_timeout_ms",
        with = "duration_ms",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Duration,
    #[serde(
        rename = "heartbeat_interval_ms",
        with = "duration_ms",
        default = "default_heartbeat_interval"
    )]
    pub heartbeat_interval: Duration,
    /// Delay the bundled WebSocket transport waits before reopening a dropped socket
    #[serde(
        rename = "reconnect_delay_ms",
        with = "duration_ms",
        default = "default_reconnect_delay"
    )]
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    pub fn testnet() -> Self {
        Self::with_urls(
            TESTNET_BASE_URL,
            Some(TESTNET_WS_URL),
            Some(TESTNET_PRIVATE_WS_URL),
        )
    }

    pub fn mainnet() -> Self {
        Self::with_urls(
            MAINNET_BASE_URL,
            Some(MAINNET_WS_URL),
            Some(MAINNET_PRIVATE_WS_URL),
        )
    }

    /// Build a config pointing at custom endpoints, keeping default tuning
    pub fn with_urls(base_url: &str, ws_url: Option<&str>, private_ws_url: Option<&str>) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_prefix: default_api_prefix(),
            ws_url: ws_url.map(str::to_string),
            private_ws_url: private_ws_url.map(str::to_string),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            heartbeat_interval: default_heartbeat_interval(),
            reconnect_delay: default_reconnect_delay(),
        }
    }

    /// Check that every configured URL parses and the base URL is present
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(EkidenError::Configuration(
                "base URL is not configured".to_string(),
            ));
        }
        parse_url("base_url", &self.base_url)?;
        if let Some(url) = &self.ws_url {
            parse_url("ws_url", url)?;
        }
        if let Some(url) = &self.private_ws_url {
            parse_url("private_ws_url", url)?;
        }
        if self.heartbeat_interval.is_zero() {
            return Err(EkidenError::Configuration(
                "heartbeat interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Public stream URL, or a configuration error when absent
    pub fn require_ws_url(&self) -> Result<&str> {
        self.ws_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                EkidenError::Configuration("WebSocket URL is not configured".to_string())
            })
    }

    /// Private stream URL, or a configuration error when absent
    pub fn require_private_ws_url(&self) -> Result<&str> {
        self.private_ws_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                EkidenError::Configuration("Private WebSocket URL is not configured".to_string())
            })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| EkidenError::Configuration(format!("{field} is not a valid URL: {e}")))
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_heartbeat_interval() -> Duration {
    DEFAULT_HEARTBEAT_INTERVAL
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(1)
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(ClientConfig::testnet().validate().is_ok());
        assert!(ClientConfig::mainnet().validate().is_ok());
        assert_eq!(ClientConfig::default(), ClientConfig::testnet());
    }

    #[test]
    fn test_missing_ws_url_is_configuration_error() {
        let config = ClientConfig::with_urls("https://example.com", None, None);
        let err = config.require_ws_url().unwrap_err();
        assert!(matches!(err, EkidenError::Configuration(_)));
        let err = config.require_private_ws_url().unwrap_err();
        assert!(matches!(err, EkidenError::Configuration(_)));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = ClientConfig::with_urls("", None, None);
        assert!(matches!(
            config.validate(),
            Err(EkidenError::Configuration(_))
        ));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let raw = r#"{
            "base_url": "http://localhost:8080",
            "private_ws_url": "ws://localhost:8080/ws/private",
            "heartbeat_interval_ms": 5000
        }"#;
        let config: ClientConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.ws_url, None);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }
}
