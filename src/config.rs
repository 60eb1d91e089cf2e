use crate::credential::Credential;
use crate::error::{ProxyError, Result};
use crate::route::{RelayMode, Route};
use axum::http::Uri;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_KEY_VAR: &str = "KAKAO_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Per-route relay mode overrides, keyed by route name.
    #[serde(default)]
    pub routes: BTreeMap<Route, RelayMode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub api_key: Credential,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Emit `event: error` frames from the event-stream relay instead of
    /// an empty body when the upstream call fails.
    #[serde(default)]
    pub stream_error_events: bool,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: Credential::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            stream_error_events: false,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProxyError::ConfigError(format!("{} not set", API_KEY_VAR)))?;

        let listen_addr = lookup("PROXY_LISTEN_ADDR").unwrap_or_else(default_listen_addr);
        let base_url = lookup("KAKAO_API_BASE_URL").unwrap_or_else(default_base_url);

        let timeout_secs = match lookup("PROXY_UPSTREAM_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|e| {
                ProxyError::ConfigError(format!("Invalid upstream timeout value: {}", e))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let stream_error_events = match lookup("PROXY_STREAM_ERROR_EVENTS") {
            Some(v) => v.parse::<bool>().map_err(|e| {
                ProxyError::ConfigError(format!("Invalid stream error events flag: {}", e))
            })?,
            None => false,
        };

        Ok(ProxyConfig {
            server: ServerConfig { listen_addr },
            upstream: UpstreamConfig {
                api_key: Credential::new(api_key),
                base_url,
                timeout_secs,
                stream_error_events,
            },
            routes: BTreeMap::new(),
        })
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| ProxyError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config: ProxyConfig = toml::from_str(&contents)
            .map_err(|e| ProxyError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        // The key is expected to come from the environment in deployments
        if let Ok(api_key) = env::var(API_KEY_VAR)
            && !api_key.trim().is_empty()
        {
            config.upstream.api_key = Credential::new(api_key);
        }

        Ok(config)
    }

    /// Relay mode for a route, honouring `[routes]` overrides.
    pub fn mode_for(&self, route: Route) -> RelayMode {
        self.routes
            .get(&route)
            .copied()
            .unwrap_or_else(|| route.default_mode())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.upstream.api_key.is_empty() {
            return Err(ProxyError::ConfigError(format!("{} is empty", API_KEY_VAR)));
        }
        self.upstream.api_key.authorization_header()?;

        let base: Uri = self.upstream.base_url.parse().map_err(|e| {
            ProxyError::ConfigError(format!(
                "Invalid upstream base URL '{}': {}",
                self.upstream.base_url, e
            ))
        })?;
        if base.authority().is_none() || !matches!(base.scheme_str(), Some("http" | "https")) {
            return Err(ProxyError::ConfigError(format!(
                "Upstream base URL must be an absolute http or https URL, got '{}'",
                self.upstream.base_url
            )));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ProxyError::ConfigError(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        if self.server.listen_addr.is_empty() {
            return Err(ProxyError::ConfigError(
                "Listen address is empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_fails() {
        let result = ProxyConfig::from_lookup(lookup_from(&[]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("KAKAO_API_KEY not set"));

        let result = ProxyConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_defaults() {
        let config = ProxyConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "key")])).unwrap();
        assert_eq!(config.server.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upstream.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.upstream.stream_error_events);
        assert_eq!(
            config.upstream.api_key.authorization_header().unwrap(),
            "KakaoAK key"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = ProxyConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "key"),
            ("PROXY_LISTEN_ADDR", "127.0.0.1:9000"),
            ("KAKAO_API_BASE_URL", "http://127.0.0.1:4000"),
            ("PROXY_UPSTREAM_TIMEOUT_SECS", "5"),
            ("PROXY_STREAM_ERROR_EVENTS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.upstream.base_url, "http://127.0.0.1:4000");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert!(config.upstream.stream_error_events);
    }

    #[test]
    fn test_invalid_numeric_env() {
        let result = ProxyConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "key"),
            ("PROXY_UPSTREAM_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ProxyConfig::default();
        assert!(config.validate().is_err());

        config.upstream.api_key = Credential::new("key");
        assert!(config.validate().is_ok());

        config.upstream.base_url = "ftp://dapi.kakao.com".to_string();
        assert!(config.validate().is_err());

        config.upstream.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.upstream.base_url = DEFAULT_BASE_URL.to_string();
        config.upstream.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_with_route_overrides() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "127.0.0.1:8081"

            [upstream]
            api_key = "file-key"
            timeout_secs = 10

            [routes]
            address = "streamed"
            category = "buffered"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_addr, "127.0.0.1:8081");
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.upstream.timeout_secs, 10);
        assert_eq!(config.mode_for(Route::Address), RelayMode::Streamed);
        assert_eq!(config.mode_for(Route::Category), RelayMode::Buffered);
        assert_eq!(config.mode_for(Route::Keyword), RelayMode::Buffered);
    }

    #[test]
    fn test_unknown_route_rejected() {
        let result: std::result::Result<ProxyConfig, _> = toml::from_str(
            r#"
            [routes]
            directions = "buffered"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_modes_without_overrides() {
        let config = ProxyConfig::default();
        assert_eq!(config.mode_for(Route::Category), RelayMode::Streamed);
        assert_eq!(config.mode_for(Route::Address), RelayMode::Buffered);
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let config =
            ProxyConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "very-secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
