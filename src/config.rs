//! Configuration management for Turnstile.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TurnstileError};
use crate::ratelimit::{LimiterSettings, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS};

/// Prefix for environment variable overrides, e.g.
/// `TURNSTILE__RATE_LIMITING__MAX_REQUESTS=5`.
pub const ENV_PREFIX: &str = "TURNSTILE";

/// Main configuration for the Turnstile service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Length of the counting window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum admitted requests per client per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,

    /// Seconds between sweeps of expired records. 0 disables sweeping.
    #[serde(default)]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
            sweep_interval_secs: 0,
        }
    }
}

fn default_window_ms() -> u64 {
    DEFAULT_WINDOW_MS
}

fn default_max_requests() -> u64 {
    DEFAULT_MAX_REQUESTS
}

impl RateLimitingConfig {
    /// Settings for the limiter.
    pub fn limiter_settings(&self) -> LimiterSettings {
        LimiterSettings {
            window_ms: self.window_ms,
            max_requests: self.max_requests,
        }
    }

    /// Sweep period, if sweeping is enabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TurnstileConfig {
    /// Load configuration from an optional YAML file layered under
    /// `TURNSTILE__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Yaml));
        }

        let config: TurnstileConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: TurnstileConfig = serde_yaml::from_str(yaml)
            .map_err(|e| TurnstileError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the limiter settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.window_ms == 0 {
            return Err(TurnstileError::Config(
                "rate_limiting.window_ms must be at least 1".to_string(),
            ));
        }
        if self.rate_limiting.max_requests == 0 {
            return Err(TurnstileError::Config(
                "rate_limiting.max_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TurnstileConfig::default();

        assert_eq!(config.server.http_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.rate_limiting.window_ms, 900_000);
        assert_eq!(config.rate_limiting.max_requests, 100);
        assert_eq!(config.rate_limiting.sweep_interval(), None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
rate_limiting:
  max_requests: 5
  sweep_interval_secs: 30
logging:
  format: json
"#;
        let config = TurnstileConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.rate_limiting.max_requests, 5);
        assert_eq!(config.rate_limiting.window_ms, 900_000);
        assert_eq!(
            config.rate_limiting.sweep_interval(),
            Some(Duration::from_secs(30))
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.http_addr, default_http_addr());
    }

    #[test]
    fn test_limiter_settings() {
        let yaml = r#"
rate_limiting:
  window_ms: 60000
  max_requests: 3
"#;
        let config = TurnstileConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.rate_limiting.limiter_settings(),
            LimiterSettings {
                window_ms: 60_000,
                max_requests: 3,
            }
        );
    }

    #[test]
    fn test_zero_limits_rejected() {
        let err = TurnstileConfig::from_yaml("rate_limiting:\n  max_requests: 0\n").unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));

        let err = TurnstileConfig::from_yaml("rate_limiting:\n  window_ms: 0\n").unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let err = TurnstileConfig::from_yaml("server:\n  http_addr: not-an-address\n").unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
    }

    #[test]
    fn test_load_file_with_env_override() {
        let path = std::env::temp_dir().join(format!("turnstile-config-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "server:\n  http_addr: 0.0.0.0:9000\nrate_limiting:\n  max_requests: 7\n  window_ms: 1000\n",
        )
        .unwrap();

        std::env::set_var("TURNSTILE__RATE_LIMITING__MAX_REQUESTS", "11");
        let loaded = TurnstileConfig::load(Some(&path));
        std::env::remove_var("TURNSTILE__RATE_LIMITING__MAX_REQUESTS");
        std::fs::remove_file(&path).unwrap();

        let config = loaded.unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.rate_limiting.window_ms, 1_000);
        assert_eq!(config.rate_limiting.max_requests, 11);
    }

    #[test]
    fn test_from_file_missing() {
        let err = TurnstileConfig::from_file("/nonexistent/turnstile.yaml").unwrap_err();
        assert!(matches!(err, TurnstileError::Io(_)));
    }
}
