//! Configuration loading and constants.
//!
//! Loads application configuration from TOML files and defines the fixed
//! strings served by the liveness endpoints, response header values, logging
//! defaults and default paths. `AppConfig` is the root configuration struct.

use const_format::formatcp;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Liveness Responses
// =============================================================================

/// Estimator name reported by the health endpoint
pub const CLASSIFIER_NAME: &str = "SGDClassifier";

/// Static readiness token returned by `/health`
pub const HEALTH_MESSAGE: &str = formatcp!("{} is all ready to go!", CLASSIFIER_NAME);

// =============================================================================
// HTTP Response Headers
// =============================================================================

/// Predictions depend on query parameters and are never cacheable
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Response header echoing the request ID used in logs
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Seconds to wait for in-flight requests during graceful shutdown
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default model artifact path
pub const DEFAULT_MODEL_PATH: &str = "models/sgd_pipeline.json";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=debug,tower_http=debug", env!("CARGO_CRATE_NAME"));

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    pub http: HttpServerConfig,
    /// Model artifact settings
    #[serde(default)]
    pub model: ModelConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS mode for the HTTP listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain HTTP (development or behind a TLS-terminating proxy)
    #[default]
    None,
    /// User-provided certificate and key files
    Manual,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub mode: TlsMode,
    /// PEM certificate chain (manual mode)
    pub cert_path: Option<String>,
    /// PEM private key (manual mode)
    pub key_path: Option<String>,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the exported pipeline, relative to the working directory
    #[serde(default = "ModelConfig::default_path")]
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl ModelConfig {
    fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_MODEL_PATH)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let tls = &self.http.tls;
        if tls.mode == TlsMode::Manual && (tls.cert_path.is_none() || tls.key_path.is_none()) {
            return Err(ConfigError::Validation(
                "http.tls.mode = \"manual\" requires cert_path and key_path".to_string(),
            ));
        }

        match self.logging.format.to_ascii_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "Unknown logging.format '{}', expected \"text\" or \"json\"",
                    other
                )));
            }
        }

        Ok(())
    }

    /// Address string for the HTTP listener.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
