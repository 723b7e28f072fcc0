//! Configuration module for the Dialog Gateway server.
//!
//! Configuration comes from three sources with the precedence
//! YAML file > environment variables > defaults. Environment variables may
//! come from a `.env` file loaded in `main` before config loading.
//!
//! # Example
//! ```rust,no_run
//! use dialog_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid YAML
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value failed validation
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Everything needed to run the gateway: listen address and TLS, the model
/// backend bound to each stream session, the public callback host for
/// outbound dialing, and the security settings (CORS, rate limiting,
/// connection limits).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Model backend the hub creates for each stream session
    pub model_backend: String,

    /// Public base URL the telephony vendor connects back to for media
    /// streams (used when forking outbound calls)
    pub callback_host: String,

    /// Enable the call-trace hook on the function dispatcher
    pub call_trace_enabled: bool,

    /// Seconds without inbound traffic before a stream session is closed
    pub stream_idle_timeout_secs: u64,

    // Security settings
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
    /// Global cap on concurrent stream sessions (None = unlimited)
    pub max_stream_connections: Option<usize>,
    /// Per-IP cap on concurrent stream sessions
    pub max_connections_per_ip: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tls: None,
            model_backend: "echo".to_string(),
            callback_host: "http://localhost:3000".to_string(),
            call_trace_enabled: false,
            stream_idle_timeout_secs: 300,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 100,
            rate_limit_burst_size: 50,
            max_stream_connections: None,
            max_connections_per_ip: 10,
        }
    }
}

impl ServerConfig {
    /// Listen address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether TLS is configured.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables as
    /// fallback for values the file does not set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;

        let text = std::fs::read_to_string(path)?;
        let yaml: YamlConfig = serde_yaml::from_str(&text)?;
        config.apply_yaml(yaml);

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_var("HOST") {
            self.host = host;
        }
        if let Some(port) = env_var("PORT") {
            self.port = parse(&port, "PORT")?;
        }
        match (env_var("TLS_CERT_PATH"), env_var("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => {
                self.tls = Some(TlsConfig {
                    cert_path: PathBuf::from(cert),
                    key_path: PathBuf::from(key),
                });
            }
            (None, None) => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                ));
            }
        }
        if let Some(backend) = env_var("MODEL_BACKEND") {
            self.model_backend = backend;
        }
        if let Some(host) = env_var("CALLBACK_HOST") {
            self.callback_host = host;
        }
        if let Some(enabled) = env_var("CALL_TRACE_ENABLED") {
            self.call_trace_enabled = parse(&enabled, "CALL_TRACE_ENABLED")?;
        }
        if let Some(secs) = env_var("STREAM_IDLE_TIMEOUT_SECS") {
            self.stream_idle_timeout_secs = parse(&secs, "STREAM_IDLE_TIMEOUT_SECS")?;
        }
        if let Some(origins) = env_var("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = env_var("RATE_LIMIT_RPS") {
            self.rate_limit_requests_per_second = parse(&rps, "RATE_LIMIT_RPS")?;
        }
        if let Some(burst) = env_var("RATE_LIMIT_BURST") {
            self.rate_limit_burst_size = parse(&burst, "RATE_LIMIT_BURST")?;
        }
        if let Some(max) = env_var("MAX_STREAM_CONNECTIONS") {
            self.max_stream_connections = Some(parse(&max, "MAX_STREAM_CONNECTIONS")?);
        }
        if let Some(max) = env_var("MAX_CONNECTIONS_PER_IP") {
            self.max_connections_per_ip = parse(&max, "MAX_CONNECTIONS_PER_IP")?;
        }
        Ok(())
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) {
        if let Some(server) = yaml.server {
            if let Some(host) = server.host {
                self.host = host;
            }
            if let Some(port) = server.port {
                self.port = port;
            }
            if let Some(tls) = server.tls {
                self.tls = Some(TlsConfig {
                    cert_path: tls.cert_path,
                    key_path: tls.key_path,
                });
            }
        }
        if let Some(stream) = yaml.stream {
            if let Some(backend) = stream.model_backend {
                self.model_backend = backend;
            }
            if let Some(secs) = stream.idle_timeout_secs {
                self.stream_idle_timeout_secs = secs;
            }
            if let Some(max) = stream.max_connections {
                self.max_stream_connections = Some(max);
            }
            if let Some(max) = stream.max_connections_per_ip {
                self.max_connections_per_ip = max;
            }
        }
        if let Some(dialog) = yaml.dialog {
            if let Some(host) = dialog.callback_host {
                self.callback_host = host;
            }
            if let Some(enabled) = dialog.call_trace_enabled {
                self.call_trace_enabled = enabled;
            }
        }
        if let Some(security) = yaml.security {
            if let Some(origins) = security.cors_allowed_origins {
                self.cors_allowed_origins = Some(origins);
            }
            if let Some(rps) = security.rate_limit_requests_per_second {
                self.rate_limit_requests_per_second = rps;
            }
            if let Some(burst) = security.rate_limit_burst_size {
                self.rate_limit_burst_size = burst;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.model_backend.is_empty() {
            return Err(ConfigError::Invalid(
                "model_backend must not be empty".to_string(),
            ));
        }
        if self.stream_idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "stream_idle_timeout_secs must be positive".to_string(),
            ));
        }
        if self.max_connections_per_ip == 0 {
            return Err(ConfigError::Invalid(
                "max_connections_per_ip must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name} has invalid value '{value}'")))
}

// =============================================================================
// YAML file shape
// =============================================================================

#[derive(Debug, Deserialize)]
struct YamlConfig {
    server: Option<YamlServer>,
    stream: Option<YamlStream>,
    dialog: Option<YamlDialog>,
    security: Option<YamlSecurity>,
}

#[derive(Debug, Deserialize)]
struct YamlServer {
    host: Option<String>,
    port: Option<u16>,
    tls: Option<YamlTls>,
}

#[derive(Debug, Deserialize)]
struct YamlTls {
    cert_path: PathBuf,
    key_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct YamlStream {
    model_backend: Option<String>,
    idle_timeout_secs: Option<u64>,
    max_connections: Option<usize>,
    max_connections_per_ip: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct YamlDialog {
    callback_host: Option<String>,
    call_trace_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct YamlSecurity {
    cors_allowed_origins: Option<String>,
    rate_limit_requests_per_second: Option<u32>,
    rate_limit_burst_size: Option<u32>,
}
