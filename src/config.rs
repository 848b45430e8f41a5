// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! Gateway configuration, loaded from a YAML file with environment
//! overrides.
//!
//! The file path comes from `GATEWAY_CONFIG` (default `gateway.yaml`).
//! When the default path does not exist the built-in defaults are used,
//! so a bare `tfs-gateway` still starts. `GATEWAY_PORT` and
//! `BACKEND_ADDR` override the file regardless of where it came from.

use std::env;
use std::io::ErrorKind;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub startup: StartupConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Serving backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// gRPC address of the backend, e.g. `http://localhost:9000`.
    #[serde(default = "default_backend_addr")]
    pub addr: String,
    /// Servable to address on the backend.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Serving signature to use. When unset, the model must export
    /// exactly one signature and that one is designated at startup.
    #[serde(default)]
    pub signature_name: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound for encoded gRPC messages in either direction.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Retry schedule for the startup metadata poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_millis")]
    pub interval_millis: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            addr: default_backend_addr(),
            model_name: default_model_name(),
            signature_name: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_millis: default_interval_millis(),
        }
    }
}

pub async fn load() -> Result<Config> {
    let explicit_path = env::var("GATEWAY_CONFIG").ok();
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| "gateway.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(config_str) => serde_yaml::from_str(&config_str)?,
        // The default path is optional; an explicitly configured one is not.
        Err(err) if err.kind() == ErrorKind::NotFound && explicit_path.is_none() => {
            debug!("No configuration file at {}, using defaults", config_path);
            Config::default()
        }
        Err(err) => return Err(err.into()),
    };

    apply_env_overrides(&mut config)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(port) = env::var("GATEWAY_PORT") {
        config.server.port = port
            .parse()
            .map_err(|_| Error::Config(format!("invalid GATEWAY_PORT value `{port}`")))?;
    }
    if let Ok(addr) = env::var("BACKEND_ADDR") {
        config.backend.addr = addr;
    }
    Ok(())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend_addr() -> String {
    "http://localhost:9000".to_string()
}

fn default_model_name() -> String {
    "default".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_max_message_size() -> usize {
    128 * 1024 * 1024
}

fn default_max_attempts() -> u32 {
    300
}

fn default_interval_millis() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.logs.level, "info");
        assert_eq!(config.backend.addr, "http://localhost:9000");
        assert_eq!(config.backend.model_name, "default");
        assert!(config.backend.signature_name.is_none());
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.backend.max_message_size, 128 * 1024 * 1024);
        assert_eq!(config.startup.max_attempts, 300);
        assert_eq!(config.startup.interval_millis, 1000);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let raw = r#"
backend:
  addr: "http://tf-serve:9001"
  signature_name: "serving_default"
"#;
        let config: Config = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.backend.addr, "http://tf-serve:9001");
        assert_eq!(config.backend.signature_name.as_deref(), Some("serving_default"));
        // Everything not mentioned keeps its default.
        assert_eq!(config.backend.model_name, "default");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.startup.max_attempts, 300);
    }

    #[test]
    fn full_yaml_round_trips() {
        let raw = r#"
server:
  host: "127.0.0.1"
  port: 9090
  logs:
    level: "debug"
backend:
  addr: "http://localhost:9000"
  model_name: "iris"
  request_timeout_secs: 30
  connect_timeout_secs: 2
startup:
  max_attempts: 5
  interval_millis: 250
"#;
        let config: Config = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.logs.level, "debug");
        assert_eq!(config.backend.model_name, "iris");
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.backend.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.startup.max_attempts, 5);
        assert_eq!(config.startup.interval_millis, 250);
    }
}
