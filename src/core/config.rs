//! # Configuration Module
//!
//! This module handles configuration loading for the balancer.
//!
//! ## Key Features
//! - YAML configuration parsing with serde
//! - Environment variable override support (`BALANCER_*`)
//! - Validation with detailed error messages
//!
//! The shapes here mirror the wire-level facts of the dispatcher: a listening
//! endpoint, a fixed set of typed backends, the cost multiplier table, and the
//! per-session buffer size. Everything is read once at startup and treated as
//! immutable afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::backend::BackendClass;
use crate::core::error::{BalancerError, BalancerResult};
use crate::dispatch::DispatchMode;

/// Main balancer configuration structure
///
/// This structure represents the complete configuration for the balancer.
/// It uses serde for deserialization from YAML files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerConfig {
    /// Listening endpoint for client connections
    pub listener: ListenerConfig,

    /// Connection dispatch strategy to drive sessions with
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// Maximum request/response payload size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Bounded wait for a backend response (e.g. "30s").
    /// Absent means wait indefinitely.
    #[serde(default, with = "humantime_serde")]
    pub backend_response_timeout: Option<Duration>,

    /// Backend pool, in scheduling tie-break order
    pub backends: Vec<BackendConfig>,

    /// Cost multiplier table for the scheduler's duration estimates
    #[serde(default)]
    pub cost: CostConfig,
}

/// Listening endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl ListenerConfig {
    /// Address string suitable for `TcpListener::bind`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// A single configured backend server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable identity used as the scheduling key
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Class tag determining the backend's cost profile
    pub class: BackendClass,
}

impl BackendConfig {
    /// Address string suitable for `TcpStream::connect`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Cost multiplier table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    pub multipliers: Vec<MultiplierEntry>,
}

/// One `(backend class, request tag) -> multiplier` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierEntry {
    pub class: BackendClass,
    pub request: char,
    pub factor: u32,
}

impl Default for CostConfig {
    /// The stock multiplier table: video servers favor video and picture
    /// work, music servers favor music work.
    fn default() -> Self {
        Self {
            multipliers: vec![
                MultiplierEntry { class: BackendClass::Video, request: 'M', factor: 2 },
                MultiplierEntry { class: BackendClass::Video, request: 'V', factor: 1 },
                MultiplierEntry { class: BackendClass::Video, request: 'P', factor: 1 },
                MultiplierEntry { class: BackendClass::Music, request: 'M', factor: 1 },
                MultiplierEntry { class: BackendClass::Music, request: 'V', factor: 3 },
                MultiplierEntry { class: BackendClass::Music, request: 'P', factor: 2 },
            ],
        }
    }
}

fn default_buffer_size() -> usize {
    2048
}

impl BalancerConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> BalancerResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BalancerError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: BalancerConfig = serde_yaml::from_str(&content)
            .map_err(|e| BalancerError::config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern: BALANCER_<SECTION>_<FIELD>
    /// For example: BALANCER_LISTENER_PORT=9000
    pub fn apply_env_overrides(&mut self) -> BalancerResult<()> {
        use std::env;

        if let Ok(addr) = env::var("BALANCER_LISTENER_BIND_ADDRESS") {
            self.listener.bind_address = addr;
        }

        if let Ok(port) = env::var("BALANCER_LISTENER_PORT") {
            self.listener.port = port
                .parse()
                .map_err(|e| BalancerError::config(format!("Invalid BALANCER_LISTENER_PORT: {}", e)))?;
        }

        if let Ok(mode) = env::var("BALANCER_DISPATCH") {
            self.dispatch = mode
                .parse()
                .map_err(|e| BalancerError::config(format!("Invalid BALANCER_DISPATCH: {}", e)))?;
        }

        if let Ok(size) = env::var("BALANCER_BUFFER_SIZE") {
            self.buffer_size = size
                .parse()
                .map_err(|e| BalancerError::config(format!("Invalid BALANCER_BUFFER_SIZE: {}", e)))?;
        }

        if let Ok(timeout) = env::var("BALANCER_BACKEND_RESPONSE_TIMEOUT") {
            self.backend_response_timeout = Some(humantime::parse_duration(&timeout).map_err(
                |e| {
                    BalancerError::config(format!(
                        "Invalid BALANCER_BACKEND_RESPONSE_TIMEOUT: {}",
                        e
                    ))
                },
            )?);
        }

        Ok(())
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> BalancerResult<()> {
        if self.backends.is_empty() {
            return Err(BalancerError::config("At least one backend must be configured"));
        }

        let mut seen = std::collections::HashSet::new();
        for backend in &self.backends {
            if backend.name.is_empty() {
                return Err(BalancerError::config("Backend name must not be empty"));
            }
            if !seen.insert(backend.name.as_str()) {
                return Err(BalancerError::config(format!(
                    "Duplicate backend name: {}",
                    backend.name
                )));
            }
        }

        if self.buffer_size == 0 {
            return Err(BalancerError::config("buffer_size must be greater than zero"));
        }

        for entry in &self.cost.multipliers {
            if entry.factor == 0 {
                return Err(BalancerError::config(format!(
                    "Cost multiplier for ({}, {}) must be positive",
                    entry.class, entry.request
                )));
            }
        }

        Ok(())
    }
}
