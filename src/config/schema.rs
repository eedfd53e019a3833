//! Service configuration schema.
//!
//! This module defines the settings the control plane server reads from its
//! TOML file. All types derive Serde traits and every field has a default,
//! so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the control plane service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Preview link settings.
    pub preview: PreviewConfig,

    /// Snapshot persistence.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,

    pub environments: EnvironmentsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Preview session configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PreviewConfig {
    /// TTL applied when the caller does not ask for one.
    pub default_ttl_secs: u64,

    /// Longest TTL a caller may request.
    pub max_ttl_secs: u64,

    /// How many codes to try before giving up on a collision streak.
    pub max_issue_attempts: u32,

    /// How long an expired session is kept so lookups can still answer
    /// "expired" rather than "unknown".
    pub expired_retention_secs: u64,

    /// Run the background sweeper.
    pub sweep_enabled: bool,

    /// Sweeper interval in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 24 * 3600,
            max_ttl_secs: 7 * 24 * 3600,
            max_issue_attempts: 32,
            expired_retention_secs: 24 * 3600,
            sweep_enabled: true,
            sweep_interval_secs: 300,
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot location. `None` keeps state in memory only.
    pub snapshot_path: Option<String>,

    /// Write a snapshot during graceful shutdown.
    pub save_on_shutdown: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            save_on_shutdown: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Deployment environments.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct EnvironmentsConfig {
    /// Environments that may be published to. Empty allows any valid name.
    pub allowed: Vec<String>,
}

impl EnvironmentsConfig {
    pub fn permits(&self, environment: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|e| e == environment)
    }
}
