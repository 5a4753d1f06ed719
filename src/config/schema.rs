//! Configuration schema definitions.
//!
//! This module defines the static configuration of the provider process.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Rule used when an instance declares none.
pub const DEFAULT_RULE: &str = "Host(`{{ normalize Name }}`)";

/// Root configuration for the LXD provider.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    /// LXD connection and discovery settings.
    pub provider: LxdConfig,

    /// Reconnect backoff settings.
    pub backoff: BackoffConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-only snapshot API.
    pub api: ApiConfig,
}

/// LXD connection and discovery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LxdConfig {
    /// LXD endpoint; only `unix://<socket path>` is supported.
    pub endpoint: String,

    /// Expose instances that carry no `enable` label.
    pub exposed_by_default: bool,

    /// Handlebars template for routers without a rule.
    pub default_rule: String,

    /// Seconds between instance listings while connected.
    pub poll_interval_secs: u64,

    /// Timeout for a single LXD API request in seconds.
    pub request_timeout_secs: u64,

    /// Snapshots buffered towards the consumer before publishing blocks.
    pub channel_capacity: usize,
}

impl Default for LxdConfig {
    fn default() -> Self {
        Self {
            endpoint: "unix:///var/lib/lxd/unix.socket".to_string(),
            exposed_by_default: true,
            default_rule: DEFAULT_RULE.to_string(),
            poll_interval_secs: 15,
            request_timeout_secs: 10,
            channel_capacity: 16,
        }
    }
}

/// Reconnect backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// First retry delay in milliseconds.
    pub initial_interval_ms: u64,

    /// Growth factor applied after each consecutive failure.
    pub multiplier: f64,

    /// Upper bound for the retry delay in milliseconds.
    pub max_interval_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            multiplier: 1.5,
            max_interval_ms: 60_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Snapshot API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Serve the snapshot API.
    pub enabled: bool,

    /// API bind address.
    pub bind_address: String,

    /// Bearer token required by the API; empty disables authentication.
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.provider.endpoint, "unix:///var/lib/lxd/unix.socket");
        assert!(config.provider.exposed_by_default);
        assert_eq!(config.provider.default_rule, DEFAULT_RULE);
        assert_eq!(config.backoff.initial_interval_ms, 500);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ProviderConfig = toml::from_str(
            r#"
            [provider]
            exposed_by_default = false

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert!(!config.provider.exposed_by_default);
        assert_eq!(config.provider.poll_interval_secs, 15);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.api.enabled);
    }
}
