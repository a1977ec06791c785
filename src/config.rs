//! TOML configuration for the dispatcher, the stream consumer, and the CLI.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:7341"
//!
//! [stream]
//! min_query_chars = 5
//! unit_timeout_secs = 30
//! latency_scale = 1.0
//!
//! [client]
//! base_url = "http://127.0.0.1:7341"
//! connect_timeout_secs = 10
//! ```
//!
//! Every section is optional; missing keys take the defaults shown above.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Dispatcher settings shared by the server and the client-side validation.
#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
    #[serde(default = "default_unit_timeout_secs")]
    pub unit_timeout_secs: u64,
    /// Multiplier for the mock resolver's simulated latencies. `0.0` disables them.
    #[serde(default = "default_latency_scale")]
    pub latency_scale: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            min_query_chars: default_min_query_chars(),
            unit_timeout_secs: default_unit_timeout_secs(),
            latency_scale: default_latency_scale(),
        }
    }
}

impl StreamConfig {
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs)
    }
}

fn default_min_query_chars() -> usize {
    5
}
fn default_unit_timeout_secs() -> u64 {
    30
}
fn default_latency_scale() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:7341".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    10
}

impl Config {
    /// A complete config with every default applied, used when no file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.stream.min_query_chars == 0 {
        anyhow::bail!("stream.min_query_chars must be >= 1");
    }

    if config.stream.unit_timeout_secs == 0 {
        anyhow::bail!("stream.unit_timeout_secs must be >= 1");
    }

    if !config.stream.latency_scale.is_finite() || config.stream.latency_scale < 0.0 {
        anyhow::bail!("stream.latency_scale must be a finite number >= 0.0");
    }

    let base = config.client.base_url.as_str();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!(
            "client.base_url must start with http:// or https://, got '{}'",
            base
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_takes_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:7341");
        assert_eq!(cfg.stream.min_query_chars, 5);
        assert_eq!(cfg.stream.unit_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.client.base_url, "http://127.0.0.1:7341");
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: Config = toml::from_str(
            r#"
[stream]
latency_scale = 0.0

[client]
base_url = "https://validator.internal:8443"
"#,
        )
        .unwrap();
        assert_eq!(cfg.stream.latency_scale, 0.0);
        assert_eq!(cfg.stream.min_query_chars, 5);
        assert_eq!(cfg.client.connect_timeout_secs, 10);
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = Config::minimal();
        cfg.stream.min_query_chars = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::minimal();
        cfg.stream.latency_scale = -1.0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::minimal();
        cfg.stream.unit_timeout_secs = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::minimal();
        cfg.client.base_url = "localhost:7341".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_config(Path::new("/nonexistent/vv.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
