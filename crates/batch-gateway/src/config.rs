//! Gateway configuration

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for the batch gateway server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Address to listen on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Timeout for each outbound lookup request
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Most lookups accepted in one batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_listen() -> SocketAddr {
    ([127, 0, 0, 1], 3000).into()
}

fn default_lookup_timeout_ms() -> u64 {
    10_000
}

fn default_max_batch_size() -> usize {
    64
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl GatewayConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Load configuration from JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.json");
        let config = GatewayConfig {
            max_batch_size: 8,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = GatewayConfig::load(&path).unwrap();
        assert_eq!(loaded.max_batch_size, 8);
        assert_eq!(loaded.lookup_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: GatewayConfig = serde_json::from_str(r#"{"max_batch_size": 2}"#).unwrap();
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.max_batch_size, 2);
    }
}
