//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::coin_type::CoinTypePolicy;
use crate::Address;

/// Default horizon for signed claim expiry (one hour)
pub const DEFAULT_MAX_EXPIRY_HORIZON_SECS: u64 = 3600;

/// Policy for signature-authenticated reverse claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPolicy {
    /// Furthest an expiry may lie in the future, in seconds from now
    #[serde(default = "default_max_expiry_horizon")]
    pub max_expiry_horizon_secs: u64,
}

fn default_max_expiry_horizon() -> u64 {
    DEFAULT_MAX_EXPIRY_HORIZON_SECS
}

impl Default for ClaimPolicy {
    fn default() -> Self {
        Self {
            max_expiry_horizon_secs: DEFAULT_MAX_EXPIRY_HORIZON_SECS,
        }
    }
}

/// Configuration for the resolution engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Batch gateway URLs tried in order when a resolver asks for an off-chain lookup
    #[serde(default)]
    pub batch_gateway_urls: Vec<String>,
    /// `sender` reported to batch gateways
    #[serde(with = "hex_address", default = "zero_address")]
    pub gateway_sender: Address,
    /// Per-request HTTP timeout for gateway traffic
    #[serde(default = "default_gateway_timeout_ms")]
    pub gateway_timeout_ms: u64,
    /// Upper bound on a whole resolve/reverse call, if any
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,
    #[serde(default)]
    pub coin_types: CoinTypePolicy,
    #[serde(default)]
    pub claims: ClaimPolicy,
}

fn zero_address() -> Address {
    [0u8; 20]
}

fn default_gateway_timeout_ms() -> u64 {
    10_000
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self {
            batch_gateway_urls: Vec::new(),
            gateway_sender: zero_address(),
            gateway_timeout_ms: default_gateway_timeout_ms(),
            call_timeout_ms: None,
            coin_types: CoinTypePolicy::default(),
            claims: ClaimPolicy::default(),
        }
    }

    pub fn with_batch_gateways(mut self, urls: Vec<String>) -> Self {
        self.batch_gateway_urls = urls;
        self
    }

    pub fn with_gateway_sender(mut self, sender: Address) -> Self {
        self.gateway_sender = sender;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_coin_type_policy(mut self, policy: CoinTypePolicy) -> Self {
        self.coin_types = policy;
        self
    }

    pub fn with_max_expiry_horizon(mut self, secs: u64) -> Self {
        self.claims.max_expiry_horizon_secs = secs;
        self
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub mod hex_address {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(address: &[u8; 20], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex_str = format!("0x{}", hex::encode(address));
        serializer.serialize_str(&hex_str)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 20], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        crate::parse_address(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert!(config.batch_gateway_urls.is_empty());
        assert_eq!(config.claims.max_expiry_horizon_secs, 3600);
        assert_eq!(config.gateway_timeout(), Duration::from_secs(10));
        assert_eq!(config.call_timeout(), None);
    }

    #[test]
    fn test_minimal_json_fills_defaults() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"batch_gateway_urls":["https://gw.example/"]}"#).unwrap();
        assert_eq!(config.batch_gateway_urls, vec!["https://gw.example/"]);
        assert_eq!(config.gateway_sender, [0u8; 20]);
        assert!(config.coin_types.fallback_to_default);
        assert!(!config.coin_types.mainnet_falls_back);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resolver.json");

        let config = ResolverConfig::new()
            .with_batch_gateways(vec!["http://127.0.0.1:8080".into()])
            .with_gateway_sender([0xabu8; 20])
            .with_call_timeout(Duration::from_millis(2500))
            .with_max_expiry_horizon(600);
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("0xabababab"));

        let loaded = ResolverConfig::load(&path).unwrap();
        assert_eq!(loaded.gateway_sender, [0xabu8; 20]);
        assert_eq!(loaded.call_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(loaded.claims.max_expiry_horizon_secs, 600);
    }
}
