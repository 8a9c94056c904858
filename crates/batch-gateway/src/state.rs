//! Shared server state

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};

/// Immutable state shared by all handlers
pub struct GatewayState {
    pub config: GatewayConfig,
    /// Client for outbound lookups
    pub client: reqwest::Client,
    /// Present when the process installed a Prometheus recorder
    pub metrics: Option<PrometheusHandle>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.lookup_timeout())
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            client,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub type SharedState = Arc<GatewayState>;

/// Create shared state from config
pub fn create_shared_state(config: GatewayConfig) -> Result<SharedState> {
    Ok(Arc::new(GatewayState::new(config)?))
}
