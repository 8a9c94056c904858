//! Batch gateway server

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::routes::create_router;
use crate::state::{GatewayState, SharedState};

/// Batch gateway server
pub struct GatewayServer {
    state: SharedState,
    addr: SocketAddr,
}

impl GatewayServer {
    /// Run the server until the process exits
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);

        tracing::info!("Starting batch gateway on {}", self.addr);

        let listener = TcpListener::bind(self.addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Builder for GatewayServer
pub struct ServerBuilder {
    config: GatewayConfig,
    metrics: bool,
}

impl ServerBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            metrics: false,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.listen = ([0, 0, 0, 0], port).into();
        self
    }

    /// Install a Prometheus recorder and serve it on `/metrics`
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    pub fn build(self) -> Result<GatewayServer> {
        let addr = self.config.listen;
        let mut state = GatewayState::new(self.config)?;
        if self.metrics {
            let handle = crate::metrics::init_prometheus_recorder()
                .map_err(|e| GatewayError::Internal(e.to_string()))?;
            state = state.with_metrics(handle);
        }
        Ok(GatewayServer {
            state: std::sync::Arc::new(state),
            addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_port_overrides_listen() {
        let server = ServerBuilder::new(GatewayConfig::default())
            .port(4100)
            .build()
            .unwrap();
        assert_eq!(server.addr(), SocketAddr::from(([0, 0, 0, 0], 4100)));
        assert!(server.state.metrics.is_none());
    }
}
