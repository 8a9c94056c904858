//! batch-gateway binary: CCIP-Read batch gateway
//!
//! Run with:
//! ```bash
//! cargo run -p batch-gateway -- --port 3000
//! ```

use std::path::PathBuf;

use batch_gateway::{GatewayConfig, ServerBuilder};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "batch-gateway")]
#[command(about = "Serve batched off-chain lookups")]
struct Args {
    /// Gateway config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Disable the /metrics endpoint
    #[arg(long)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("batch_gateway=info".parse()?))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };

    let mut builder = ServerBuilder::new(config);
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if !args.no_metrics {
        builder = builder.with_metrics();
    }
    let server = builder.build()?;

    tracing::info!("Gateway ready on {}", server.addr());
    server.run().await?;

    Ok(())
}
