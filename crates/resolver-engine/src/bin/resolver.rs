//! Resolver CLI binary
//!
//! Run with:
//! ```bash
//! cargo run -p resolver-engine --bin resolver -- --rpc-url http://localhost:8545 resolve vitalik.eth
//! ```

use std::path::PathBuf;

use alloy_primitives::{Address, B256};
use clap::{Parser, Subcommand};
use resolver_core::{encode, namehash_str, parse_address, ResolverConfig, COIN_TYPE_ETH};
use resolver_engine::{
    profile, HttpGatewayTransport, ProfileQuery, RpcBackend, UniversalResolver, DEFAULT_REGISTRY,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "resolver")]
#[command(about = "Resolve names, records and primary names")]
struct Args {
    /// Ethereum RPC URL
    #[arg(long, default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Registry contract address
    #[arg(long)]
    registry: Option<String>,

    /// Resolver config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Batch gateway URL, repeatable; overrides the config file
    #[arg(long = "gateway")]
    gateways: Vec<String>,

    /// Abort a call after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the namehash of a name
    Namehash { name: String },

    /// Print the wire encoding of a name
    Encode { name: String },

    /// Resolve records of a name
    Resolve {
        name: String,

        /// Coin type of the address record
        #[arg(long, default_value_t = COIN_TYPE_ETH)]
        coin_type: u64,

        /// Text record keys to fetch alongside the address
        #[arg(long = "text")]
        texts: Vec<String>,

        /// Also fetch the content hash
        #[arg(long)]
        contenthash: bool,
    },

    /// Verified primary name of an address
    Reverse {
        address: String,

        #[arg(long, default_value_t = COIN_TYPE_ETH)]
        coin_type: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("resolver_engine=info".parse()?))
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Namehash { name } => {
            println!("0x{}", hex::encode(namehash_str(name)?));
            return Ok(());
        }
        Command::Encode { name } => {
            println!("0x{}", hex::encode(encode(name)?));
            return Ok(());
        }
        _ => {}
    }

    let mut config = match &args.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::new(),
    };
    if !args.gateways.is_empty() {
        config = config.with_batch_gateways(args.gateways.clone());
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_call_timeout(std::time::Duration::from_millis(ms));
    }

    let registry = match &args.registry {
        Some(s) => Address::from(parse_address(s)?),
        None => DEFAULT_REGISTRY,
    };
    let backend = RpcBackend::new(&args.rpc_url, registry).await?;
    let transport = HttpGatewayTransport::new(config.gateway_timeout())?;
    let engine = UniversalResolver::new(backend, transport, config);

    match args.command {
        Command::Resolve {
            name,
            coin_type,
            texts,
            contenthash,
        } => {
            let wire = encode(&name)?;
            let record = engine.resolve_address(&wire, coin_type).await?;
            println!("[OK] {} resolver {}", name, record.resolver);
            println!(
                "  address (coin type {}): 0x{}",
                record.coin_type,
                hex::encode(&record.address)
            );

            let node = B256::from(namehash_str(&name)?);
            let mut queries: Vec<ProfileQuery> =
                texts.iter().map(|key| ProfileQuery::text(node, key)).collect();
            if contenthash {
                queries.push(ProfileQuery::contenthash(node));
            }
            if queries.is_empty() {
                return Ok(());
            }

            let resolution = engine.resolve(&wire, &queries).await?;
            for (i, result) in resolution.results.iter().enumerate() {
                let label = texts
                    .get(i)
                    .map(|key| format!("text[{}]", key))
                    .unwrap_or_else(|| "contenthash".to_string());
                match &result.outcome {
                    Ok(payload) if i < texts.len() => {
                        let value = profile::decode_text(payload).unwrap_or_default();
                        println!("  {}: {} [{}]", label, value, result.status);
                    }
                    Ok(payload) => {
                        let value = profile::decode_contenthash(payload).unwrap_or_default();
                        println!("  {}: 0x{} [{}]", label, hex::encode(value), result.status);
                    }
                    Err(e) => println!("  {}: error: {} [{}]", label, e, result.status),
                }
            }
        }
        Command::Reverse { address, coin_type } => {
            let address = address.strip_prefix("0x").unwrap_or(&address);
            let bytes = hex::decode(address)?;
            let result = engine.reverse(&bytes, coin_type).await?;
            if result.name.is_empty() {
                println!("[OK] no primary name");
            } else {
                println!("[OK] {}", result.name);
            }
            if let Some(resolver) = result.reverse_resolver {
                println!("  reverse resolver: {}", resolver);
            }
            if let Some(resolver) = result.resolver {
                println!("  forward resolver: {}", resolver);
            }
        }
        Command::Namehash { .. } | Command::Encode { .. } => {}
    }

    Ok(())
}
