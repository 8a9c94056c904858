//! Coin types (ENSIP-9 / ENSIP-11)
//!
//! A coin type names the address namespace a record belongs to:
//! - `60`: Ethereum mainnet
//! - `0x8000_0000`: the default EVM namespace, shared by every EVM chain
//! - `0x8000_0000 | chain_id`: one specific EVM chain
//!
//! Anything else is a non-EVM namespace (SLIP-44 numbering).

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Coin type of Ethereum mainnet
pub const COIN_TYPE_ETH: u64 = 60;

/// Coin type of the default EVM namespace (EVM flag, no chain bits)
pub const COIN_TYPE_DEFAULT: u64 = EVM_BIT;

/// High bit that marks an EVM chain coin type
pub const EVM_BIT: u64 = 0x8000_0000;

/// Coin type for an EVM chain id. Chain 1 maps to 60, chain 0 to the default namespace.
pub fn coin_type_from_chain(chain_id: u64) -> Result<u64, Error> {
    if chain_id == 1 {
        return Ok(COIN_TYPE_ETH);
    }
    if chain_id >= EVM_BIT {
        return Err(Error::InvalidChainId(chain_id));
    }
    Ok(chain_id | EVM_BIT)
}

/// Chain id for an EVM coin type, or `None` for non-EVM coin types
pub fn chain_from_coin_type(coin_type: u64) -> Option<u64> {
    if coin_type == COIN_TYPE_ETH {
        return Some(1);
    }
    if coin_type & EVM_BIT != 0 && coin_type >> 32 == 0 {
        return Some(coin_type ^ EVM_BIT);
    }
    None
}

pub fn is_evm_coin_type(coin_type: u64) -> bool {
    chain_from_coin_type(coin_type).is_some()
}

/// Label used for the coin type inside a reverse name
pub fn reverse_label(coin_type: u64) -> String {
    match coin_type {
        COIN_TYPE_ETH => "addr".to_string(),
        COIN_TYPE_DEFAULT => "default".to_string(),
        other => format!("{:x}", other),
    }
}

/// Which coin types may borrow the default EVM namespace when their own
/// record is unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinTypePolicy {
    /// Chain-specific EVM coin types fall back to the default namespace
    #[serde(default = "default_true")]
    pub fallback_to_default: bool,
    /// Mainnet (60) also falls back
    #[serde(default)]
    pub mainnet_falls_back: bool,
}

fn default_true() -> bool {
    true
}

impl CoinTypePolicy {
    pub fn falls_back_to_default(&self, coin_type: u64) -> bool {
        if !self.fallback_to_default || coin_type == COIN_TYPE_DEFAULT {
            return false;
        }
        if coin_type == COIN_TYPE_ETH {
            return self.mainnet_falls_back;
        }
        is_evm_coin_type(coin_type)
    }
}

impl Default for CoinTypePolicy {
    fn default() -> Self {
        Self {
            fallback_to_default: true,
            mainnet_falls_back: false,
        }
    }
}
