//! resolver-core: names, nodes and coin types for universal name resolution
//!
//! Everything in this crate is pure and synchronous:
//! - [`Name`] / [`codec`]: the length-prefixed wire form of dotted names,
//!   cursor navigation over it, and the recursive namehash
//! - [`coin_type`]: mapping between EVM chain ids and address namespaces
//! - [`reverse_name`]: ENSIP-19 reverse names for an address and coin type
//! - [`ResolverConfig`]: policy knobs shared by the engine and the CLI
//!
//! # Namehash
//!
//! ```text
//! node(root)         = 0x00..00
//! node(label . rest) = keccak256(node(rest) ++ labelhash(label))
//! ```
//!
//! A label may be a [`Label::Commitment`], written `[<64 hex>]`, which
//! supplies its label hash directly.

pub mod codec;
pub mod coin_type;
mod config;
mod error;
mod hash;
mod label;
mod name;
pub mod reverse_name;

pub use codec::{match_suffix, namehash, next_label, prev_label, read_label, SuffixMatch};
pub use coin_type::{
    chain_from_coin_type, coin_type_from_chain, is_evm_coin_type, CoinTypePolicy, COIN_TYPE_DEFAULT,
    COIN_TYPE_ETH,
};
pub use config::{hex_address, ClaimPolicy, ResolverConfig, DEFAULT_MAX_EXPIRY_HORIZON_SECS};
pub use error::{CodecError, Error};
pub use hash::{child_node, keccak256};
pub use label::{Label, COMMITMENT_LABEL_LEN, MAX_LITERAL_LABEL_LEN};
pub use name::{decode, encode, namehash_str, Name};
pub use reverse_name::{encode_reverse_name, reverse_name, reverse_node};

pub type Result<T> = std::result::Result<T, Error>;

/// 20-byte EVM address
pub type Address = [u8; 20];

/// 32-byte namehash
pub type Node = [u8; 32];

/// Parse a `0x`-prefixed (or bare) hex address
pub fn parse_address(s: &str) -> Result<Address> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| Error::InvalidAddress(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| Error::InvalidAddress("invalid address length".to_string()))
}
