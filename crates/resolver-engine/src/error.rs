//! Error taxonomy for resolution, reverse resolution and signed claims

use alloy_primitives::{Address, Bytes};
use thiserror::Error;

use resolver_core::CodecError;

/// Failure of a collaborator (registry, resolver, RPC node)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Backend error: {0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Why a resolution, or one slot of a bundle, failed
///
/// Slot-level kinds (`UnsupportedResolverProfile`, `ResolverError`, the
/// gateway kinds) never fail sibling slots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Resolver not found for {name}")]
    ResolverNotFound { name: String },

    #[error("Resolver {resolver} for {name} is not a contract")]
    ResolverNotContract { name: String, resolver: Address },

    #[error("Resolver does not support profile 0x{}", hex::encode(.selector))]
    UnsupportedResolverProfile { selector: [u8; 4] },

    #[error("Resolver error: {0}")]
    ResolverError(Bytes),

    #[error("Off-chain lookup required but no gateway is available")]
    OffchainGatewayUnavailable,

    #[error("Gateway transport error: {0}")]
    GatewayTransportError(String),

    #[error("Off-chain protocol violation: {0}")]
    OffchainProtocolViolation(String),

    #[error("Reverse name {name} resolves to 0x{}", hex::encode(.address))]
    ReverseAddressMismatch { name: String, address: Bytes },

    #[error("Empty address")]
    EmptyAddress,

    #[error("Resolution timed out")]
    Timeout,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<resolver_core::Error> for ResolutionError {
    fn from(e: resolver_core::Error) -> Self {
        match e {
            resolver_core::Error::Codec(codec) => ResolutionError::Codec(codec),
            resolver_core::Error::InvalidAddress(_) => ResolutionError::EmptyAddress,
            other => ResolutionError::Codec(CodecError::Encoding(other.to_string())),
        }
    }
}

/// Why a signed reverse claim was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Coin type {0} not authorized by claim")]
    CoinTypeNotFound(u64),

    #[error("Signature expired at {expiry} (now {now})")]
    SignatureExpired { expiry: u64, now: u64 },

    #[error("Signature expiry {expiry} beyond {max}")]
    SignatureExpiryTooHigh { expiry: u64, max: u64 },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("{signer} is not the owner of {contract}")]
    NotOwnerOfContract { contract: Address, signer: Address },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, ResolutionError>;
