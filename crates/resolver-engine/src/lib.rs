//! resolver-engine: universal name resolution
//!
//! Given a wire-encoded name and a bundle of profile queries, the engine:
//! 1. Finds the responsible resolver, walking up to wildcard-capable
//!    ancestors when the exact node has none ([`discovery`])
//! 2. Dispatches every query, natively bundled when the resolver supports
//!    it, keeping one result slot per query ([`engine`])
//! 3. Batches `OffchainLookup` continuations through a gateway and replays
//!    the answers into the resolver once ([`gateway`], [`http`])
//!
//! Reverse resolution ([`reverse`]) reads the primary name recorded for an
//! address and only returns it if the name resolves back to that address.
//! [`claim`] verifies signed requests to set such a record.
//!
//! ## Example
//!
//! ```ignore
//! use resolver_engine::{HttpGatewayTransport, ProfileQuery, RpcBackend, UniversalResolver};
//!
//! let backend = RpcBackend::new("http://localhost:8545", DEFAULT_REGISTRY).await?;
//! let transport = HttpGatewayTransport::new(config.gateway_timeout())?;
//! let engine = UniversalResolver::new(backend, transport, config);
//! let record = engine.resolve_address(&resolver_core::encode("vitalik.eth")?, 60).await?;
//! ```

pub mod abi;
pub mod backend;
pub mod claim;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod http;
pub mod profile;
pub mod reverse;
pub mod rpc;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use backend::{
    ContractSignatureChecker, CounterfactualDeployer, OffchainLookup, OwnershipProbe, Registry,
    ResolverCaller, ResolverOutcome,
};
pub use claim::{ClaimVerifier, SignedClaim};
pub use discovery::{find_resolver, Discovery, Session};
pub use engine::{AddressRecord, ProfileResult, Resolution, UniversalResolver};
pub use error::{BackendError, ClaimError, ResolutionError, Result};
pub use gateway::{BatchRound, EntryStatus, GatewayAnswer, GatewayBatchClient, GatewayTransport};
pub use http::{ccip_read, HttpGatewayTransport, TransportError};
pub use profile::ProfileQuery;
pub use reverse::ReverseResolution;
pub use rpc::{RpcBackend, DEFAULT_REGISTRY};
