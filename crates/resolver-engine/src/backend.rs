//! Collaborators the engine reads from
//!
//! The registry, resolver contracts and signature checks live outside this
//! crate. Implementations talk to a node ([`RpcBackend`]) or to in-memory
//! fixtures in tests.
//!
//! [`RpcBackend`]: crate::rpc::RpcBackend

use alloy_primitives::{Address, Bytes, FixedBytes, B256};
use alloy_sol_types::{SolError, SolValue};
use async_trait::async_trait;

use crate::abi;
use crate::error::BackendError;

/// EIP-3668 continuation signalled by a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffchainLookup {
    pub sender: Address,
    pub urls: Vec<String>,
    pub call_data: Bytes,
    pub callback: FixedBytes<4>,
    pub extra_data: Bytes,
}

impl OffchainLookup {
    /// Decode revert data, returning `None` unless it is an `OffchainLookup`
    pub fn decode(revert: &[u8]) -> Option<Self> {
        let err = abi::OffchainLookup::abi_decode(revert).ok()?;
        Some(Self {
            sender: err.sender,
            urls: err.urls,
            call_data: err.callData,
            callback: err.callbackFunction,
            extra_data: err.extraData,
        })
    }

    pub fn encode(&self) -> Bytes {
        abi::OffchainLookup {
            sender: self.sender,
            urls: self.urls.clone(),
            callData: self.call_data.clone(),
            callbackFunction: self.callback,
            extraData: self.extra_data.clone(),
        }
        .abi_encode()
        .into()
    }

    /// Calldata for `callback(bytes response, bytes extraData)` on `sender`
    pub fn callback_call(&self, response: &[u8]) -> Bytes {
        let mut data = self.callback.to_vec();
        data.extend((Bytes::copy_from_slice(response), self.extra_data.clone()).abi_encode_params());
        data.into()
    }
}

/// What a resolver call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverOutcome {
    Success(Bytes),
    Revert(Bytes),
    OffchainLookup(OffchainLookup),
}

impl ResolverOutcome {
    /// Classify revert data, recognising `OffchainLookup`
    pub fn from_revert(data: Bytes) -> Self {
        match OffchainLookup::decode(&data) {
            Some(lookup) => ResolverOutcome::OffchainLookup(lookup),
            None => ResolverOutcome::Revert(data),
        }
    }
}

/// Registry lookup: node -> (owner, resolver)
#[async_trait]
pub trait Registry: Send + Sync {
    async fn node_owner_and_resolver(&self, node: B256) -> Result<(Address, Address), BackendError>;

    /// Whether `address` has deployed code
    async fn is_contract(&self, address: Address) -> Result<bool, BackendError>;
}

/// Read-only call into a resolver
#[async_trait]
pub trait ResolverCaller: Send + Sync {
    async fn call(&self, target: Address, payload: Bytes) -> Result<ResolverOutcome, BackendError>;
}

/// `owner()` of an ownable contract, `None` when the contract has none
#[async_trait]
pub trait OwnershipProbe: Send + Sync {
    async fn owner_of(&self, contract: Address) -> Result<Option<Address>, BackendError>;
}

/// ERC-1271 signature check against a deployed contract
#[async_trait]
pub trait ContractSignatureChecker: Send + Sync {
    async fn is_valid_signature(
        &self,
        contract: Address,
        hash: B256,
        signature: Bytes,
    ) -> Result<bool, BackendError>;
}

/// Executes an ERC-6492 deployment payload (`factory.call(calldata)`)
#[async_trait]
pub trait CounterfactualDeployer: Send + Sync {
    async fn deploy(&self, factory: Address, calldata: Bytes) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> OffchainLookup {
        OffchainLookup {
            sender: Address::repeat_byte(0x11),
            urls: vec!["https://gw.example/{sender}/{data}.json".into()],
            call_data: Bytes::from_static(&[1, 2, 3]),
            callback: FixedBytes::from([0xaa, 0xbb, 0xcc, 0xdd]),
            extra_data: Bytes::from_static(&[9]),
        }
    }

    #[test]
    fn test_revert_classification() {
        let encoded = lookup().encode();
        assert_eq!(encoded[..4], [0x55, 0x6f, 0x18, 0x30]);
        assert_eq!(
            ResolverOutcome::from_revert(encoded),
            ResolverOutcome::OffchainLookup(lookup())
        );
        let other = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            ResolverOutcome::from_revert(other.clone()),
            ResolverOutcome::Revert(other)
        );
    }

    #[test]
    fn test_callback_call_layout() {
        let call = lookup().callback_call(b"response");
        assert_eq!(call[..4], [0xaa, 0xbb, 0xcc, 0xdd]);
        let (response, extra) = <(Bytes, Bytes) as SolValue>::abi_decode_params(&call[4..]).unwrap();
        assert_eq!(response.as_ref(), b"response");
        assert_eq!(extra.as_ref(), &[9]);
    }
}
