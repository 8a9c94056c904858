//! Collaborators backed by an Ethereum JSON-RPC node

use alloy_primitives::{Address, Bytes, B256};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_sol_types::SolCall;
use alloy_transport::TransportError;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::abi::{self, IERC1271, IOwnable, IRegistry, ERC1271_MAGIC};
use crate::backend::{
    ContractSignatureChecker, CounterfactualDeployer, OwnershipProbe, Registry, ResolverCaller,
    ResolverOutcome,
};
use crate::error::BackendError;

/// ENS registry deployed on mainnet and the major testnets
pub const DEFAULT_REGISTRY: Address = Address::new([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x2e, 0x07, 0x4e, 0xc6, 0x9a, 0x0d, 0xfb, 0x29, 0x97, 0xba,
    0x6c, 0x7d, 0x2e, 0x1e,
]);

/// `eth_call` transaction object
#[derive(Debug, Clone, Serialize)]
struct CallRequest {
    to: Address,
    input: Bytes,
}

/// Client for the registry and resolver contracts of one chain
pub struct RpcBackend {
    client: RpcClient,
    registry: Address,
}

impl RpcBackend {
    pub async fn new(rpc_url: &str, registry: Address) -> anyhow::Result<Self> {
        let client = ClientBuilder::default().connect(rpc_url).await?;
        Ok(Self { client, registry })
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    /// Raw `eth_call` against the latest block
    async fn eth_call(&self, to: Address, input: Bytes) -> Result<Bytes, TransportError> {
        self.client
            .request("eth_call", (CallRequest { to, input }, "latest"))
            .await
    }

    /// `eth_call` with reverts surfaced as outcomes instead of errors
    async fn call_outcome(&self, to: Address, input: Bytes) -> Result<ResolverOutcome, BackendError> {
        match self.eth_call(to, input).await {
            Ok(data) => Ok(ResolverOutcome::Success(data)),
            Err(err) => match err.as_error_resp().and_then(|resp| resp.as_revert_data()) {
                Some(data) => Ok(ResolverOutcome::from_revert(data)),
                None => match err.as_error_resp() {
                    // execution reverted without data
                    Some(resp) if resp.code == 3 || resp.message.contains("revert") => {
                        Ok(ResolverOutcome::Revert(Bytes::new()))
                    }
                    _ => Err(BackendError::new(err.to_string())),
                },
            },
        }
    }

    /// `eth_call` expecting success; reverts are backend errors
    async fn call_success(&self, to: Address, input: Vec<u8>) -> Result<Bytes, BackendError> {
        match self.call_outcome(to, input.into()).await? {
            ResolverOutcome::Success(data) => Ok(data),
            _ => Err(BackendError::new(format!("call to {} reverted", to))),
        }
    }
}

#[async_trait]
impl Registry for RpcBackend {
    async fn node_owner_and_resolver(&self, node: B256) -> Result<(Address, Address), BackendError> {
        let (owner, resolver) = futures::try_join!(
            self.call_success(self.registry, IRegistry::ownerCall { node }.abi_encode()),
            self.call_success(self.registry, IRegistry::resolverCall { node }.abi_encode()),
        )?;
        let owner = abi::decode_address(&owner).map_err(|e| BackendError::new(e.to_string()))?;
        let resolver =
            abi::decode_address(&resolver).map_err(|e| BackendError::new(e.to_string()))?;
        debug!(%node, %owner, %resolver, "Registry lookup");
        Ok((owner, resolver))
    }

    async fn is_contract(&self, address: Address) -> Result<bool, BackendError> {
        let code: Bytes = self
            .client
            .request("eth_getCode", (address, "latest"))
            .await
            .map_err(|e| BackendError::new(e.to_string()))?;
        Ok(!code.is_empty())
    }
}

#[async_trait]
impl ResolverCaller for RpcBackend {
    async fn call(&self, target: Address, payload: Bytes) -> Result<ResolverOutcome, BackendError> {
        self.call_outcome(target, payload).await
    }
}

#[async_trait]
impl OwnershipProbe for RpcBackend {
    async fn owner_of(&self, contract: Address) -> Result<Option<Address>, BackendError> {
        match self
            .call_outcome(contract, IOwnable::ownerCall {}.abi_encode().into())
            .await?
        {
            ResolverOutcome::Success(data) => Ok(abi::decode_address(&data).ok()),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ContractSignatureChecker for RpcBackend {
    async fn is_valid_signature(
        &self,
        contract: Address,
        hash: B256,
        signature: Bytes,
    ) -> Result<bool, BackendError> {
        let call = IERC1271::isValidSignatureCall { hash, signature }.abi_encode();
        match self.call_outcome(contract, call.into()).await? {
            ResolverOutcome::Success(data) => Ok(data.len() >= 32 && data[..4] == ERC1271_MAGIC),
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl CounterfactualDeployer for RpcBackend {
    /// Simulates the factory call; the deployment does not persist into
    /// later `eth_call`s, so only signers the node already sees deployed can
    /// complete an ERC-6492 check here.
    async fn deploy(&self, factory: Address, calldata: Bytes) -> Result<bool, BackendError> {
        Ok(matches!(
            self.call_outcome(factory, calldata).await?,
            ResolverOutcome::Success(_)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_address() {
        assert_eq!(
            DEFAULT_REGISTRY.to_checksum(None),
            "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e"
        );
    }

    #[test]
    fn test_call_request_shape() {
        let request = CallRequest {
            to: Address::repeat_byte(0x11),
            input: Bytes::from_static(&[0xab]),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], "0x1111111111111111111111111111111111111111");
        assert_eq!(json["input"], "0xab");
    }
}
