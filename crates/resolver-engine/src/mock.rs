//! In-memory registry, resolvers and gateway for tests
//!
//! Enabled for unit tests and, through the `test-utils` feature, for the
//! workspace integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::{Address, Bytes, FixedBytes, Signature, B256};
use alloy_sol_types::{SolCall, SolError, SolValue};
use async_trait::async_trait;

use resolver_core::{COIN_TYPE_ETH, Node};

use crate::abi::{self, IBatchGateway, IERC165, IExtendedResolver, IFeatureSupporter, IMulticallable};
use crate::backend::{
    ContractSignatureChecker, CounterfactualDeployer, OffchainLookup, OwnershipProbe, Registry,
    ResolverCaller, ResolverOutcome,
};
use crate::error::BackendError;
use crate::gateway::GatewayTransport;
use crate::http::TransportError;
use crate::profile::ProfileQuery;

/// Callback selector used by off-chain mock resolvers
pub const MOCK_CALLBACK: [u8; 4] = [0xca, 0x11, 0xba, 0xc4];

#[derive(Debug, Clone)]
enum Answer {
    Value(Bytes),
    Revert(Bytes),
}

#[derive(Debug, Clone, Default)]
struct Offchain {
    urls: Vec<String>,
    sender: Option<Address>,
    signal_twice: bool,
}

/// Scripted resolver contract keyed by exact profile calldata
#[derive(Debug, Clone, Default)]
pub struct MockResolver {
    extended: bool,
    multicall: bool,
    records: HashMap<Bytes, Answer>,
    offchain: Option<Offchain>,
}

impl MockResolver {
    /// Answers profile calldata directly
    pub fn legacy() -> Self {
        Self::default()
    }

    /// Answers through `resolve(bytes,bytes)`
    pub fn extended() -> Self {
        Self {
            extended: true,
            ..Self::default()
        }
    }

    /// Also answer `resolve(name, multicall(...))` natively
    pub fn with_multicall(mut self) -> Self {
        self.multicall = true;
        self
    }

    /// Every profile call signals `OffchainLookup` towards `urls`
    pub fn offchain(mut self, urls: Vec<String>) -> Self {
        self.offchain = Some(Offchain {
            urls,
            ..Offchain::default()
        });
        self
    }

    /// Report `sender` in lookups instead of the resolver's own address
    pub fn spoof_sender(mut self, sender: Address) -> Self {
        if let Some(offchain) = self.offchain.as_mut() {
            offchain.sender = Some(sender);
        }
        self
    }

    /// The callback signals another lookup instead of answering
    pub fn signal_twice(mut self) -> Self {
        if let Some(offchain) = self.offchain.as_mut() {
            offchain.signal_twice = true;
        }
        self
    }

    pub fn with_record(mut self, query: &ProfileQuery, value: impl Into<Bytes>) -> Self {
        self.records
            .insert(query.calldata().clone(), Answer::Value(value.into()));
        self
    }

    pub fn with_revert(mut self, query: &ProfileQuery, data: impl Into<Bytes>) -> Self {
        self.records
            .insert(query.calldata().clone(), Answer::Revert(data.into()));
        self
    }

    /// Address record in the ABI shape of its profile
    pub fn with_addr(self, node: Node, coin_type: u64, address: &[u8]) -> Self {
        let query = ProfileQuery::address(B256::from(node), coin_type);
        let value = if coin_type == COIN_TYPE_ETH {
            abi::encode_address(Address::from_slice(address))
        } else {
            abi::encode_bytes(address)
        };
        self.with_record(&query, value)
    }

    pub fn with_name(self, node: Node, name: &str) -> Self {
        self.with_record(&ProfileQuery::name(B256::from(node)), abi::encode_string(name))
    }

    pub fn with_text(self, node: Node, key: &str, value: &str) -> Self {
        self.with_record(&ProfileQuery::text(B256::from(node), key), abi::encode_string(value))
    }

    fn answer(&self, calldata: &[u8]) -> Option<&Answer> {
        self.records.get(calldata)
    }

    fn handle(&self, me: Address, payload: &[u8]) -> ResolverOutcome {
        if let Ok(call) = IERC165::supportsInterfaceCall::abi_decode(payload) {
            let id: [u8; 4] = call.interfaceId.into();
            let yes = id == abi::ERC165_INTERFACE
                || (self.extended && id == abi::EXTENDED_RESOLVER_INTERFACE);
            return ResolverOutcome::Success(abi::encode_bool(yes));
        }
        if let Ok(call) = IFeatureSupporter::supportsFeatureCall::abi_decode(payload) {
            let yes = self.multicall && call.feature == abi::multicall_feature();
            return ResolverOutcome::Success(abi::encode_bool(yes));
        }

        if let Some(offchain) = &self.offchain {
            if payload.starts_with(&MOCK_CALLBACK) {
                let Ok((response, extra)) =
                    <(Bytes, Bytes) as SolValue>::abi_decode_params(&payload[4..])
                else {
                    return ResolverOutcome::Revert(Bytes::new());
                };
                if offchain.signal_twice {
                    return self.signal(me, offchain, response, extra);
                }
                return ResolverOutcome::Success(if self.extended {
                    abi::encode_bytes(&response)
                } else {
                    response
                });
            }
            let inner = if self.extended {
                match IExtendedResolver::resolveCall::abi_decode(payload) {
                    Ok(call) => call.data,
                    Err(_) => return ResolverOutcome::Revert(Bytes::new()),
                }
            } else {
                Bytes::copy_from_slice(payload)
            };
            return self.signal(me, offchain, inner, Bytes::copy_from_slice(payload));
        }

        if !self.extended {
            return match self.answer(payload) {
                Some(Answer::Value(v)) => ResolverOutcome::Success(v.clone()),
                Some(Answer::Revert(r)) => ResolverOutcome::Revert(r.clone()),
                None => ResolverOutcome::Revert(Bytes::new()),
            };
        }

        let Ok(call) = IExtendedResolver::resolveCall::abi_decode(payload) else {
            return ResolverOutcome::Revert(Bytes::new());
        };
        if self.multicall {
            if let Ok(batch) = IMulticallable::multicallCall::abi_decode(&call.data) {
                let mut results = Vec::with_capacity(batch.data.len());
                for item in &batch.data {
                    match self.answer(item) {
                        Some(Answer::Value(v)) => results.push(v.clone()),
                        Some(Answer::Revert(r)) => return ResolverOutcome::Revert(r.clone()),
                        None => results.push(Bytes::new()),
                    }
                }
                return ResolverOutcome::Success(abi::encode_bytes(&abi::encode_bytes_array(
                    &results,
                )));
            }
        }
        match self.answer(&call.data) {
            Some(Answer::Value(v)) => ResolverOutcome::Success(abi::encode_bytes(v)),
            Some(Answer::Revert(r)) => ResolverOutcome::Revert(r.clone()),
            None => ResolverOutcome::Revert(Bytes::new()),
        }
    }

    fn signal(&self, me: Address, offchain: &Offchain, call_data: Bytes, extra: Bytes) -> ResolverOutcome {
        let lookup = OffchainLookup {
            sender: offchain.sender.unwrap_or(me),
            urls: offchain.urls.clone(),
            call_data,
            callback: FixedBytes::from(MOCK_CALLBACK),
            extra_data: extra,
        };
        ResolverOutcome::Revert(lookup.encode())
    }
}

#[derive(Default)]
struct State {
    registry: HashMap<B256, (Address, Address)>,
    code: HashSet<Address>,
    resolvers: HashMap<Address, MockResolver>,
    owners: HashMap<Address, Address>,
    wallets: HashMap<Address, Address>,
    counterfactual: HashMap<(Address, Bytes), Address>,
    calls: Vec<(Address, Bytes)>,
}

/// In-memory chain implementing every collaborator trait
#[derive(Default)]
pub struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deploy a resolver at `address`
    pub fn add_resolver(&self, address: Address, resolver: MockResolver) {
        let mut state = self.state();
        state.code.insert(address);
        state.resolvers.insert(address, resolver);
    }

    pub fn set_resolver(&self, node: B256, resolver: Address) {
        self.state().registry.insert(node, (Address::ZERO, resolver));
    }

    /// `owner()` of an ownable contract
    pub fn set_owner(&self, contract: Address, owner: Address) {
        let mut state = self.state();
        state.code.insert(contract);
        state.owners.insert(contract, owner);
    }

    /// Deployed ERC-1271 wallet accepting signatures by `owner`
    pub fn add_wallet(&self, wallet: Address, owner: Address) {
        let mut state = self.state();
        state.code.insert(wallet);
        state.wallets.insert(wallet, owner);
    }

    /// ERC-1271 wallet that exists once `factory` is called with `calldata`
    pub fn add_counterfactual_wallet(
        &self,
        factory: Address,
        calldata: Bytes,
        wallet: Address,
        owner: Address,
    ) {
        let mut state = self.state();
        state.wallets.insert(wallet, owner);
        state.counterfactual.insert((factory, calldata), wallet);
    }

    pub fn is_deployed(&self, address: Address) -> bool {
        self.state().code.contains(&address)
    }

    /// Calls made to `target` so far, probes included
    pub fn calls_to(&self, target: Address) -> usize {
        self.state().calls.iter().filter(|(to, _)| *to == target).count()
    }
}

#[async_trait]
impl Registry for MockChain {
    async fn node_owner_and_resolver(&self, node: B256) -> Result<(Address, Address), BackendError> {
        Ok(self
            .state()
            .registry
            .get(&node)
            .copied()
            .unwrap_or((Address::ZERO, Address::ZERO)))
    }

    async fn is_contract(&self, address: Address) -> Result<bool, BackendError> {
        Ok(self.state().code.contains(&address))
    }
}

#[async_trait]
impl ResolverCaller for MockChain {
    async fn call(&self, target: Address, payload: Bytes) -> Result<ResolverOutcome, BackendError> {
        let mut state = self.state();
        state.calls.push((target, payload.clone()));
        let outcome = match state.resolvers.get(&target) {
            Some(resolver) => resolver.handle(target, &payload),
            None => ResolverOutcome::Success(Bytes::new()),
        };
        Ok(match outcome {
            ResolverOutcome::Revert(data) => ResolverOutcome::from_revert(data),
            other => other,
        })
    }
}

#[async_trait]
impl OwnershipProbe for MockChain {
    async fn owner_of(&self, contract: Address) -> Result<Option<Address>, BackendError> {
        Ok(self.state().owners.get(&contract).copied())
    }
}

#[async_trait]
impl ContractSignatureChecker for MockChain {
    async fn is_valid_signature(
        &self,
        contract: Address,
        hash: B256,
        signature: Bytes,
    ) -> Result<bool, BackendError> {
        let state = self.state();
        if !state.code.contains(&contract) {
            return Ok(false);
        }
        let Some(owner) = state.wallets.get(&contract) else {
            return Ok(false);
        };
        let recovered = Signature::from_raw(&signature)
            .ok()
            .and_then(|sig| sig.recover_address_from_prehash(&hash).ok());
        Ok(recovered == Some(*owner))
    }
}

#[async_trait]
impl CounterfactualDeployer for MockChain {
    async fn deploy(&self, factory: Address, calldata: Bytes) -> Result<bool, BackendError> {
        let mut state = self.state();
        match state.counterfactual.remove(&(factory, calldata)) {
            Some(wallet) => {
                state.code.insert(wallet);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory batch gateway answering lookups by their call data
///
/// Unknown call data settles as a per-slot `HttpError(404)` failure.
#[derive(Default)]
pub struct MockGateway {
    answers: HashMap<Bytes, Bytes>,
    down: HashSet<String>,
    batches: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, call_data: impl Into<Bytes>, response: impl Into<Bytes>) -> Self {
        self.answers.insert(call_data.into(), response.into());
        self
    }

    /// Fail every batch sent to `url` at the transport
    pub fn with_down(mut self, url: &str) -> Self {
        self.down.insert(url.to_string());
        self
    }

    /// Batches received (failed transports included)
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayTransport for MockGateway {
    async fn batch_query(
        &self,
        url: &str,
        _sender: Address,
        request: Bytes,
    ) -> Result<Bytes, TransportError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if self.down.contains(url) {
            return Err(TransportError::Http(format!("{} is down", url)));
        }
        let call = IBatchGateway::queryCall::abi_decode(&request)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        let (failures, responses): (Vec<bool>, Vec<Bytes>) = call
            .requests
            .iter()
            .map(|req| match self.answers.get(&req.data) {
                Some(response) => (false, response.clone()),
                None => (
                    true,
                    abi::HttpError {
                        status: 404,
                        message: "not found".to_string(),
                    }
                    .abi_encode()
                    .into(),
                ),
            })
            .unzip();
        Ok(abi::encode_batch_response(failures, responses))
    }
}

/// Gateway that accepts batches and never answers
///
/// Counts batches that were started and batches whose pending request was
/// dropped by the caller.
#[derive(Default)]
pub struct StalledGateway {
    started: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl StalledGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayTransport for StalledGateway {
    async fn batch_query(
        &self,
        _url: &str,
        _sender: Address,
        _request: Bytes,
    ) -> Result<Bytes, TransportError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _pending = DropCounter(self.dropped.clone());
        std::future::pending().await
    }
}
