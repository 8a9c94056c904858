//! Forward resolution
//!
//! Every call runs the same loop over its bundle:
//!
//! 1. dispatch each query to the resolver (legacy: calldata as-is;
//!    extended: `resolve(name, calldata)`), all at once
//! 2. settle slots that answered or reverted
//! 3. collect `OffchainLookup` signals into one gateway round
//! 4. replay each gateway answer through its callback; a callback that
//!    signals again fails closed
//!
//! One round per call, so there is no recursion to bound.

use std::future::Future;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use futures::future::join_all;
use tracing::{debug, info};

use resolver_core::{namehash, ResolverConfig, COIN_TYPE_DEFAULT};

use crate::abi::{self, IExtendedResolver, IMulticallable};
use crate::backend::{OffchainLookup, Registry, ResolverCaller, ResolverOutcome};
use crate::discovery::{find_resolver, Discovery, Session};
use crate::error::{ResolutionError, Result};
use crate::gateway::{BatchRound, EntryStatus, GatewayAnswer, GatewayBatchClient, GatewayTransport};
use crate::profile::{decode_address_record, ProfileQuery};

/// Outcome of one query in a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResult {
    pub status: EntryStatus,
    pub outcome: std::result::Result<Bytes, ResolutionError>,
}

impl ProfileResult {
    fn answered(payload: Bytes, status: EntryStatus) -> Self {
        Self {
            status: status | EntryStatus::DONE,
            outcome: Ok(payload),
        }
    }

    fn failed(error: ResolutionError, status: EntryStatus) -> Self {
        Self {
            status: status | EntryStatus::DONE,
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.outcome.as_ref().ok()
    }
}

/// Answers for a bundle, in query order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub resolver: Address,
    /// Dispatched through `resolve(bytes,bytes)`
    pub extended: bool,
    /// Byte offset of the node the resolver is registered on
    pub offset: usize,
    pub results: Vec<ProfileResult>,
}

/// An address record and the namespace that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Raw address bytes; empty when unset
    pub address: Bytes,
    /// Coin type of the record that answered
    pub coin_type: u64,
    pub resolver: Address,
}

/// One call to the resolver
struct Unit {
    payload: Bytes,
    extended: bool,
    selector: [u8; 4],
}

impl Unit {
    fn new(name: &[u8], query: &ProfileQuery, extended: bool) -> Self {
        let payload = if extended {
            IExtendedResolver::resolveCall {
                name: Bytes::copy_from_slice(name),
                data: query.calldata().clone(),
            }
            .abi_encode()
            .into()
        } else {
            query.calldata().clone()
        };
        Self {
            payload,
            extended,
            selector: query.selector(),
        }
    }

    /// Settle a direct answer or revert
    fn settle(&self, outcome: ResolverOutcome, base: EntryStatus) -> ProfileResult {
        let unsupported = ResolutionError::UnsupportedResolverProfile {
            selector: self.selector,
        };
        match outcome {
            ResolverOutcome::Success(data) => {
                let payload = if self.extended {
                    match abi::decode_bytes(&data) {
                        Ok(inner) => inner,
                        Err(_) => return ProfileResult::failed(unsupported, base),
                    }
                } else {
                    data
                };
                if payload.is_empty() {
                    ProfileResult::failed(unsupported, base | EntryStatus::EMPTY_RESPONSE)
                } else {
                    ProfileResult::answered(payload, base)
                }
            }
            ResolverOutcome::Revert(data) if data.is_empty() => {
                ProfileResult::failed(unsupported, base | EntryStatus::CALL_ERROR)
            }
            ResolverOutcome::Revert(data) => ProfileResult::failed(
                ResolutionError::ResolverError(data),
                base | EntryStatus::CALL_ERROR,
            ),
            ResolverOutcome::OffchainLookup(_) => ProfileResult::failed(
                ResolutionError::OffchainProtocolViolation(
                    "off-chain lookup signalled during continuation".to_string(),
                ),
                base | EntryStatus::OFFCHAIN | EntryStatus::CALL_ERROR,
            ),
        }
    }
}

/// Dotted form of a wire name for error messages
pub(crate) fn display_name(name: &[u8]) -> String {
    resolver_core::decode(name)
        .map(|n| n.to_string())
        .unwrap_or_else(|_| format!("0x{}", hex::encode(name)))
}

/// Name resolution over a registry, its resolvers and a batch gateway
pub struct UniversalResolver<B, T> {
    backend: B,
    gateway: GatewayBatchClient<T>,
    config: ResolverConfig,
}

impl<B, T> UniversalResolver<B, T>
where
    B: Registry + ResolverCaller,
    T: GatewayTransport,
{
    pub fn new(backend: B, transport: T, config: ResolverConfig) -> Self {
        let gateway = GatewayBatchClient::new(transport, Address::from(config.gateway_sender));
        Self {
            backend,
            gateway,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `queries` for the wire-encoded `name` using the configured gateways
    pub async fn resolve(&self, name: &[u8], queries: &[ProfileQuery]) -> Result<Resolution> {
        self.resolve_with_gateways(name, queries, &self.config.batch_gateway_urls)
            .await
    }

    /// Resolve with an explicit batch gateway list
    pub async fn resolve_with_gateways(
        &self,
        name: &[u8],
        queries: &[ProfileQuery],
        gateways: &[String],
    ) -> Result<Resolution> {
        self.timed(async {
            let mut session = Session::new();
            self.resolve_in(&mut session, name, queries, gateways).await
        })
        .await
    }

    /// Skip discovery and query `resolver` directly
    pub async fn resolve_with_resolver(
        &self,
        resolver: Address,
        name: &[u8],
        queries: &[ProfileQuery],
        gateways: &[String],
    ) -> Result<Resolution> {
        self.timed(async {
            namehash(name, 0)?;
            if !self.backend.is_contract(resolver).await? {
                return Err(ResolutionError::ResolverNotContract {
                    name: display_name(name),
                    resolver,
                });
            }
            let mut session = Session::new();
            let extended = session
                .supports_interface(&self.backend, resolver, abi::EXTENDED_RESOLVER_INTERFACE)
                .await?;
            self.dispatch(&mut session, resolver, extended, 0, name, queries, gateways)
                .await
        })
        .await
    }

    /// Address record for `coin_type`, borrowing the default EVM record
    /// when the chain-specific one is unset and policy allows it
    pub async fn resolve_address(&self, name: &[u8], coin_type: u64) -> Result<AddressRecord> {
        self.timed(async {
            let mut session = Session::new();
            self.address_in(&mut session, name, coin_type).await
        })
        .await
    }

    /// Apply the configured caller timeout to a whole call
    pub(crate) async fn timed<F, R>(&self, call: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        match self.config.call_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ResolutionError::Timeout)?,
            None => call.await,
        }
    }

    pub(crate) async fn resolve_in(
        &self,
        session: &mut Session,
        name: &[u8],
        queries: &[ProfileQuery],
        gateways: &[String],
    ) -> Result<Resolution> {
        match find_resolver(&self.backend, name, session).await? {
            Discovery::NotFound => Err(ResolutionError::ResolverNotFound {
                name: display_name(name),
            }),
            Discovery::NotContract { resolver } => Err(ResolutionError::ResolverNotContract {
                name: display_name(name),
                resolver,
            }),
            Discovery::Immediate { resolver, extended } => {
                self.dispatch(session, resolver, extended, 0, name, queries, gateways)
                    .await
            }
            Discovery::Extended { resolver, offset } => {
                self.dispatch(session, resolver, true, offset, name, queries, gateways)
                    .await
            }
        }
    }

    pub(crate) async fn address_in(
        &self,
        session: &mut Session,
        name: &[u8],
        coin_type: u64,
    ) -> Result<AddressRecord> {
        let node = B256::from(namehash(name, 0)?);
        let mut queries = vec![ProfileQuery::address(node, coin_type)];
        let fallback = self.config.coin_types.falls_back_to_default(coin_type);
        if fallback {
            queries.push(ProfileQuery::addr_coin(node, COIN_TYPE_DEFAULT));
        }

        let resolution = self
            .resolve_in(session, name, &queries, &self.config.batch_gateway_urls)
            .await?;
        let decoded: Vec<Result<Bytes>> = resolution
            .results
            .iter()
            .zip(&queries)
            .map(|(result, query)| {
                let payload = result.outcome.clone()?;
                decode_address_record(query, &payload).ok_or(
                    ResolutionError::UnsupportedResolverProfile {
                        selector: query.selector(),
                    },
                )
            })
            .collect();

        let record = |address: Bytes, coin_type: u64| AddressRecord {
            address,
            coin_type,
            resolver: resolution.resolver,
        };
        let mut decoded = decoded.into_iter();
        let primary = decoded
            .next()
            .unwrap_or(Ok(Bytes::new()));
        let default = decoded.next();

        match (primary, default) {
            (Ok(address), _) if !address.is_empty() => Ok(record(address, coin_type)),
            (Ok(_), Some(Ok(address))) if !address.is_empty() => {
                debug!(coin_type, "Using default EVM address record");
                Ok(record(address, COIN_TYPE_DEFAULT))
            }
            (Ok(address), _) => Ok(record(address, coin_type)),
            (Err(ResolutionError::UnsupportedResolverProfile { .. }), Some(Ok(address))) => {
                debug!(coin_type, "Chain-specific profile unsupported, using default record");
                Ok(record(address, COIN_TYPE_DEFAULT))
            }
            (Err(e), _) => Err(e),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        session: &mut Session,
        resolver: Address,
        extended: bool,
        offset: usize,
        name: &[u8],
        queries: &[ProfileQuery],
        gateways: &[String],
    ) -> Result<Resolution> {
        info!(
            name = %display_name(name),
            %resolver,
            extended,
            queries = queries.len(),
            "Resolving"
        );

        let native = extended
            && queries.len() > 1
            && session
                .supports_feature(&self.backend, resolver, abi::multicall_feature().0)
                .await?;

        let combined = if native {
            self.multicall(resolver, name, queries, gateways).await
        } else {
            None
        };
        let results = match combined {
            Some(results) => results,
            None => {
                if native {
                    debug!(%resolver, "Native multicall reverted, dispatching queries separately");
                }
                self.run_units(resolver, self.units(name, queries, extended), gateways)
                    .await
            }
        };

        Ok(Resolution {
            resolver,
            extended,
            offset,
            results,
        })
    }

    fn units(&self, name: &[u8], queries: &[ProfileQuery], extended: bool) -> Vec<Unit> {
        queries
            .iter()
            .map(|query| Unit::new(name, query, extended))
            .collect()
    }

    /// Send the bundle as one `resolve(name, multicall(...))`
    ///
    /// `None` asks for per-query dispatch: the combined call reverted or
    /// answered with the wrong shape without going off-chain. Once the
    /// combined call has used its gateway round, failures apply to every
    /// slot instead.
    async fn multicall(
        &self,
        resolver: Address,
        name: &[u8],
        queries: &[ProfileQuery],
        gateways: &[String],
    ) -> Option<Vec<ProfileResult>> {
        let bundle = ProfileQuery::raw(
            IMulticallable::multicallCall {
                data: queries.iter().map(|q| q.calldata().clone()).collect(),
            }
            .abi_encode(),
        );
        let mut combined = self
            .run_units(resolver, vec![Unit::new(name, &bundle, true)], gateways)
            .await;
        let combined = combined.pop()?;
        let offchain = combined.status.contains(EntryStatus::OFFCHAIN);
        let base = if offchain {
            EntryStatus::OFFCHAIN
        } else {
            EntryStatus::empty()
        };
        let unsupported = |status: EntryStatus| {
            queries
                .iter()
                .map(|query| {
                    ProfileResult::failed(
                        ResolutionError::UnsupportedResolverProfile {
                            selector: query.selector(),
                        },
                        status,
                    )
                })
                .collect::<Vec<_>>()
        };

        match combined.outcome {
            Ok(payload) => {
                let items = match abi::decode_bytes_array(&payload) {
                    Ok(items) if items.len() == queries.len() => items,
                    _ if offchain => return Some(unsupported(combined.status)),
                    _ => return None,
                };
                Some(
                    items
                        .into_iter()
                        .zip(queries)
                        .map(|(item, query)| {
                            if item.is_empty() {
                                ProfileResult::failed(
                                    ResolutionError::UnsupportedResolverProfile {
                                        selector: query.selector(),
                                    },
                                    base | EntryStatus::EMPTY_RESPONSE,
                                )
                            } else {
                                ProfileResult::answered(item, base)
                            }
                        })
                        .collect(),
                )
            }
            Err(ResolutionError::ResolverError(_))
            | Err(ResolutionError::UnsupportedResolverProfile { .. })
                if !offchain =>
            {
                None
            }
            Err(e) => Some(vec![ProfileResult::failed(e, combined.status); queries.len()]),
        }
    }

    /// Dispatch, one gateway round, then callbacks
    async fn run_units(
        &self,
        resolver: Address,
        units: Vec<Unit>,
        gateways: &[String],
    ) -> Vec<ProfileResult> {
        let outcomes = join_all(
            units
                .iter()
                .map(|unit| self.backend.call(resolver, unit.payload.clone())),
        )
        .await;

        let mut results: Vec<Option<ProfileResult>> = vec![None; units.len()];
        let mut round = BatchRound::new();
        let mut waiting: Vec<(usize, OffchainLookup)> = Vec::new();

        for (slot, outcome) in outcomes.into_iter().enumerate() {
            let settled = match outcome {
                Err(e) => ProfileResult::failed(e.into(), EntryStatus::CALL_ERROR),
                Ok(ResolverOutcome::OffchainLookup(lookup)) => {
                    if lookup.sender != resolver {
                        ProfileResult::failed(
                            ResolutionError::OffchainProtocolViolation(format!(
                                "lookup sender {} is not resolver {}",
                                lookup.sender, resolver
                            )),
                            EntryStatus::OFFCHAIN | EntryStatus::CALL_ERROR,
                        )
                    } else if gateways.is_empty() {
                        ProfileResult::failed(
                            ResolutionError::OffchainGatewayUnavailable,
                            EntryStatus::OFFCHAIN | EntryStatus::BATCH_ERROR,
                        )
                    } else {
                        round.push(gateways.to_vec(), lookup.clone());
                        waiting.push((slot, lookup));
                        continue;
                    }
                }
                Ok(outcome) => units[slot].settle(outcome, EntryStatus::empty()),
            };
            results[slot] = Some(settled);
        }

        if !waiting.is_empty() {
            debug!(%resolver, lookups = waiting.len(), "Off-chain round");
            let answers = self.gateway.dispatch(round).await;

            let mut callbacks = Vec::new();
            for ((slot, lookup), answer) in waiting.into_iter().zip(answers) {
                match answer {
                    Ok(GatewayAnswer {
                        failure: false,
                        payload,
                    }) => callbacks.push((slot, lookup.sender, lookup.callback_call(&payload))),
                    Ok(GatewayAnswer {
                        failure: true,
                        payload,
                    }) => {
                        results[slot] = Some(ProfileResult::failed(
                            ResolutionError::ResolverError(payload),
                            EntryStatus::OFFCHAIN | EntryStatus::BATCH_ERROR,
                        ))
                    }
                    Err(e) => {
                        results[slot] = Some(ProfileResult::failed(
                            e,
                            EntryStatus::OFFCHAIN | EntryStatus::BATCH_ERROR,
                        ))
                    }
                }
            }

            let replies = join_all(
                callbacks
                    .iter()
                    .map(|(_, sender, data)| self.backend.call(*sender, data.clone())),
            )
            .await;
            for ((slot, _, _), reply) in callbacks.iter().zip(replies) {
                let settled = match reply {
                    Err(e) => ProfileResult::failed(
                        e.into(),
                        EntryStatus::OFFCHAIN | EntryStatus::CALL_ERROR,
                    ),
                    Ok(ResolverOutcome::OffchainLookup(_)) => ProfileResult::failed(
                        ResolutionError::OffchainProtocolViolation(
                            "callback signalled a second off-chain lookup".to_string(),
                        ),
                        EntryStatus::OFFCHAIN | EntryStatus::CALL_ERROR,
                    ),
                    Ok(outcome) => units[*slot].settle(outcome, EntryStatus::OFFCHAIN),
                };
                results[*slot] = Some(settled);
            }
        }

        results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    ProfileResult::failed(
                        ResolutionError::GatewayTransportError("lookup left unsettled".to_string()),
                        EntryStatus::OFFCHAIN | EntryStatus::BATCH_ERROR,
                    )
                })
            })
            .collect()
    }
}
