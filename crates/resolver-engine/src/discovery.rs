//! Resolver discovery (ENSIP-10 wildcard walk)
//!
//! The exact node's resolver wins outright. Above it, an ancestor's resolver
//! is only eligible when it answers the extended `resolve(bytes,bytes)`
//! entry point, since a legacy resolver cannot know which descendant it is
//! being asked about.

use std::collections::HashMap;

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolCall;
use tracing::debug;

use resolver_core::{namehash, read_label};

use crate::abi::{self, IERC165, IFeatureSupporter, EXTENDED_RESOLVER_INTERFACE};
use crate::backend::{Registry, ResolverCaller, ResolverOutcome};
use crate::error::{BackendError, ResolutionError};

/// Where a name's resolver was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Set on the exact node; `extended` when it also speaks ENSIP-10
    Immediate { resolver: Address, extended: bool },
    /// Set on an ancestor starting at byte `offset` of the name
    Extended { resolver: Address, offset: usize },
    /// A resolver is set but has no code
    NotContract { resolver: Address },
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Capability {
    Interface([u8; 4]),
    Feature([u8; 4]),
}

/// Capability answers for the duration of one call
///
/// Dropped with the call; nothing is shared between resolutions.
#[derive(Debug, Default)]
pub struct Session {
    probes: HashMap<(Address, Capability), bool>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct probes answered so far
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// ERC-165 `supportsInterface(interface)`; a revert or garbage means no
    pub async fn supports_interface<C>(
        &mut self,
        caller: &C,
        resolver: Address,
        interface: [u8; 4],
    ) -> Result<bool, BackendError>
    where
        C: ResolverCaller + ?Sized,
    {
        let payload = IERC165::supportsInterfaceCall {
            interfaceId: interface.into(),
        }
        .abi_encode();
        self.probe(caller, resolver, Capability::Interface(interface), payload)
            .await
    }

    /// `supportsFeature(feature)`; a revert or garbage means no
    pub async fn supports_feature<C>(
        &mut self,
        caller: &C,
        resolver: Address,
        feature: [u8; 4],
    ) -> Result<bool, BackendError>
    where
        C: ResolverCaller + ?Sized,
    {
        let payload = IFeatureSupporter::supportsFeatureCall {
            feature: feature.into(),
        }
        .abi_encode();
        self.probe(caller, resolver, Capability::Feature(feature), payload)
            .await
    }

    async fn probe<C>(
        &mut self,
        caller: &C,
        resolver: Address,
        capability: Capability,
        payload: Vec<u8>,
    ) -> Result<bool, BackendError>
    where
        C: ResolverCaller + ?Sized,
    {
        if let Some(&answer) = self.probes.get(&(resolver, capability)) {
            return Ok(answer);
        }
        let answer = match caller.call(resolver, payload.into()).await? {
            ResolverOutcome::Success(data) => abi::decode_bool(&data).unwrap_or(false),
            _ => false,
        };
        debug!(%resolver, ?capability, answer, "Capability probe");
        self.probes.insert((resolver, capability), answer);
        Ok(answer)
    }
}

/// Find the resolver responsible for the wire-encoded `name`
pub async fn find_resolver<B>(
    backend: &B,
    name: &[u8],
    session: &mut Session,
) -> Result<Discovery, ResolutionError>
where
    B: Registry + ResolverCaller + ?Sized,
{
    // Rejects malformed names before any lookup
    namehash(name, 0)?;

    let mut offsets = Vec::new();
    let mut cursor = 0;
    loop {
        let (size, next) = read_label(name, cursor)?;
        offsets.push(cursor);
        if size == 0 {
            break;
        }
        cursor = next;
    }

    let mut without_code = None;
    for (depth, &offset) in offsets.iter().enumerate() {
        let node = B256::from(namehash(name, offset)?);
        let (_, resolver) = backend.node_owner_and_resolver(node).await?;
        if resolver.is_zero() {
            continue;
        }

        if !backend.is_contract(resolver).await? {
            debug!(%resolver, offset, "Resolver has no code");
            if depth == 0 {
                return Ok(Discovery::NotContract { resolver });
            }
            without_code.get_or_insert(resolver);
            continue;
        }

        let extended = session
            .supports_interface(backend, resolver, EXTENDED_RESOLVER_INTERFACE)
            .await?;
        if depth == 0 {
            return Ok(Discovery::Immediate { resolver, extended });
        }
        if extended {
            return Ok(Discovery::Extended { resolver, offset });
        }
        debug!(%resolver, offset, "Ancestor resolver is not wildcard-capable");
    }

    Ok(match without_code {
        Some(resolver) => Discovery::NotContract { resolver },
        None => Discovery::NotFound,
    })
}
