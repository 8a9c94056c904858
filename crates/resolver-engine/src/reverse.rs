//! Reverse resolution with forward verification
//!
//! A reverse record is only a claim. The name it returns is accepted once
//! that name's address record for the same coin type points back at the
//! queried address.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use tracing::{debug, warn};

use resolver_core::{encode_reverse_name, namehash, COIN_TYPE_DEFAULT};

use crate::abi::INameResolver;
use crate::backend::{Registry, ResolverCaller};
use crate::discovery::Session;
use crate::engine::UniversalResolver;
use crate::error::{ResolutionError, Result};
use crate::gateway::GatewayTransport;
use crate::profile::{decode_name, ProfileQuery};

/// Verified primary name of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseResolution {
    /// Empty when the address has no reverse record
    pub name: String,
    /// Forward resolver that confirmed the name
    pub resolver: Option<Address>,
    /// Resolver holding the reverse record
    pub reverse_resolver: Option<Address>,
}

struct ReverseClaim {
    name: String,
    resolver: Option<Address>,
}

impl<B, T> UniversalResolver<B, T>
where
    B: Registry + ResolverCaller,
    T: GatewayTransport,
{
    /// Primary name of `address` under `coin_type`
    pub async fn reverse(&self, address: &[u8], coin_type: u64) -> Result<ReverseResolution> {
        if address.is_empty() {
            return Err(ResolutionError::EmptyAddress);
        }
        self.timed(async {
            let mut session = Session::new();
            self.reverse_in(&mut session, address, coin_type).await
        })
        .await
    }

    async fn reverse_in(
        &self,
        session: &mut Session,
        address: &[u8],
        coin_type: u64,
    ) -> Result<ReverseResolution> {
        let mut claim = self.reverse_claim(session, address, coin_type).await?;
        if claim.name.is_empty() && self.config().coin_types.falls_back_to_default(coin_type) {
            debug!(coin_type, "No chain-specific reverse record, trying default namespace");
            claim = self
                .reverse_claim(session, address, COIN_TYPE_DEFAULT)
                .await?;
        }

        if claim.name.is_empty() {
            return Ok(ReverseResolution {
                name: String::new(),
                resolver: None,
                reverse_resolver: claim.resolver,
            });
        }

        let forward = resolver_core::encode(&claim.name)?;
        let record = self.address_in(session, &forward, coin_type).await?;
        if record.address.as_ref() != address {
            warn!(
                name = %claim.name,
                claimed = %hex::encode(address),
                forward = %hex::encode(&record.address),
                "Reverse record does not resolve back"
            );
            return Err(ResolutionError::ReverseAddressMismatch {
                name: claim.name,
                address: record.address,
            });
        }

        Ok(ReverseResolution {
            name: claim.name,
            resolver: Some(record.resolver),
            reverse_resolver: claim.resolver,
        })
    }

    /// Name stored on the reverse node, empty when no resolver is set there
    async fn reverse_claim(
        &self,
        session: &mut Session,
        address: &[u8],
        coin_type: u64,
    ) -> Result<ReverseClaim> {
        let reverse_name = encode_reverse_name(address, coin_type)?;
        let node = B256::from(namehash(&reverse_name, 0)?);
        let resolution = match self
            .resolve_in(
                session,
                &reverse_name,
                &[ProfileQuery::name(node)],
                &self.config().batch_gateway_urls,
            )
            .await
        {
            Ok(resolution) => resolution,
            Err(ResolutionError::ResolverNotFound { .. }) => {
                return Ok(ReverseClaim {
                    name: String::new(),
                    resolver: None,
                })
            }
            Err(e) => return Err(e),
        };

        let payload: Bytes = match resolution.results.into_iter().next() {
            Some(result) => result.outcome?,
            None => Bytes::new(),
        };
        let name = decode_name(&payload).ok_or(ResolutionError::UnsupportedResolverProfile {
            selector: INameResolver::nameCall::SELECTOR,
        })?;
        Ok(ReverseClaim {
            name,
            resolver: Some(resolution.resolver),
        })
    }
}
