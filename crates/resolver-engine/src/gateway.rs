//! Gateway batching for off-chain lookups
//!
//! One resolution round can raise several `OffchainLookup` signals. They are
//! collected into a [`BatchRound`], sent as a single `query(Request[])` per
//! distinct gateway list, and the `(failure, payload)` pairs that come back
//! are scattered to the slot that asked for them.
//!
//! Round lifecycle: collect -> dispatch -> demultiplex -> settle. A transport
//! failure settles every slot of that batch with the same error; a failure
//! flag only settles its own slot.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::abi::{self, IBatchGateway};
use crate::backend::OffchainLookup;
use crate::error::ResolutionError;
use crate::http::TransportError;

/// Per-slot status bitmask
///
/// Tells a caller why a slot ended up the way it did without inspecting
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntryStatus(u8);

impl EntryStatus {
    /// The answer went through an off-chain lookup
    pub const OFFCHAIN: Self = Self(1 << 0);
    /// The resolver call or its callback reverted
    pub const CALL_ERROR: Self = Self(1 << 1);
    /// The gateway failed for this slot or for its whole batch
    pub const BATCH_ERROR: Self = Self(1 << 2);
    /// The resolver answered with no data
    pub const EMPTY_RESPONSE: Self = Self(1 << 3);
    /// The slot reached a terminal state
    pub const DONE: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EntryStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EntryStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::OFFCHAIN, "offchain"),
            (Self::CALL_ERROR, "call_error"),
            (Self::BATCH_ERROR, "batch_error"),
            (Self::EMPTY_RESPONSE, "empty"),
            (Self::DONE, "done"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", set.join("|"))
    }
}

/// Transport for one batch: `httpBatchQuery(url, request) -> response`
///
/// Request and response are opaque ABI bytes at this layer.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn batch_query(
        &self,
        url: &str,
        sender: Address,
        request: Bytes,
    ) -> Result<Bytes, TransportError>;
}

/// Position of a lookup within its round
pub type Ticket = usize;

/// Lookups collected during one round
#[derive(Debug, Default)]
pub struct BatchRound {
    entries: Vec<(Vec<String>, OffchainLookup)>,
}

impl BatchRound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `lookup` for the gateway list `gateways`
    pub fn push(&mut self, gateways: Vec<String>, lookup: OffchainLookup) -> Ticket {
        self.entries.push((gateways, lookup));
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group tickets by gateway list, in first-seen order
    fn groups(&self) -> Vec<(&[String], Vec<Ticket>)> {
        let mut groups: Vec<(&[String], Vec<Ticket>)> = Vec::new();
        for (ticket, (gateways, _)) in self.entries.iter().enumerate() {
            match groups.iter_mut().find(|(key, _)| *key == gateways.as_slice()) {
                Some((_, tickets)) => tickets.push(ticket),
                None => groups.push((gateways.as_slice(), vec![ticket])),
            }
        }
        groups
    }
}

/// What the gateway said about one lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayAnswer {
    pub failure: bool,
    pub payload: Bytes,
}

/// Sends batch rounds over a [`GatewayTransport`]
pub struct GatewayBatchClient<T> {
    transport: T,
    sender: Address,
}

impl<T: GatewayTransport> GatewayBatchClient<T> {
    pub fn new(transport: T, sender: Address) -> Self {
        Self { transport, sender }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Dispatch a round and settle every ticket
    ///
    /// The returned vector is indexed by [`Ticket`].
    pub async fn dispatch(&self, round: BatchRound) -> Vec<Result<GatewayAnswer, ResolutionError>> {
        let groups = round.groups();
        info!(
            lookups = round.len(),
            batches = groups.len(),
            "Dispatching gateway round"
        );

        let batches = groups.iter().map(|(gateways, tickets)| {
            let requests: Vec<IBatchGateway::Request> = tickets
                .iter()
                .map(|&ticket| {
                    let lookup = &round.entries[ticket].1;
                    IBatchGateway::Request {
                        sender: lookup.sender,
                        urls: lookup.urls.clone(),
                        data: lookup.call_data.clone(),
                    }
                })
                .collect();
            self.send_batch(gateways, requests)
        });
        let settled = join_all(batches).await;

        let mut results: Vec<Option<Result<GatewayAnswer, ResolutionError>>> =
            vec![None; round.len()];
        for ((_, tickets), outcome) in groups.iter().zip(settled) {
            match outcome {
                Ok(answers) => {
                    for (&ticket, answer) in tickets.iter().zip(answers) {
                        results[ticket] = Some(Ok(answer));
                    }
                }
                Err(err) => {
                    for &ticket in tickets {
                        results[ticket] = Some(Err(err.clone()));
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(ResolutionError::GatewayTransportError(
                        "lookup left unsettled".to_string(),
                    ))
                })
            })
            .collect()
    }

    /// Send one batch, failing over across `gateways` in order
    async fn send_batch(
        &self,
        gateways: &[String],
        requests: Vec<IBatchGateway::Request>,
    ) -> Result<Vec<GatewayAnswer>, ResolutionError> {
        if gateways.is_empty() {
            return Err(ResolutionError::OffchainGatewayUnavailable);
        }

        let expected = requests.len();
        let body: Bytes = IBatchGateway::queryCall { requests }.abi_encode().into();
        let mut last_error = None;

        for url in gateways {
            debug!(gateway = %url, requests = expected, "Sending gateway batch");
            let response = match self.transport.batch_query(url, self.sender, body.clone()).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(gateway = %url, error = %e, "Gateway batch failed, trying next");
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            match abi::decode_batch_response(&response) {
                Ok((failures, responses))
                    if failures.len() == expected && responses.len() == expected =>
                {
                    return Ok(failures
                        .into_iter()
                        .zip(responses)
                        .map(|(failure, payload)| GatewayAnswer { failure, payload })
                        .collect());
                }
                Ok((failures, responses)) => {
                    warn!(
                        gateway = %url,
                        expected,
                        failures = failures.len(),
                        responses = responses.len(),
                        "Gateway batch size mismatch"
                    );
                    last_error = Some(format!(
                        "{} answered {} of {} lookups",
                        url,
                        responses.len(),
                        expected
                    ));
                }
                Err(e) => {
                    warn!(gateway = %url, error = %e, "Malformed gateway batch response");
                    last_error = Some(format!("{}: malformed response: {}", url, e));
                }
            }
        }

        Err(ResolutionError::GatewayTransportError(
            last_error.unwrap_or_else(|| "no gateway answered".to_string()),
        ))
    }
}
