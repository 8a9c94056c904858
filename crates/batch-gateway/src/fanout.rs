//! Per-lookup fan-out
//!
//! Each lookup tries its own URLs in order. A 4xx answer is final for that
//! lookup; a 5xx or transport failure moves on to the next URL.

use std::time::Instant;

use alloy_primitives::Bytes;
use alloy_sol_types::SolError;
use futures::future::join_all;
use tracing::{debug, warn};

use resolver_engine::abi::{self, HttpError, IBatchGateway};
use resolver_engine::{ccip_read, TransportError};

use crate::metrics;

/// Perform one lookup, returning `(failure, payload)`
pub async fn answer_lookup(client: &reqwest::Client, request: &IBatchGateway::Request) -> (bool, Bytes) {
    let started = Instant::now();
    let mut last_error = TransportError::Status {
        status: 404,
        message: "no gateway urls".to_string(),
    };

    for url in &request.urls {
        match ccip_read(client, url, request.sender, &request.data).await {
            Ok(response) => {
                debug!(sender = %request.sender, bytes = response.len(), "Lookup answered");
                metrics::record_lookup(metrics::OUTCOME_OK, started.elapsed());
                return (false, response);
            }
            Err(e) => {
                warn!(sender = %request.sender, error = %e, "Lookup URL failed");
                let is_final = matches!(e, TransportError::Status { status, .. } if (400..500).contains(&status));
                last_error = e;
                if is_final {
                    break;
                }
            }
        }
    }

    metrics::record_lookup(metrics::OUTCOME_FAILED, started.elapsed());
    let error = HttpError {
        status: last_error.status(),
        message: last_error.message(),
    };
    (true, error.abi_encode().into())
}

/// Answer a whole batch in request order
pub async fn answer_batch(client: &reqwest::Client, requests: &[IBatchGateway::Request]) -> Bytes {
    let answers = join_all(requests.iter().map(|request| answer_lookup(client, request))).await;
    let (failures, responses): (Vec<bool>, Vec<Bytes>) = answers.into_iter().unzip();
    abi::encode_batch_response(failures, responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[tokio::test]
    async fn test_lookup_without_urls_fails_in_slot() {
        let client = reqwest::Client::new();
        let request = IBatchGateway::Request {
            sender: Address::ZERO,
            urls: Vec::new(),
            data: Bytes::from_static(&[1]),
        };
        let (failure, payload) = answer_lookup(&client, &request).await;
        assert!(failure);
        let error = HttpError::abi_decode(&payload).unwrap();
        assert_eq!(error.status, 404);
    }

    #[tokio::test]
    async fn test_unreachable_url_reports_500() {
        let client = reqwest::Client::new();
        let request = IBatchGateway::Request {
            sender: Address::ZERO,
            urls: vec!["http://127.0.0.1:1/".to_string()],
            data: Bytes::from_static(&[1]),
        };
        let batch = answer_batch(&client, &[request]).await;
        let (failures, responses) = abi::decode_batch_response(&batch).unwrap();
        assert_eq!(failures, vec![true]);
        assert_eq!(HttpError::abi_decode(&responses[0]).unwrap().status, 500);
    }
}
