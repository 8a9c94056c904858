//! HTTP routes for the batch gateway
//!
//! `POST /` takes the EIP-3668 body `{"data", "sender"}`;
//! `GET /:sender/:data` serves gateway URLs written as `{sender}/{data}`.

use std::time::Instant;

use alloy_primitives::Bytes;
use alloy_sol_types::SolCall;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use resolver_engine::abi::IBatchGateway;

use crate::error::{GatewayError, Result};
use crate::fanout::answer_batch;
use crate::metrics;
use crate::state::SharedState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// EIP-3668 POST body
#[derive(Deserialize)]
pub struct LookupRequest {
    pub data: String,
    #[serde(default)]
    pub sender: Option<String>,
}

/// EIP-3668 response body
#[derive(Serialize, Deserialize)]
pub struct LookupResponse {
    pub data: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics_handler(State(state): State<SharedState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn parse_hex(value: &str) -> Result<Bytes> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid hex: {}", e)))
}

async fn handle_batch(state: &SharedState, data: &str) -> Result<Json<LookupResponse>> {
    let started = Instant::now();
    let call = IBatchGateway::queryCall::abi_decode(&parse_hex(data)?).map_err(|e| {
        metrics::record_batch(metrics::OUTCOME_CLIENT_ERROR, 0, started.elapsed());
        GatewayError::InvalidRequest(format!("not a batch query: {}", e))
    })?;

    let count = call.requests.len();
    if count > state.config.max_batch_size {
        metrics::record_batch(metrics::OUTCOME_CLIENT_ERROR, count, started.elapsed());
        return Err(GatewayError::BatchTooLarge {
            count,
            max: state.config.max_batch_size,
        });
    }

    let in_flight = metrics::InFlightBatch::start();
    let response = answer_batch(&state.client, &call.requests).await;
    drop(in_flight);
    metrics::record_batch(metrics::OUTCOME_OK, count, started.elapsed());
    info!(lookups = count, elapsed_ms = started.elapsed().as_millis() as u64, "Batch answered");

    Ok(Json(LookupResponse {
        data: format!("0x{}", hex::encode(response)),
    }))
}

async fn batch_post(
    State(state): State<SharedState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<LookupResponse>> {
    handle_batch(&state, &req.data).await
}

async fn batch_get(
    State(state): State<SharedState>,
    Path((_sender, data)): Path<(String, String)>,
) -> Result<Json<LookupResponse>> {
    let data = data.strip_suffix(".json").unwrap_or(&data);
    handle_batch(&state, data).await
}

/// Create the router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(batch_post))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/:sender/:data", get(batch_get))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
