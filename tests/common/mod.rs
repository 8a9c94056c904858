//! Shared harness: a mock CCIP-Read server and the batch gateway on local ports

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use alloy_sol_types::SolCall;
use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use batch_gateway::{create_router, create_shared_state, GatewayConfig};
use resolver_engine::abi::{self, ITextResolver};
use serde::Deserialize;
use tokio::net::TcpListener;

static PORT_COUNTER: AtomicU16 = AtomicU16::new(19300);

pub fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A running server that stops when dropped
pub struct TestServer {
    pub url: String,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

pub async fn spawn(router: Router) -> TestServer {
    let port = next_port();
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let listener = TcpListener::bind(addr).await.expect("Bind should succeed");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    for _ in 0..10 {
        if reqwest::Client::new()
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    TestServer {
        url: format!("http://127.0.0.1:{}", port),
        _shutdown: shutdown_tx,
    }
}

#[derive(Deserialize)]
struct LookupBody {
    data: String,
}

/// Answer `text(node, key)` with `"offchain:<key>"`; key `missing` is a 404
fn answer(data: &str) -> Response {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    let Ok(bytes) = hex::decode(digits) else {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "message": "bad hex" })))
            .into_response();
    };
    let Ok(call) = ITextResolver::textCall::abi_decode(&bytes) else {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "message": "unknown call" })))
            .into_response();
    };
    if call.key == "missing" {
        return (StatusCode::NOT_FOUND, Json(serde_json::json!({ "message": "record not found" })))
            .into_response();
    }
    let value = abi::encode_string(&format!("offchain:{}", call.key));
    Json(serde_json::json!({ "data": format!("0x{}", hex::encode(value)) })).into_response()
}

/// Mock CCIP-Read server: `POST /lookup`, `GET /lookup/:sender/:data`, `POST /broken`
pub async fn spawn_ccip_server() -> TestServer {
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/lookup",
            post(|Json(body): Json<LookupBody>| async move { answer(&body.data) }),
        )
        .route(
            "/lookup/:sender/:data",
            get(|Path((_sender, data)): Path<(String, String)>| async move { answer(&data) }),
        )
        .route(
            "/broken",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down").into_response() }),
        );
    spawn(router).await
}

/// Batch gateway on a fresh port
pub async fn spawn_batch_gateway(config: GatewayConfig) -> TestServer {
    let state = create_shared_state(config).expect("Gateway state should build");
    spawn(create_router(state)).await
}
