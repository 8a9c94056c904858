//! EIP-3668 HTTP request shapes
//!
//! A gateway URL containing `{data}` is fetched with GET after substituting
//! `{sender}` and `{data}`; any other URL receives a POST with the JSON body
//! `{"data": "0x..", "sender": "0x.."}`. Either way the answer is a JSON
//! object whose `data` field holds the hex response.

use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::gateway::GatewayTransport;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Gateway returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// HTTP status to report for this failure (500 when none was received)
    pub fn status(&self) -> u16 {
        match self {
            TransportError::Status { status, .. } => *status,
            _ => 500,
        }
    }

    pub fn message(&self) -> String {
        match self {
            TransportError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct LookupBody {
    data: String,
    sender: String,
}

#[derive(Debug, Deserialize)]
struct LookupAnswer {
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorAnswer {
    message: String,
}

/// Lowercase `0x`-prefixed hex, the form gateways expect in URLs and bodies
fn hex_0x(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Perform one EIP-3668 request against a single gateway URL
pub async fn ccip_read(
    client: &reqwest::Client,
    url: &str,
    sender: Address,
    data: &[u8],
) -> Result<Bytes, TransportError> {
    let sender_hex = hex_0x(sender.as_slice());
    let data_hex = hex_0x(data);

    let request = if url.contains("{data}") {
        let href = url
            .replace("{sender}", &sender_hex)
            .replace("{data}", &data_hex);
        debug!(url = %href, "CCIP-Read GET");
        client.get(href)
    } else {
        let href = url.replace("{sender}", &sender_hex);
        debug!(url = %href, bytes = data.len(), "CCIP-Read POST");
        client.post(href).json(&LookupBody {
            data: data_hex,
            sender: sender_hex,
        })
    };

    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorAnswer>(&text)
            .map(|e| e.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        return Err(TransportError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let answer: LookupAnswer = resp
        .json()
        .await
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
    let hex_data = answer.data.strip_prefix("0x").unwrap_or(&answer.data);
    hex::decode(hex_data)
        .map(Bytes::from)
        .map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

/// [`GatewayTransport`] over HTTP
#[derive(Clone)]
pub struct HttpGatewayTransport {
    client: reqwest::Client,
}

impl HttpGatewayTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatewayTransport for HttpGatewayTransport {
    async fn batch_query(
        &self,
        url: &str,
        sender: Address,
        request: Bytes,
    ) -> Result<Bytes, TransportError> {
        ccip_read(&self.client, url, sender, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_get_substitutes_sender_and_data() {
        let app = Router::new().route(
            "/:sender/:data",
            get(|Path((sender, data)): Path<(String, String)>| async move {
                Json(serde_json::json!({ "data": format!("0x{}{}", &sender[2..4], &data[2..]) }))
            }),
        );
        let addr = serve(app).await;
        let client = reqwest::Client::new();
        let url = format!("http://{}/{{sender}}/{{data}}", addr);

        let out = ccip_read(&client, &url, Address::repeat_byte(0xab), &[0x01, 0x02])
            .await
            .unwrap();
        assert_eq!(out.as_ref(), &[0xab, 0x01, 0x02]);
    }

    #[tokio::test]
    async fn test_post_body_and_error_status() {
        let app = Router::new()
            .route(
                "/ok",
                post(|Json(body): Json<serde_json::Value>| async move {
                    Json(serde_json::json!({ "data": body["data"] }))
                }),
            )
            .route(
                "/missing",
                post(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(serde_json::json!({ "message": "no such record" })),
                    )
                }),
            );
        let addr = serve(app).await;
        let client = reqwest::Client::new();

        let out = ccip_read(&client, &format!("http://{}/ok", addr), Address::ZERO, &[7, 8])
            .await
            .unwrap();
        assert_eq!(out.as_ref(), &[7, 8]);

        let err = ccip_read(&client, &format!("http://{}/missing", addr), Address::ZERO, &[1])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 404,
                message: "no such record".into()
            }
        );
        assert_eq!(err.status(), 404);
    }
}
