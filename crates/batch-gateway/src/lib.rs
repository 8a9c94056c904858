//! batch-gateway: CCIP-Read batch gateway
//!
//! Accepts one `query((address,string[],bytes)[])` call, performs every
//! lookup against its own gateway URLs concurrently, and answers with
//! `(bool[] failures, bytes[] responses)` in request order. A lookup that
//! fails carries an ABI-encoded `HttpError(uint16,string)` in its slot.

pub mod config;
pub mod error;
pub mod fanout;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use fanout::{answer_batch, answer_lookup};
pub use routes::create_router;
pub use server::{GatewayServer, ServerBuilder};
pub use state::{create_shared_state, GatewayState, SharedState};
