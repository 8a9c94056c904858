//! Prometheus metrics for the batch gateway
//!
//! Only outcome labels and sizes are recorded, never lookup data or URLs.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_FAILED: &str = "failed";
pub const OUTCOME_CLIENT_ERROR: &str = "client_error";

pub fn record_batch(outcome: &str, size: usize, duration: Duration) {
    counter!("gateway_batches_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("gateway_batch_size").record(size as f64);
    histogram!("gateway_batch_duration_seconds", "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_lookup(outcome: &str, duration: Duration) {
    counter!("gateway_lookups_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("gateway_lookup_duration_seconds", "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());
}

/// Holds one slot of `gateway_batches_in_flight` until dropped
///
/// A handler dropped mid-batch (client gone) still releases its slot.
pub struct InFlightBatch(());

impl InFlightBatch {
    pub fn start() -> Self {
        gauge!("gateway_batches_in_flight").increment(1.0);
        Self(())
    }
}

impl Drop for InFlightBatch {
    fn drop(&mut self) {
        gauge!("gateway_batches_in_flight").decrement(1.0);
    }
}

pub fn init_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_released_on_drop() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            let batch = InFlightBatch::start();
            assert!(handle.render().contains("gateway_batches_in_flight 1"));
            drop(batch);
        });
        assert!(handle.render().contains("gateway_batches_in_flight 0"));
    }
}
