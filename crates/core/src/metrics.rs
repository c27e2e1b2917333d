//! Metrics definitions for the API.
//!
//! This module defines all metrics used throughout the service.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "graphql_requests_total",
        "Total number of GraphQL requests executed"
    );
    describe_histogram!(
        "graphql_request_duration_seconds",
        "Time taken to execute a GraphQL request in seconds"
    );
    describe_counter!(
        "loader_batches_total",
        "Total number of grouped queries dispatched by relation loaders"
    );
    describe_histogram!(
        "loader_batch_size",
        "Number of parents coalesced into one grouped query"
    );
    describe_counter!(
        "store_errors_total",
        "Total number of failed storage operations"
    );
}

/// Record an executed GraphQL request.
pub fn record_graphql_request() {
    counter!("graphql_requests_total").increment(1);
}

/// Record a dispatched loader batch.
///
/// # Arguments
/// * `relation` - The relation key, e.g. "post.comments"
/// * `size` - Number of parents coalesced into the grouped query
pub fn record_loader_batch(relation: &str, size: usize) {
    counter!("loader_batches_total", "relation" => relation.to_string()).increment(1);
    histogram!("loader_batch_size", "relation" => relation.to_string()).record(size as f64);
}

/// Record a failed storage operation.
///
/// # Arguments
/// * `operation` - The failing operation, e.g. "list_posts"
pub fn record_store_error(operation: &'static str) {
    counter!("store_errors_total", "operation" => operation).increment(1);
}

/// A timer that records request duration when dropped.
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Start a new request timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for RequestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        histogram!("graphql_request_duration_seconds").record(duration);
    }
}
