//! Metrics collection for the API service.
//!
//! Each [`ServiceMetrics`] owns its own Prometheus registry so that several
//! routers (for example in tests) can coexist in one process.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::{sync::Arc, time::Duration};

/// Outcome label for a successful secret operation
pub const OUTCOME_SUCCESS: &str = "success";

/// Service metrics for observability
#[derive(Debug, Clone)]
pub struct ServiceMetrics {
    registry: Registry,

    // HTTP request metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration: HistogramVec,

    // Secret operation metrics
    pub secret_operations_total: IntCounterVec,
    pub secret_operation_duration: HistogramVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "status"],
        )?;
        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request processing time",
            )
            .buckets(vec![0.001, 0.01, 0.1, 1.0, 10.0]),
            &["method"],
        )?;
        let secret_operations_total = IntCounterVec::new(
            Opts::new(
                "secret_operations_total",
                "Secret operations by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;
        let secret_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "secret_operation_duration_seconds",
                "Secret operation processing time",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(secret_operations_total.clone()))?;
        registry.register(Box::new(secret_operation_duration.clone()))?;

        Ok(Arc::new(Self {
            registry,
            http_requests_total,
            http_request_duration,
            secret_operations_total,
            secret_operation_duration,
        }))
    }

    pub fn record_http_request(&self, method: &str, status: u16, duration: Duration) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.http_request_duration
            .with_label_values(&[method])
            .observe(duration.as_secs_f64());
    }

    /// Record one secret request
    ///
    /// `outcome` is [`OUTCOME_SUCCESS`] or the error kind.
    pub fn record_secret_operation(&self, operation: &str, outcome: &str, duration: Duration) {
        self.secret_operations_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.secret_operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
