//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // OAuth flow
    pub static ref OAUTH_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("github_oauth_demo_oauth_events_total", "OAuth flow transitions by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // GitHub API
    pub static ref PROVIDER_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("github_oauth_demo_provider_requests_total", "Total number of requests sent to GitHub"),
        &["method", "status"]
    ).expect("metric can be created");
    pub static ref PROVIDER_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "github_oauth_demo_provider_request_duration_seconds",
            "GitHub request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method"]
    ).expect("metric can be created");

    // Errors
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("github_oauth_demo_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Record an OAuth flow transition (`login`, `authenticated`, `invalid_state`, ...)
pub fn record_oauth_event(outcome: &str) {
    OAUTH_EVENTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Initialize metrics registry.
///
/// Safe to call more than once; later calls leave the registry untouched.
pub fn init_metrics() {
    let collectors: [(&str, Box<dyn prometheus::core::Collector>); 4] = [
        ("OAUTH_EVENTS_TOTAL", Box::new(OAUTH_EVENTS_TOTAL.clone())),
        ("PROVIDER_REQUESTS_TOTAL", Box::new(PROVIDER_REQUESTS_TOTAL.clone())),
        (
            "PROVIDER_REQUEST_DURATION_SECONDS",
            Box::new(PROVIDER_REQUEST_DURATION_SECONDS.clone()),
        ),
        ("ERRORS_TOTAL", Box::new(ERRORS_TOTAL.clone())),
    ];

    let mut registered = 0;
    for (name, collector) in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(error) => tracing::error!(%error, metric = name, "Failed to register metric"),
        }
    }

    if registered > 0 {
        tracing::info!(registered, "Metrics registry initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();

        record_oauth_event("login");
        let families = REGISTRY.gather();
        assert!(
            families
                .iter()
                .any(|family| family.get_name() == "github_oauth_demo_oauth_events_total")
        );
    }
}
