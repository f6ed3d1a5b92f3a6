//! API layer
//!
//! HTTP handlers for:
//! - OAuth entry route
//! - Static pages
//! - Metrics (Prometheus)

mod github;
pub mod metrics;
mod pages;

pub use github::github_router;
pub use metrics::metrics_router;
pub use pages::pages_router;
