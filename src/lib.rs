//! github-oauth-demo - GitHub OAuth authorization code flow, end to end
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /github, /github/callback entry route                    │
//! │  - Homepage, not-found page, health, metrics                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OAuth Coordinator                         │
//! │  - login / logout / callback / repos                        │
//! │  - signed cookie session (access_token, state, user)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Provider API Gateway                        │
//! │  - Accept / User-Agent / Bearer headers                     │
//! │  - JSON relay to and from GitHub                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `auth`: Session storage and extraction
//! - `github`: OAuth flow and GitHub API access
//! - `views`: HTML pages
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod metrics;
pub mod views;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// OAuth flow and GitHub API access
    pub coordinator: Arc<github::OAuthCoordinator>,

    /// Session cookie codec
    pub sessions: Arc<auth::SessionCodec>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let user_agent = format!(
            "github-oauth-demo/{} (+{})",
            env!("CARGO_PKG_VERSION"),
            config.server.base_url()
        );
        let gateway = github::ProviderGateway::new(&user_agent)?;
        Ok(Self::with_gateway(config, gateway))
    }

    /// Initialize application state around an existing gateway
    pub fn with_gateway(config: config::AppConfig, gateway: github::ProviderGateway) -> Self {
        metrics::init_metrics();

        if config.github.client_secret.is_empty() {
            tracing::warn!("github.client_secret (CLIENT_SECRET) is empty; token exchange will fail");
        }

        let config = Arc::new(config);
        let sessions = auth::SessionCodec::new(&config.session, config.server.is_https());
        let coordinator = github::OAuthCoordinator::new(config.clone(), gateway);

        tracing::info!(base_url = %config.server.base_url(), "Application state initialized");

        Self {
            config,
            coordinator: Arc::new(coordinator),
            sessions: Arc::new(sessions),
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::pages_router())
        .merge(api::github_router())
        .merge(api::metrics_router())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span without the query string, which carries OAuth codes and nonces
fn request_span(request: &axum::http::Request<axum::body::Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

async fn health_check() -> &'static str {
    "OK"
}
