//! GitHub integration
//!
//! - `coordinator`: OAuth authorization code flow and entry route dispatch
//! - `gateway`: authenticated request forwarding to the GitHub API
//! - `models`: typed interpretation of GitHub responses

mod coordinator;
mod gateway;
mod models;

pub use coordinator::{Action, CallbackOutcome, EntryQuery, EntryResponse, OAuthCoordinator};
pub use gateway::ProviderGateway;
pub use models::{ProviderMessage, ProviderReply, Repository, TokenResponse};
