//! Browser session handling
//!
//! Handles:
//! - Signed cookie session storage
//! - Typed session accessors for the OAuth flow
//! - Session extractor

mod extract;
pub mod session;

pub use extract::CookieSession;
pub use session::{CachedUser, OAuthSession, SessionCodec, SessionData};
