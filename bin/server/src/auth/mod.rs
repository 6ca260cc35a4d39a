//! Authentication module for the lmsgate server.
//!
//! This module provides:
//! - The OAuth2 authorization-code exchange against the LMS (`oauth`)
//! - Paginated fetching of LMS collection resources (`fetch`)
//! - The per-login orchestration pipeline (`authenticator`)
//! - Login and callback routes for the hosting platform (`routes`)
//!
//! Each authentication attempt is self-contained: the token material,
//! fetched records, and derived groups live only for the duration of
//! the attempt and end up in a single immutable auth-state snapshot.
//! Concurrent attempts share nothing mutable, so no serialization is
//! needed here; the hosting platform decides whether to serialize
//! attempts per user.

pub mod authenticator;
pub mod fetch;
pub mod oauth;
pub mod routes;

pub use authenticator::{AuthError, Authenticator};
pub use fetch::{FetchError, HttpFetcher, PageFetch, fetch_all};
pub use oauth::{CanvasOAuthClient, OAuthError};
pub use routes::{callback, health, login};

/// Shared application state.
pub struct AppState {
    /// OAuth client for the code exchange.
    pub oauth_client: CanvasOAuthClient,
    /// Orchestrator for everything after the exchange.
    pub authenticator: Authenticator<HttpFetcher>,
    /// Whether to set the Secure flag on cookies.
    pub secure_cookies: bool,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        oauth_client: CanvasOAuthClient,
        authenticator: Authenticator<HttpFetcher>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            oauth_client,
            authenticator,
            secure_cookies,
        }
    }
}
