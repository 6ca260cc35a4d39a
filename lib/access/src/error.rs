//! Error types for the access crate.
//!
//! - `ConfigError`: invalid authenticator configuration, raised at startup
//! - `StateError`: a token-exchange response that cannot become an auth state

use std::fmt;

/// Errors from validating authenticator configuration.
///
/// These are raised once, when the authenticator is constructed. A
/// misconfigured deployment never gets as far as serving a login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The LMS base URL was not set.
    MissingBaseUrl,
    /// The LMS base URL does not end with a trailing slash.
    MissingTrailingSlash { url: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBaseUrl => {
                write!(f, "canvas_url must be set")
            }
            Self::MissingTrailingSlash { url } => {
                write!(f, "canvas_url must have a trailing slash: {url}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from assembling an auth state out of a token response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The token response carried no access token.
    MissingAccessToken,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAccessToken => {
                write!(f, "token response has no access_token")
            }
        }
    }
}

impl std::error::Error for StateError {}
