//! The immutable auth-state snapshot produced by a login.
//!
//! One snapshot is assembled per successful authentication and handed
//! to the hosting platform. It is never mutated afterwards; a user
//! refreshes it by logging in again.

use crate::error::StateError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// Token material extracted from the raw token-exchange response.
#[derive(Debug, Clone)]
pub struct TokenPayload {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
    scopes: Vec<String>,
}

impl TokenPayload {
    /// Extracts token material from a raw token-exchange response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response carries no access token. There
    /// is no partial success: a response without an access token cannot
    /// become an auth state.
    pub fn from_response(response: &Value) -> Result<Self, StateError> {
        let access_token = response
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or(StateError::MissingAccessToken)?
            .to_string();

        let refresh_token = response
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(str::to_string);

        let id_token = response
            .get("id_token")
            .and_then(Value::as_str)
            .map(str::to_string);

        let scopes = normalize_scopes(response.get("scope"));

        Ok(Self {
            access_token,
            refresh_token,
            id_token,
            scopes,
        })
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if the provider issued one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns the id token, if the provider issued one.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Returns the granted scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Normalizes the `scope` field of a token response.
///
/// Providers return either one space-delimited string or a list of
/// scope strings; both become a sequence of individual scopes. Any
/// other shape yields no scopes.
#[must_use]
pub fn normalize_scopes(scope: Option<&Value>) -> Vec<String> {
    match scope {
        Some(Value::String(s)) => s.split(' ').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// The immutable bundle of token and identity data for one login.
///
/// Holds the extracted token material, the raw token response (unknown
/// fields preserved verbatim for downstream provisioning), the raw
/// user profile, the raw course list, and the final derived group
/// identifiers.
#[derive(Debug, Clone)]
pub struct AuthState {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
    scopes: Vec<String>,
    token_response: Value,
    oauth_user: Value,
    courses: Vec<Value>,
    groups: Vec<String>,
    created_at: DateTime<Utc>,
}

impl AuthState {
    /// Assembles the snapshot. Pure; all fetching happens before this.
    #[must_use]
    pub fn new(
        token: TokenPayload,
        token_response: Value,
        oauth_user: Value,
        courses: Vec<Value>,
        groups: Vec<String>,
    ) -> Self {
        debug!(
            courses = courses.len(),
            groups = groups.len(),
            "assembled auth state"
        );

        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            id_token: token.id_token,
            scopes: token.scopes,
            token_response,
            oauth_user,
            courses,
            groups,
            created_at: Utc::now(),
        }
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns the id token, if any.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Returns the granted scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Returns the raw token-exchange response, unknown fields intact.
    #[must_use]
    pub fn token_response(&self) -> &Value {
        &self.token_response
    }

    /// Returns the raw user profile.
    #[must_use]
    pub fn oauth_user(&self) -> &Value {
        &self.oauth_user
    }

    /// Returns the raw course list.
    #[must_use]
    pub fn courses(&self) -> &[Value] {
        &self.courses
    }

    /// Returns the final group identifiers, course-derived first.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns when this snapshot was assembled.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
