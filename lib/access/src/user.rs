//! Username normalization and the final per-login decision.

use crate::state::AuthState;

/// Normalizes a raw username from the identity provider.
///
/// Lower-cases the name; when `strip_email_domain` is set and the name
/// ends with `@{domain}`, the suffix is removed. Users on any other
/// domain keep their full address.
#[must_use]
pub fn normalize_username(raw: &str, strip_email_domain: Option<&str>) -> String {
    let username = raw.to_lowercase();

    if let Some(domain) = strip_email_domain {
        let suffix = format!("@{}", domain.to_lowercase());
        if let Some(stripped) = username.strip_suffix(&suffix) {
            return stripped.to_string();
        }
    }

    username
}

/// The outcome of one successful authentication attempt.
///
/// Owned by the hosting platform once returned; the authenticator
/// keeps nothing.
#[derive(Debug)]
pub struct AuthDecision {
    username: String,
    admin: Option<bool>,
    auth_state: AuthState,
}

impl AuthDecision {
    /// Creates a decision from its parts.
    #[must_use]
    pub fn new(username: String, admin: Option<bool>, auth_state: AuthState) -> Self {
        Self {
            username,
            admin,
            auth_state,
        }
    }

    /// Returns the normalized username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns `Some(true)` for allow-listed admins; otherwise unset so
    /// the hosting platform keeps its own notion of admin status.
    #[must_use]
    pub fn admin(&self) -> Option<bool> {
        self.admin
    }

    /// Returns the auth-state snapshot.
    #[must_use]
    pub fn auth_state(&self) -> &AuthState {
        &self.auth_state
    }

    /// Consumes the decision, yielding the snapshot.
    #[must_use]
    pub fn into_auth_state(self) -> AuthState {
        self.auth_state
    }
}
