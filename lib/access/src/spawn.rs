//! Environment variables exposed to a spawned user session.
//!
//! The hosting platform passes OAuth data to the user's session as
//! `OAUTH2_`-prefixed environment variables derived from the
//! auth-state snapshot.

use crate::state::AuthState;
use serde_json::Value;
use std::collections::HashMap;

/// Variable carrying the access token.
pub const ACCESS_TOKEN_VAR: &str = "OAUTH2_ACCESS_TOKEN";

/// Profile fields forwarded as `OAUTH2_{FIELD_UPPER}` variables.
const PROFILE_FIELDS: &[&str] = &["login_id", "name", "sortable_name", "primary_email"];

/// Builds the environment for a spawned session from an auth state.
///
/// Always includes the access token; selected identity fields are
/// included only when present in the raw profile.
#[must_use]
pub fn spawn_environment(state: &AuthState) -> HashMap<String, String> {
    let mut environment = HashMap::new();

    environment.insert(
        ACCESS_TOKEN_VAR.to_string(),
        state.access_token().to_string(),
    );

    for field in PROFILE_FIELDS {
        if let Some(value) = state.oauth_user().get(*field).and_then(Value::as_str) {
            environment.insert(format!("OAUTH2_{}", field.to_uppercase()), value.to_string());
        }
    }

    environment
}
