//! Login, callback, and health routes.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{AppState, authenticator::AuthError, oauth::OAuthError};

/// Auth state cookie name (CSRF protection during the OAuth flow).
const AUTH_STATE_COOKIE: &str = "lmsgate_auth_state";

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

/// Serializable auth state for cookie storage.
#[derive(Debug, Serialize, Deserialize)]
struct AuthStateData {
    csrf_token: String,
    pkce_verifier: String,
}

/// The callback's response to the hosting platform.
#[derive(Debug, Serialize)]
struct LoginSummary {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin: Option<bool>,
    groups: Vec<String>,
}

/// Initiates the login flow by redirecting to the LMS.
pub async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (auth_url, auth_state) = state.oauth_client.authorization_url();

    // Store the auth state in a secure cookie for validation on callback
    let auth_state_json = serde_json::to_string(&AuthStateData {
        csrf_token: auth_state.csrf_token,
        pkce_verifier: auth_state.pkce_verifier,
    })
    .expect("serialize auth state");

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&auth_url))
}

/// Handles the OAuth callback after the user authenticates with the LMS.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, LoginError> {
    // Retrieve and validate auth state from cookie
    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(LoginError::MissingAuthState)?;

    let auth_state: AuthStateData = serde_json::from_str(auth_state_cookie.value())
        .map_err(|_| LoginError::InvalidAuthState)?;

    // Validate CSRF token
    if query.state != auth_state.csrf_token {
        return Err(LoginError::CsrfMismatch);
    }

    // Exchange the authorization code for the raw token response
    let token_response = state
        .oauth_client
        .exchange_code(&query.code, &auth_state.pkce_verifier)
        .await
        .map_err(LoginError::Exchange)?;

    // Run the rest of the attempt: identity, groups, decision
    let decision = state
        .authenticator
        .authenticate(token_response)
        .await
        .map_err(LoginError::Authentication)?;

    let summary = LoginSummary {
        username: decision.username().to_string(),
        admin: decision.admin(),
        groups: decision.auth_state().groups().to_vec(),
    };

    // Remove auth state cookie
    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    Ok((jar.add(remove_auth_state), Json(summary)))
}

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Login flow errors.
#[derive(Debug)]
pub enum LoginError {
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    Exchange(OAuthError),
    Authentication(AuthError),
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::Exchange(err) => {
                tracing::error!("Token exchange failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
            Self::Authentication(err) => {
                tracing::error!("Authentication attempt failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
        };

        (status, message).into_response()
    }
}
