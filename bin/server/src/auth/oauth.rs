//! OAuth2 authorization-code exchange against the LMS.
//!
//! The LMS acts as its own OAuth2 provider: authorization and token
//! endpoints live under the installation's base URL. The token
//! response may carry provider-specific fields beyond the RFC 6749
//! set (`user`, `canvas_region`, ...); those are preserved verbatim
//! so the rest of the pipeline sees the response exactly as the
//! provider sent it.

use lmsgate_access::CanvasConfig;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, ExtraTokenFields,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, StandardTokenResponse, TokenUrl,
    basic::BasicTokenType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Provider-specific token response fields, preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasTokenFields {
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ExtraTokenFields for CanvasTokenFields {}

type CanvasTokenResponse = StandardTokenResponse<CanvasTokenFields, BasicTokenType>;

/// Per-attempt state carried through the redirect round-trip.
#[derive(Debug)]
pub struct CanvasAuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// OAuth2 client configured for one LMS installation.
pub struct CanvasOAuthClient {
    client: oauth2::Client<
        oauth2::basic::BasicErrorResponse,
        CanvasTokenResponse,
        oauth2::basic::BasicTokenIntrospectionResponse,
        oauth2::StandardRevocableToken,
        oauth2::basic::BasicRevocationErrorResponse,
        oauth2::EndpointSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointNotSet,
        oauth2::EndpointSet,
    >,
    http_client: reqwest::Client,
}

impl CanvasOAuthClient {
    /// Builds a client for the LMS installation's own OAuth endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if any derived or supplied URL is malformed.
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_url: String,
        config: &CanvasConfig,
    ) -> Result<Self, OAuthError> {
        let auth_url = AuthUrl::new(config.auth_url())
            .map_err(|e| OAuthError::Configuration(format!("invalid auth url: {e}")))?;
        let token_url = TokenUrl::new(config.token_url())
            .map_err(|e| OAuthError::Configuration(format!("invalid token url: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_url)
            .map_err(|e| OAuthError::Configuration(format!("invalid redirect url: {e}")))?;

        let client = oauth2::Client::new(ClientId::new(client_id))
            .set_client_secret(ClientSecret::new(client_secret))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| OAuthError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            client,
            http_client,
        })
    }

    /// Generates the authorization URL along with the per-attempt
    /// CSRF token and PKCE verifier to validate the callback.
    #[must_use]
    pub fn authorization_url(&self) -> (String, CanvasAuthState) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .url();

        (
            auth_url.to_string(),
            CanvasAuthState {
                csrf_token: csrf_token.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        )
    }

    /// Exchanges the authorization code for the raw token response.
    ///
    /// Passes `replace_tokens=1` so the provider revokes any prior
    /// token issued to this client for the same user.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails or the response cannot
    /// be represented as JSON.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<Value, OAuthError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .add_extra_param("replace_tokens", "1")
            .request_async(&self.http_client)
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        serde_json::to_value(&token_response)
            .map_err(|e| OAuthError::TokenExchange(format!("unserializable response: {e}")))
    }
}

/// OAuth client errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// The client could not be constructed from the configuration.
    Configuration(String),
    /// The code-for-token exchange failed.
    TokenExchange(String),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "oauth configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "token exchange failed: {msg}"),
        }
    }
}

impl std::error::Error for OAuthError {}
