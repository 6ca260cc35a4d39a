//! Per-login orchestration: from raw token response to auth decision.
//!
//! Everything after the code exchange happens here, in order: extract
//! the token material, resolve the user's identity, derive groups from
//! courses and group memberships, assemble the immutable auth-state
//! snapshot, and decide username and admin flag. Any step failing
//! fails the whole attempt; there is no partial login.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lmsgate_access::{
    AuthDecision, AuthState, CanvasConfig, ConfigError, StateError, TokenPayload, course_groups,
    membership_groups, normalize_username,
};
use serde_json::Value;
use std::fmt;
use tracing::info;
use ulid::Ulid;

use super::fetch::{FetchError, PageFetch, fetch_all};

/// Orchestrates one authentication attempt end to end.
pub struct Authenticator<F: PageFetch> {
    config: CanvasConfig,
    fetcher: F,
}

impl<F: PageFetch> Authenticator<F> {
    /// Creates an authenticator after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. This runs at
    /// startup; a misconfigured installation never serves a login.
    pub fn new(config: CanvasConfig, fetcher: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    /// Runs the full pipeline on a raw token-exchange response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response carries no access token, the
    /// identity cannot be resolved, or any upstream fetch fails.
    pub async fn authenticate(&self, token_response: Value) -> Result<AuthDecision, AuthError> {
        let attempt = Ulid::new();

        let token = TokenPayload::from_response(&token_response)?;
        let token_type = token_response
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("Bearer")
            .to_string();

        let oauth_user = if self.config.userdata_from_id_token() {
            let id_token = token.id_token().ok_or(AuthError::MissingIdToken)?;
            decode_id_token(id_token)?
        } else {
            self.fetcher
                .fetch_page(&self.config.userdata_url(), token.access_token(), &token_type)
                .await?
                .body
        };

        let raw_username = oauth_user
            .get(self.config.username_key())
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::MissingUsername {
                key: self.config.username_key().to_string(),
            })?;
        let username = normalize_username(raw_username, self.config.strip_email_domain());

        let (courses, groups) = if self.config.manage_groups() {
            let courses = fetch_all(
                &self.fetcher,
                &self.config.courses_url(),
                token.access_token(),
                &token_type,
                self.config.max_pages(),
            )
            .await?;

            let memberships = fetch_all(
                &self.fetcher,
                &self.config.self_groups_url(),
                token.access_token(),
                &token_type,
                self.config.max_pages(),
            )
            .await?;

            let mut groups = course_groups(&courses, self.config.course_key());
            groups.extend(membership_groups(&memberships));

            (courses, groups)
        } else {
            (Vec::new(), Vec::new())
        };

        let admin = self.config.is_admin(&username).then_some(true);
        let auth_state = AuthState::new(token, token_response, oauth_user, courses, groups);

        info!(
            %attempt,
            username,
            admin = admin.unwrap_or(false),
            groups = auth_state.groups().len(),
            "authenticated"
        );

        Ok(AuthDecision::new(username, admin, auth_state))
    }
}

/// Decodes the payload segment of a JWT without verifying signatures.
///
/// The token arrived over the direct token-exchange channel with the
/// provider, so its claims are trusted as-is.
///
/// # Errors
///
/// Returns an error if the token is not a three-part JWT with a
/// base64url JSON payload.
pub fn decode_id_token(id_token: &str) -> Result<Value, AuthError> {
    let parts: Vec<&str> = id_token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidIdToken(
            "expected three dot-separated segments".to_string(),
        ));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| AuthError::InvalidIdToken(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&payload)
        .map_err(|e| AuthError::InvalidIdToken(format!("payload is not JSON: {e}")))
}

/// Authentication attempt errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token response could not become a token payload.
    State(StateError),
    /// An upstream fetch failed.
    Fetch(FetchError),
    /// Identity resolution from the id token was requested, but the
    /// response carried none.
    MissingIdToken,
    /// The id token could not be decoded.
    InvalidIdToken(String),
    /// The user profile lacks the configured username field.
    MissingUsername { key: String },
}

impl From<StateError> for AuthError {
    fn from(err: StateError) -> Self {
        Self::State(err)
    }
}

impl From<FetchError> for AuthError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(err) => write!(f, "{err}"),
            Self::Fetch(err) => write!(f, "{err}"),
            Self::MissingIdToken => write!(f, "token response carried no id token"),
            Self::InvalidIdToken(msg) => write!(f, "invalid id token: {msg}"),
            Self::MissingUsername { key } => {
                write!(f, "user profile has no usable '{key}' field")
            }
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::fetch::Page;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct FakeFetcher {
        pages: HashMap<String, Page>,
    }

    impl FakeFetcher {
        fn new(pages: Vec<(&str, Value)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, body)| (url.to_string(), Page { body, next: None }))
                    .collect(),
            }
        }

        /// A small installation: one profile, one course, one group.
        fn canvas() -> Self {
            Self::new(vec![
                (
                    "https://canvas.example.com/api/v1/users/self/profile",
                    json!({
                        "login_id": "jane",
                        "name": "Jane Doe",
                        "primary_email": "Jane@Berkeley.EDU",
                    }),
                ),
                (
                    "https://canvas.example.com/api/v1/courses",
                    json!([{
                        "id": 101,
                        "course_code": "Math 98",
                        "enrollments": [{"type": "student"}],
                    }]),
                ),
                (
                    "https://canvas.example.com/api/v1/users/self/groups",
                    json!([{
                        "name": "g1",
                        "context_type": "Course",
                        "course_id": 101,
                    }]),
                ),
            ])
        }
    }

    #[async_trait]
    impl PageFetch for FakeFetcher {
        async fn fetch_page(
            &self,
            url: &str,
            _token: &str,
            _token_type: &str,
        ) -> Result<Page, FetchError> {
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn config() -> CanvasConfig {
        CanvasConfig::new("https://canvas.example.com/".to_string())
    }

    fn token_response() -> Value {
        json!({"access_token": "tok", "token_type": "Bearer"})
    }

    fn encode_id_token(claims: &Value) -> String {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims"));
        format!("eyJhbGciOiJub25lIn0.{payload}.sig")
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        let config = CanvasConfig::new("https://canvas.example.com".to_string());
        let result = Authenticator::new(config, FakeFetcher::new(vec![]));

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn full_attempt_derives_username_and_groups() {
        let config = config().with_strip_email_domain("berkeley.edu".to_string());
        let authenticator = Authenticator::new(config, FakeFetcher::canvas()).expect("auth");

        let decision = authenticator
            .authenticate(token_response())
            .await
            .expect("decision");

        assert_eq!(decision.username(), "jane");
        assert_eq!(decision.admin(), None);
        assert_eq!(
            decision.auth_state().groups(),
            [
                "course::101",
                "course::101::enrollment_type::student",
                "course::101::group::g1",
            ]
        );
        assert_eq!(decision.auth_state().courses().len(), 1);
    }

    #[tokio::test]
    async fn admin_flag_follows_the_allow_list() {
        let config = config()
            .with_strip_email_domain("berkeley.edu".to_string())
            .with_admin_users(vec!["jane".to_string()]);
        let authenticator = Authenticator::new(config, FakeFetcher::canvas()).expect("auth");

        let decision = authenticator
            .authenticate(token_response())
            .await
            .expect("decision");

        assert_eq!(decision.admin(), Some(true));
    }

    #[tokio::test]
    async fn unmanaged_groups_skip_all_collection_fetches() {
        // Only the profile page exists; course fetches would 404.
        let fetcher = FakeFetcher::new(vec![(
            "https://canvas.example.com/api/v1/users/self/profile",
            json!({"primary_email": "jane@example.com"}),
        )]);
        let config = config().with_manage_groups(false);
        let authenticator = Authenticator::new(config, fetcher).expect("auth");

        let decision = authenticator
            .authenticate(token_response())
            .await
            .expect("decision");

        assert_eq!(decision.username(), "jane@example.com");
        assert!(decision.auth_state().groups().is_empty());
        assert!(decision.auth_state().courses().is_empty());
    }

    #[tokio::test]
    async fn username_key_selects_the_profile_field() {
        let config = config()
            .with_strip_email_domain("berkeley.edu".to_string())
            .with_username_key("login_id".to_string());
        let authenticator = Authenticator::new(config, FakeFetcher::canvas()).expect("auth");

        let decision = authenticator
            .authenticate(token_response())
            .await
            .expect("decision");

        assert_eq!(decision.username(), "jane");
    }

    #[tokio::test]
    async fn missing_username_field_fails_the_attempt() {
        let fetcher = FakeFetcher::new(vec![(
            "https://canvas.example.com/api/v1/users/self/profile",
            json!({"name": "Jane Doe"}),
        )]);
        let config = config().with_manage_groups(false);
        let authenticator = Authenticator::new(config, fetcher).expect("auth");

        let err = authenticator
            .authenticate(token_response())
            .await
            .expect_err("must fail");

        assert_eq!(
            err,
            AuthError::MissingUsername {
                key: "primary_email".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn id_token_identity_skips_the_profile_fetch() {
        // No profile page at all; identity must come from the id token.
        let fetcher = FakeFetcher::new(vec![]);
        let config = config()
            .with_userdata_from_id_token(true)
            .with_manage_groups(false);
        let authenticator = Authenticator::new(config, fetcher).expect("auth");

        let id_token = encode_id_token(&json!({"primary_email": "jane@example.com"}));
        let response = json!({
            "access_token": "tok",
            "id_token": id_token,
        });

        let decision = authenticator.authenticate(response).await.expect("decision");

        assert_eq!(decision.username(), "jane@example.com");
    }

    #[tokio::test]
    async fn id_token_identity_without_id_token_fails() {
        let config = config()
            .with_userdata_from_id_token(true)
            .with_manage_groups(false);
        let authenticator =
            Authenticator::new(config, FakeFetcher::new(vec![])).expect("auth");

        let err = authenticator
            .authenticate(token_response())
            .await
            .expect_err("must fail");

        assert_eq!(err, AuthError::MissingIdToken);
    }

    #[tokio::test]
    async fn missing_access_token_fails_the_attempt() {
        let config = config().with_manage_groups(false);
        let authenticator =
            Authenticator::new(config, FakeFetcher::new(vec![])).expect("auth");

        let err = authenticator
            .authenticate(json!({"token_type": "Bearer"}))
            .await
            .expect_err("must fail");

        assert_eq!(err, AuthError::State(StateError::MissingAccessToken));
    }

    #[test]
    fn decode_id_token_reads_the_payload_segment() {
        let claims = json!({"sub": "42", "primary_email": "jane@example.com"});
        let token = encode_id_token(&claims);

        assert_eq!(decode_id_token(&token).expect("claims"), claims);
    }

    #[test]
    fn decode_id_token_rejects_malformed_tokens() {
        assert!(decode_id_token("not-a-jwt").is_err());
        assert!(decode_id_token("a.!!!.c").is_err());
        assert!(decode_id_token("a.b.c.d").is_err());
    }
}
