//! Authenticator configuration for the LMS identity provider.
//!
//! This configuration describes one Canvas-style LMS installation:
//! where it lives, which field identifies a course, and how usernames
//! and admin access are derived. It is validated once at startup;
//! nothing here is checked per-request.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Which course field to use as the stable course identifier.
///
/// - `Id`: the numeric course id; always present, but conveys nothing
///   about the course beyond its URL.
/// - `SisCourseId`: the institution-stable SIS code (e.g.
///   `CRS:MATH-98-2021-C`); predictable and human readable, but some
///   enrollment types cannot read it in common deployments.
/// - `CourseCode`: the human-readable code (e.g. `Math 98`); visible to
///   everyone, but not guaranteed unique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseKey {
    /// Numeric course id (the default).
    #[default]
    Id,
    /// Institution-stable SIS course id.
    SisCourseId,
    /// Human-readable course code.
    CourseCode,
}

impl CourseKey {
    /// Returns the record field name this key reads.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::SisCourseId => "sis_course_id",
            Self::CourseCode => "course_code",
        }
    }
}

/// Configuration for authenticating against one LMS installation.
///
/// Fields with defaults can be omitted when loading from environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Base URL of the LMS installation. Must end with a trailing slash.
    canvas_url: String,
    /// Course field used as the stable course identifier.
    /// Default: numeric id.
    #[serde(default)]
    course_key: CourseKey,
    /// Email domain to strip from usernames. A user `jane@berkeley.edu`
    /// becomes `jane` when this is set to `berkeley.edu`; users on any
    /// other domain keep their full address.
    #[serde(default)]
    strip_email_domain: Option<String>,
    /// Usernames (post-normalization) granted the admin flag.
    #[serde(default)]
    admin_users: Vec<String>,
    /// Whether to derive group membership from courses and group sets.
    /// Default: true.
    #[serde(default = "default_manage_groups")]
    manage_groups: bool,
    /// Resolve the user's identity from the id token instead of the
    /// profile endpoint. Default: false.
    #[serde(default)]
    userdata_from_id_token: bool,
    /// Profile field holding the raw username. Default: "primary_email".
    #[serde(default = "default_username_key")]
    username_key: String,
    /// Maximum pages to follow per paginated collection before the
    /// upstream is considered misbehaving. Default: 64.
    #[serde(default = "default_max_pages")]
    max_pages: u32,
}

fn default_manage_groups() -> bool {
    true
}

fn default_username_key() -> String {
    "primary_email".to_string()
}

fn default_max_pages() -> u32 {
    64
}

impl CanvasConfig {
    /// Creates a configuration with defaults for everything but the URL.
    #[must_use]
    pub fn new(canvas_url: String) -> Self {
        Self {
            canvas_url,
            course_key: CourseKey::default(),
            strip_email_domain: None,
            admin_users: Vec::new(),
            manage_groups: default_manage_groups(),
            userdata_from_id_token: false,
            username_key: default_username_key(),
            max_pages: default_max_pages(),
        }
    }

    /// Sets the course identifier key.
    #[must_use]
    pub fn with_course_key(mut self, key: CourseKey) -> Self {
        self.course_key = key;
        self
    }

    /// Sets the email domain to strip from usernames.
    #[must_use]
    pub fn with_strip_email_domain(mut self, domain: String) -> Self {
        self.strip_email_domain = Some(domain);
        self
    }

    /// Sets the admin allow-list.
    #[must_use]
    pub fn with_admin_users(mut self, users: Vec<String>) -> Self {
        self.admin_users = users;
        self
    }

    /// Enables or disables group derivation.
    #[must_use]
    pub fn with_manage_groups(mut self, manage: bool) -> Self {
        self.manage_groups = manage;
        self
    }

    /// Resolves identity from the id token instead of the profile endpoint.
    #[must_use]
    pub fn with_userdata_from_id_token(mut self, enabled: bool) -> Self {
        self.userdata_from_id_token = enabled;
        self
    }

    /// Sets the profile field holding the raw username.
    #[must_use]
    pub fn with_username_key(mut self, key: String) -> Self {
        self.username_key = key;
        self
    }

    /// Sets the pagination page ceiling.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is unset or lacks its trailing
    /// slash. Call this at startup; a failing configuration must never
    /// serve a login.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if !self.canvas_url.ends_with('/') {
            return Err(ConfigError::MissingTrailingSlash {
                url: self.canvas_url.clone(),
            });
        }
        Ok(())
    }

    /// Returns the LMS base URL.
    #[must_use]
    pub fn canvas_url(&self) -> &str {
        &self.canvas_url
    }

    /// Returns the course identifier key.
    #[must_use]
    pub fn course_key(&self) -> CourseKey {
        self.course_key
    }

    /// Returns the email domain to strip, if configured.
    #[must_use]
    pub fn strip_email_domain(&self) -> Option<&str> {
        self.strip_email_domain.as_deref()
    }

    /// Returns true if the (normalized) username is on the admin list.
    #[must_use]
    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_users.iter().any(|u| u == username)
    }

    /// Returns true if group derivation is enabled.
    #[must_use]
    pub fn manage_groups(&self) -> bool {
        self.manage_groups
    }

    /// Returns true if identity is resolved from the id token.
    #[must_use]
    pub fn userdata_from_id_token(&self) -> bool {
        self.userdata_from_id_token
    }

    /// Returns the profile field holding the raw username.
    #[must_use]
    pub fn username_key(&self) -> &str {
        &self.username_key
    }

    /// Returns the pagination page ceiling.
    #[must_use]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Returns the OAuth2 authorization endpoint.
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}login/oauth2/auth", self.canvas_url)
    }

    /// Returns the OAuth2 token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}login/oauth2/token", self.canvas_url)
    }

    /// Returns the user-profile endpoint.
    #[must_use]
    pub fn userdata_url(&self) -> String {
        format!("{}api/v1/users/self/profile", self.canvas_url)
    }

    /// Returns the course-collection endpoint for the current user.
    #[must_use]
    pub fn courses_url(&self) -> String {
        format!("{}api/v1/courses", self.canvas_url)
    }

    /// Returns the group-membership endpoint for the current user.
    #[must_use]
    pub fn self_groups_url(&self) -> String {
        format!("{}api/v1/users/self/groups", self.canvas_url)
    }
}
