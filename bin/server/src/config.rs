//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables (`__` as the nesting separator, e.g.
//! `CANVAS__CANVAS_URL`, `OAUTH__CLIENT_ID`).
//!
//! See [`CanvasConfig`](lmsgate_access::CanvasConfig) for the LMS
//! installation settings.

use lmsgate_access::CanvasConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address and port to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local
    /// HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// OAuth client credentials registered with the LMS.
    pub oauth: OAuthCredentials,

    /// LMS installation configuration.
    pub canvas: CanvasConfig,
}

/// OAuth client credentials for the code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthCredentials {
    /// The OAuth2 client id registered with the LMS.
    pub client_id: String,
    /// The OAuth2 client secret.
    pub client_secret: String,
    /// The redirect URI for the OAuth2 callback.
    pub redirect_url: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_production_safe() {
        assert_eq!(default_listen_addr(), "0.0.0.0:8000");
        assert!(default_secure_cookies());
    }

    #[test]
    fn config_deserializes_from_nested_values() {
        let json = serde_json::json!({
            "oauth": {
                "client_id": "id",
                "client_secret": "secret",
                "redirect_url": "https://hub.example.com/auth/callback",
            },
            "canvas": {
                "canvas_url": "https://canvas.example.com/",
                "strip_email_domain": "example.com",
            },
        });

        let config: ServerConfig = serde_json::from_value(json).expect("deserialize");

        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert!(config.secure_cookies);
        assert_eq!(config.oauth.client_id, "id");
        assert_eq!(config.canvas.canvas_url(), "https://canvas.example.com/");
        assert_eq!(config.canvas.strip_email_domain(), Some("example.com"));
        assert!(config.canvas.validate().is_ok());
    }
}
