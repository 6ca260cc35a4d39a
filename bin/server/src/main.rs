mod auth;
mod config;

use auth::{AppState, Authenticator, CanvasOAuthClient, HttpFetcher};
use axum::{Router, routing::get};
use config::ServerConfig;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Fail fast: a misconfigured LMS installation never serves a login
    let oauth_client = CanvasOAuthClient::new(
        config.oauth.client_id.clone(),
        config.oauth.client_secret.clone(),
        config.oauth.redirect_url.clone(),
        &config.canvas,
    )
    .expect("invalid OAuth configuration");

    let fetcher = HttpFetcher::new().expect("failed to create HTTP client");
    let authenticator =
        Authenticator::new(config.canvas, fetcher).expect("invalid LMS configuration");

    let app_state = Arc::new(AppState::new(
        oauth_client,
        authenticator,
        config.secure_cookies,
    ));

    let app = Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/healthz", get(auth::health))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
