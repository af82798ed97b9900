//! HTTP API gateway for streamlens.
//!
//! Exposes the question-answering endpoint and a health check, with CORS
//! and trace layers. Built on Axum. All collaborators sit behind their core
//! traits so the router is fully testable with in-memory fakes.

pub mod ask;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use streamlens_config::AppConfig;
use streamlens_core::chat::MessageLimits;
use streamlens_core::session::SessionResolver;
use streamlens_core::store::ChatLogStore;
use streamlens_providers::AnswerGateway;
use streamlens_store::{Credentials, DynamoClient};
use streamlens_twitch::HelixClient;

/// Shared application state for the gateway.
///
/// Built once at startup from read-only configuration; nothing here mutates
/// during the process lifetime.
pub struct GatewayState {
    pub limits: MessageLimits,
    pub session: Arc<dyn SessionResolver>,
    pub store: Arc<dyn ChatLogStore>,
    pub answers: Arc<AnswerGateway>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_allow_origin: &str) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat/ask", post(ask::ask_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors_layer(cors_allow_origin))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS from the configured allow-origin; `*` (or an unparseable value)
/// allows any origin.
fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origin = if allow_origin == "*" {
        AllowOrigin::any()
    } else {
        match allow_origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                warn!(origin = %allow_origin, "Invalid CORS origin in config, allowing any");
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any)
}

/// Start the gateway HTTP server from configuration.
///
/// Fails fast when a hard-required collaborator is unconfigured (Twitch and
/// store credentials). An empty answer-lane chain is not fatal: requests
/// then surface the distinct provider-configuration error.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let client_id = config
        .twitch
        .client_id
        .clone()
        .ok_or("TWITCH_CLIENT_ID is not configured")?;
    let client_secret = config
        .twitch
        .client_secret
        .clone()
        .ok_or("TWITCH_CLIENT_SECRET is not configured")?;

    let access_key_id = config
        .store
        .access_key_id
        .clone()
        .ok_or("AWS_ACCESS_KEY_ID is not configured")?;
    let secret_access_key = config
        .store
        .secret_access_key
        .clone()
        .ok_or("AWS_SECRET_ACCESS_KEY is not configured")?;

    let request_timeout = std::time::Duration::from_secs(config.http.request_timeout_secs);

    let session = Arc::new(
        HelixClient::new(client_id, client_secret).with_timeout(request_timeout),
    );

    let mut store = DynamoClient::new(
        &config.store.table,
        &config.store.region,
        Credentials {
            access_key_id,
            secret_access_key,
            session_token: config.store.session_token.clone(),
        },
    )
    .with_timeout(request_timeout);
    if let Some(endpoint) = &config.store.endpoint {
        store = store.with_endpoint(endpoint);
    }

    let answers = Arc::new(streamlens_providers::build_from_config(&config));
    if answers.is_empty() {
        warn!("No answer provider credentials configured; /chat/ask will return errors");
    }

    let state = Arc::new(GatewayState {
        limits: config.limits.message_limits(),
        session,
        store: Arc::new(store),
        answers,
    });

    let app = build_router(state, &config.gateway.cors_allow_origin);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> axum::response::Json<HealthResponse> {
    axum::response::Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
