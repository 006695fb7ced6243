//! HTTP API gateway for Doppel.
//!
//! Exposes the clone reply endpoint under `/v1` and a health check.
//!
//! Built on Axum for async HTTP.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, http::Method, response::Json, routing::get};
use doppel_persona::CloneSynthesizer;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Request body limit for every route.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub synthesizer: CloneSynthesizer,
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router.
///
/// Layers applied:
/// - CORS allowing any origin for GET and POST
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// A missing API key is not fatal: the server starts and every generation
/// attempt against a hosted backend reports a credential error.
pub async fn start(config: doppel_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if !config.has_api_key() && doppel_providers::router::requires_api_key(&config.default_provider) {
        warn!(
            provider = %config.default_provider,
            "No API key configured; replies will fail with 401 until DOPPEL_API_KEY or GEMINI_API_KEY is set"
        );
    }

    let synthesizer = CloneSynthesizer::from_config(&config)?;
    let app = build_router(Arc::new(GatewayState { synthesizer }));

    info!(addr = %addr, model = %config.active_model(), "Gateway starting");
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

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
