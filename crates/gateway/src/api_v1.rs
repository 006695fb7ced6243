//! `/v1` API: clone reply synthesis.
//!
//! - `POST /clone/reply`: `{ query, cloneData }` in, `{ clone_reply, explanation, tags }` out

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
};
use doppel_core::{CloneProfile, SynthesisError, SynthesisRequest, SynthesisResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::SharedState;

const MISSING_INPUT: &str = "Missing query or cloneData";

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/clone/reply", post(clone_reply_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CloneReplyRequest {
    #[serde(default)]
    pub query: Option<String>,

    #[serde(default, rename = "cloneData")]
    pub clone_data: Option<CloneProfile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl CloneReplyRequest {
    /// Both fields present and the query not blank.
    fn validate(self) -> Result<SynthesisRequest, ApiError> {
        match (self.query, self.clone_data) {
            (Some(query), Some(profile)) if !query.trim().is_empty() => {
                Ok(SynthesisRequest::new(query, profile))
            }
            _ => Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: MISSING_INPUT.into(),
                    details: None,
                }),
            )),
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn clone_reply_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CloneReplyRequest>,
) -> Result<Json<SynthesisResult>, ApiError> {
    let request = payload.validate().inspect_err(|_| {
        warn!("v1/clone/reply rejected: missing query or cloneData");
    })?;

    info!(
        persona = %request.profile.name,
        query_len = request.query.len(),
        "v1/clone/reply request"
    );

    match state.synthesizer.synthesize(&request).await {
        Ok(synthesis) => {
            info!(source = ?synthesis.source, tags = ?synthesis.result.tags, "v1/clone/reply complete");
            Ok(Json(synthesis.result))
        }
        Err(SynthesisError::Credential { message, details }) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: message,
                details: Some(details),
            }),
        )),
    }
}
