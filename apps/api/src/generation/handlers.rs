//! Axum route handlers for the Generation API.

use axum::{extract::State, response::Response, Json};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{prepare_generation, GenerateRequest};
use crate::llm_client::bridge::{stream_to_sse, StreamEvent};
use crate::state::AppState;

/// POST /api/generate
///
/// Validates the request, opens the provider call and streams the rewritten CV back
/// as SSE. Failures before the stream starts are plain JSON errors (400/502).
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate", %request_id);

    async move {
        let provider_request = prepare_generation(request)?;
        info!(
            "Generating CV with {} ({})",
            provider_request.provider, provider_request.url
        );
        stream_to_sse(&state.http, provider_request, StreamEvent::done_content).await
    }
    .instrument(span)
    .await
}
