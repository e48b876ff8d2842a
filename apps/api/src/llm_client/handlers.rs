//! Axum route handlers for the provider settings screen.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::probe::{list_models, test_connection, ModelInfo, MODEL_LIST_TIMEOUT};
use crate::llm_client::provider::Provider;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRequest {
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

/// `{success, message|error}` or `{success, models}`. Provider failures are reported
/// with `success: false` and HTTP 200 so the UI can show them inline.
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<ModelInfo>>,
}

impl ProbeResponse {
    fn failed(err: AppError) -> Self {
        let error = match err {
            AppError::Upstream { message, .. } => message,
            other => other.to_string(),
        };
        Self {
            success: false,
            message: None,
            error: Some(error),
            models: None,
        }
    }
}

struct ProbeTarget {
    provider: Provider,
    base_url: String,
    api_key: Option<String>,
}

impl ProbeRequest {
    fn into_target(self) -> Result<ProbeTarget, AppError> {
        let provider = match self.provider.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.parse::<Provider>()?,
            _ => Provider::default(),
        };
        let base_url = self
            .base_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Validation("baseUrl is required".to_string()))?;
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Ok(ProbeTarget {
            provider,
            base_url,
            api_key,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/llm/test
pub async fn handle_test_connection(
    State(state): State<AppState>,
    Json(request): Json<ProbeRequest>,
) -> Result<Json<ProbeResponse>, AppError> {
    let target = request.into_target()?;
    let response = match test_connection(
        &state.http,
        target.provider,
        &target.base_url,
        target.api_key.as_deref(),
    )
    .await
    {
        Ok(message) => ProbeResponse {
            success: true,
            message: Some(message),
            error: None,
            models: None,
        },
        Err(e) => ProbeResponse::failed(e),
    };
    Ok(Json(response))
}

/// POST /api/llm/models
pub async fn handle_list_models(
    State(state): State<AppState>,
    Json(request): Json<ProbeRequest>,
) -> Result<Json<ProbeResponse>, AppError> {
    let target = request.into_target()?;
    let response = match list_models(
        &state.http,
        target.provider,
        &target.base_url,
        target.api_key.as_deref(),
        MODEL_LIST_TIMEOUT,
    )
    .await
    {
        Ok(models) => ProbeResponse {
            success: true,
            message: None,
            error: None,
            models: Some(models),
        },
        Err(e) => ProbeResponse::failed(e),
    };
    Ok(Json(response))
}
