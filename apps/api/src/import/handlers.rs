//! Axum route handlers for the Import API.

use axum::{
    extract::{multipart::Field, Multipart, State},
    response::Response,
};
use bytes::Bytes;
use reqwest::Client;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::import::extract::{extract_text, looks_like_pdf, ExtractedDocument};
use crate::import::prompts::LINKEDIN_EXTRACTION_PROMPT;
use crate::llm_client::bridge::{stream_to_sse, truncate, StreamEvent};
use crate::llm_client::provider::{build_extraction_request, LlmConfigInput, ProviderConfig};
use crate::llm_client::structured::recover;
use crate::state::AppState;

pub const RECOVERY_FAILED: &str = "Failed to parse structured data from LLM response";
/// How much of an unparseable model answer is echoed back for debugging.
pub const RAW_CONTENT_PREVIEW_CHARS: usize = 2000;

#[derive(Debug, Default)]
struct ImportForm {
    pdf: Option<Bytes>,
    llm_config: LlmConfigInput,
}

/// POST /api/import/linkedin
///
/// Multipart: `pdf`, `baseUrl`, `model`, `apiKey?`, `provider?`. Streams SSE ending in
/// `done{cvData}` or a recovery error carrying the raw model output.
pub async fn handle_import_linkedin(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("import", %request_id);

    async move {
        let form = read_form(multipart).await?;
        let config = form.llm_config.into_provider_config()?;
        let pdf = form
            .pdf
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| AppError::Validation("No PDF file uploaded".to_string()))?;
        if !looks_like_pdf(&pdf) {
            return Err(AppError::Validation(
                "Uploaded file is not a PDF".to_string(),
            ));
        }

        let document = extract_text(pdf.to_vec()).await?;
        info!(
            "Importing {} page(s) via {}",
            document.page_count, config.provider
        );
        stream_import(&state.http, &config, &document).await
    }
    .instrument(span)
    .await
}

/// Sends the extracted text to the provider and streams the structuring result.
pub async fn stream_import(
    client: &Client,
    config: &ProviderConfig,
    document: &ExtractedDocument,
) -> Result<Response, AppError> {
    let prompt = LINKEDIN_EXTRACTION_PROMPT.replace("{raw_text}", &document.text);
    let request = build_extraction_request(config, &prompt)?;
    stream_to_sse(client, request, finish_import).await
}

/// Turns the complete model answer into the terminal event of an import.
pub fn finish_import(raw: String) -> StreamEvent {
    match recover(&raw) {
        Some(cv) => StreamEvent::done_cv(cv),
        None => {
            warn!("Model answer held no usable CV data ({} chars)", raw.len());
            StreamEvent::Error {
                error: RECOVERY_FAILED.to_string(),
                raw_content: Some(truncate(&raw, RAW_CONTENT_PREVIEW_CHARS).to_string()),
            }
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ImportForm, AppError> {
    let mut form = ImportForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => form.pdf = Some(field.bytes().await.map_err(invalid_form)?),
            "baseUrl" => form.llm_config.base_url = Some(text(field).await?),
            "model" => form.llm_config.model = Some(text(field).await?),
            "apiKey" => form.llm_config.api_key = Some(text(field).await?),
            "provider" => form.llm_config.provider = Some(text(field).await?),
            // systemPrompt is accepted but the structuring call uses its own.
            _ => {}
        }
    }
    Ok(form)
}

async fn text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(invalid_form)
}

fn invalid_form(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart form: {}", err.body_text()))
}
