//! CV Generation — turns a generate request into the single upstream provider call.
//!
//! Flow: validate config → system message (style + format rules + language) →
//!       user message (job context + CV JSON) → provider request.
//!
//! The CV document is forwarded as an opaque JSON object: the server never reshapes
//! what the editor sent, so ids and keys reach the model exactly as stored.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::generation::prompts::{
    CV_DATA_HEADING, DEFAULT_SYSTEM_PROMPT, JOB_CONTEXT_HEADING, LANGUAGE_INSTRUCTION_TEMPLATE,
    NO_CONTEXT_PLACEHOLDER, OUTPUT_FORMAT_RULES,
};
use crate::llm_client::prompts::RETURN_JSON_ONLY;
use crate::llm_client::provider::{build_chat_request, LlmConfigInput, ProviderRequest};

/// Output language value meaning "keep whatever language the CV is written in".
pub const AUTO_LANGUAGE: &str = "auto";

/// Request body for `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub cv_data: Option<Value>,
    #[serde(default, alias = "jobContext")]
    pub context: Option<String>,
    #[serde(default)]
    pub output_language: Option<String>,
    pub llm_config: Option<LlmConfigInput>,
}

/// Validates the request and builds the provider call for it.
pub fn prepare_generation(request: GenerateRequest) -> Result<ProviderRequest, AppError> {
    let config = request
        .llm_config
        .ok_or_else(|| AppError::Validation("LLM configuration is required".to_string()))?
        .into_provider_config()?;

    let cv_data = match request.cv_data {
        Some(value @ Value::Object(_)) => value,
        Some(_) => {
            return Err(AppError::Validation(
                "cvData must be a JSON object".to_string(),
            ))
        }
        None => return Err(AppError::Validation("cvData is required".to_string())),
    };

    let system_message = build_system_message(
        config.system_prompt.as_deref(),
        request.output_language.as_deref().unwrap_or(AUTO_LANGUAGE),
    );
    let user_message = build_user_message(request.context.as_deref().unwrap_or_default(), &cv_data)?;

    build_chat_request(&config, &system_message, &user_message)
}

/// Writing style (custom or default) + output rules + optional language instruction.
pub fn build_system_message(custom_style: Option<&str>, output_language: &str) -> String {
    let style = custom_style
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let mut message = format!("{style}\n\n{OUTPUT_FORMAT_RULES}");

    let language = output_language.trim();
    if !language.is_empty() && !language.eq_ignore_ascii_case(AUTO_LANGUAGE) {
        message.push_str("\n\n");
        message.push_str(&LANGUAGE_INSTRUCTION_TEMPLATE.replace("{language}", language));
    }
    message
}

/// Job context + pretty-printed CV JSON + the closing JSON-only instruction.
pub fn build_user_message(context: &str, cv_data: &Value) -> Result<String, AppError> {
    let cv_json = serde_json::to_string_pretty(cv_data)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize CV data: {e}")))?;

    let context = context.trim();
    let context = if context.is_empty() {
        NO_CONTEXT_PLACEHOLDER
    } else {
        context
    };

    // Single-pass formatting: braces inside the job text or the CV stay literal.
    Ok(format!(
        "{JOB_CONTEXT_HEADING}\n{context}\n\n{CV_DATA_HEADING}\n{cv_json}\n\n{RETURN_JSON_ONLY}"
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
