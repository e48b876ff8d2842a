//! Provider Request Builder.
//!
//! Every named provider collapses into one of three wire families. The family is
//! chosen once here and once in the bridge (mode selection); nothing else branches
//! on individual providers.

use std::fmt;
use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::llm_client::prompts::EXTRACTION_SYSTEM;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 4096;
const OPENAI_TEMPERATURE: f32 = 0.2;

/// The three behavioural families behind the named providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    /// Locally hosted NDJSON streaming server (`/api/generate`).
    LocalStreaming,
    /// `/v1/chat/completions`, Bearer auth.
    OpenAiCompatible,
    /// `/messages`, `x-api-key` auth.
    Anthropic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Ollama,
    OpenAi,
    Groq,
    Mistral,
    OpenRouter,
    DeepSeek,
    Together,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 8] = [
        Provider::Ollama,
        Provider::OpenAi,
        Provider::Groq,
        Provider::Mistral,
        Provider::OpenRouter,
        Provider::DeepSeek,
        Provider::Together,
        Provider::Anthropic,
    ];

    pub fn family(self) -> ProviderFamily {
        match self {
            Provider::Ollama => ProviderFamily::LocalStreaming,
            Provider::Anthropic => ProviderFamily::Anthropic,
            Provider::OpenAi
            | Provider::Groq
            | Provider::Mistral
            | Provider::OpenRouter
            | Provider::DeepSeek
            | Provider::Together => ProviderFamily::OpenAiCompatible,
        }
    }

    /// Wire identifier as sent by the UI.
    pub fn id(self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
            Provider::Groq => "groq",
            Provider::Mistral => "mistral",
            Provider::OpenRouter => "openrouter",
            Provider::DeepSeek => "deepseek",
            Provider::Together => "together",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Name used in user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAi => "OpenAI",
            Provider::Groq => "Groq",
            Provider::Mistral => "Mistral",
            Provider::OpenRouter => "OpenRouter",
            Provider::DeepSeek => "DeepSeek",
            Provider::Together => "Together AI",
            Provider::Anthropic => "Anthropic",
        }
    }

    pub fn requires_api_key(self) -> bool {
        self.family() != ProviderFamily::LocalStreaming
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.id() == wanted)
            .ok_or_else(|| AppError::UnsupportedProvider(s.trim().to_string()))
    }
}

/// Validated provider configuration, passed by value into each request.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
}

/// Loosely-typed provider configuration as it arrives from the UI (JSON or multipart).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfigInput {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
}

impl LlmConfigInput {
    /// Checks the minimum needed to reach a provider: provider id, base URL and model,
    /// plus an API key for every non-local provider.
    pub fn into_provider_config(self) -> Result<ProviderConfig, AppError> {
        let provider = match non_blank(self.provider) {
            Some(id) => id.parse::<Provider>()?,
            None => Provider::default(),
        };
        let base_url = non_blank(self.base_url).ok_or_else(|| {
            AppError::Validation("LLM configuration is incomplete: baseUrl is required".to_string())
        })?;
        let model = non_blank(self.model).ok_or_else(|| {
            AppError::Validation("LLM configuration is incomplete: model is required".to_string())
        })?;
        let api_key = non_blank(self.api_key);
        if provider.requires_api_key() && api_key.is_none() {
            return Err(AppError::Validation(format!(
                "An API key is required for {provider}"
            )));
        }

        Ok(ProviderConfig {
            provider,
            base_url,
            model,
            api_key,
            system_prompt: non_blank(self.system_prompt),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A fully-formed upstream call. Carries the provider so the bridge can pick its mode.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub provider: Provider,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ProviderRequest {
    pub fn family(&self) -> ProviderFamily {
        self.provider.family()
    }
}

/// Builds the chat/completion call for the configured provider.
pub fn build_chat_request(
    config: &ProviderConfig,
    system_message: &str,
    user_message: &str,
) -> Result<ProviderRequest, AppError> {
    let provider = config.provider;
    let (url, body) = match provider.family() {
        ProviderFamily::LocalStreaming => (
            format!("{}/api/generate", trim_base_url(&config.base_url)),
            json!({
                "model": config.model,
                "prompt": format!("{system_message}\n\n{user_message}"),
                "stream": true,
                "format": "json",
            }),
        ),
        ProviderFamily::OpenAiCompatible => (
            format!("{}/chat/completions", openai_base_url(&config.base_url)),
            json!({
                "model": config.model,
                "messages": [
                    { "role": "system", "content": system_message },
                    { "role": "user", "content": user_message },
                ],
                "temperature": OPENAI_TEMPERATURE,
            }),
        ),
        ProviderFamily::Anthropic => (
            format!("{}/messages", trim_base_url(&config.base_url)),
            json!({
                "model": config.model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "system": system_message,
                "messages": [{ "role": "user", "content": user_message }],
            }),
        ),
    };

    let mut headers = auth_headers(provider, config.api_key.as_deref())?;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(ProviderRequest {
        provider,
        url,
        headers,
        body,
    })
}

/// Builds the structuring call used by PDF import: a fixed JSON-only system message
/// and the extraction prompt as the user turn.
pub fn build_extraction_request(
    config: &ProviderConfig,
    prompt: &str,
) -> Result<ProviderRequest, AppError> {
    build_chat_request(config, EXTRACTION_SYSTEM, prompt)
}

/// Auth headers for a provider. Only providers that require a key ever send one.
pub fn auth_headers(provider: Provider, api_key: Option<&str>) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let Some(key) = api_key.filter(|_| provider.requires_api_key()) else {
        return Ok(headers);
    };

    let invalid = |_| AppError::Validation("API key contains invalid characters".to_string());
    match provider.family() {
        ProviderFamily::OpenAiCompatible => {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
            );
        }
        ProviderFamily::Anthropic => {
            headers.insert(
                HeaderName::from_static("x-api-key"),
                HeaderValue::from_str(key).map_err(invalid)?,
            );
            headers.insert(
                HeaderName::from_static("anthropic-version"),
                HeaderValue::from_static(ANTHROPIC_VERSION),
            );
        }
        ProviderFamily::LocalStreaming => {}
    }
    Ok(headers)
}

/// Strips trailing slashes.
pub fn trim_base_url(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

/// OpenAI-compatible base URL, guaranteed to end in `/v1`.
pub fn openai_base_url(base_url: &str) -> String {
    let trimmed = trim_base_url(base_url);
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}
