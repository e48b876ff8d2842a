//! Provider probes — connectivity check and model listing for the settings screen.
//!
//! Both are quick, bounded calls and deliberately use their own short timeouts
//! instead of the multi-minute generation ceiling on the shared client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::classify::classify;
use crate::llm_client::provider::{
    auth_headers, openai_base_url, trim_base_url, Provider, ProviderFamily,
};

pub const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// One model as shown in the model picker, normalized across providers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: u64,
    pub modified: String,
}

#[derive(Debug, Deserialize)]
struct LocalTags {
    #[serde(default)]
    models: Vec<LocalModel>,
}

#[derive(Debug, Deserialize)]
struct LocalModel {
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    modified_at: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    #[serde(default)]
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
    #[serde(default)]
    created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AnthropicModelList {
    #[serde(default)]
    data: Vec<AnthropicModel>,
}

#[derive(Debug, Deserialize)]
struct AnthropicModel {
    id: String,
    #[serde(default)]
    created_at: String,
}

/// Endpoint that lists models for a provider family.
pub fn models_url(provider: Provider, base_url: &str) -> String {
    match provider.family() {
        ProviderFamily::LocalStreaming => format!("{}/api/tags", trim_base_url(base_url)),
        ProviderFamily::OpenAiCompatible => format!("{}/models", openai_base_url(base_url)),
        ProviderFamily::Anthropic => format!("{}/models", trim_base_url(base_url)),
    }
}

/// Lists the models a provider offers, sorted by name.
pub async fn list_models(
    client: &Client,
    provider: Provider,
    base_url: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Vec<ModelInfo>, AppError> {
    let url = models_url(provider, base_url);
    let failure = |status: u16, message: String| AppError::Upstream {
        message,
        status,
        provider: provider.display_name().to_string(),
    };

    let response = client
        .get(&url)
        .headers(auth_headers(provider, api_key)?)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| {
            let message = if e.is_timeout() {
                format!("{provider} did not respond within {}s.", timeout.as_secs())
            } else {
                format!("Could not reach {provider}: {e}")
            };
            failure(0, message)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Model listing on {provider} returned {status}");
        return Err(failure(
            status.as_u16(),
            classify(status.as_u16(), &body, provider.display_name()),
        ));
    }

    let unreadable = |_| {
        failure(
            status.as_u16(),
            format!("{provider} returned an unreadable model list."),
        )
    };
    let mut models: Vec<ModelInfo> = match provider.family() {
        ProviderFamily::LocalStreaming => response
            .json::<LocalTags>()
            .await
            .map_err(unreadable)?
            .models
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name,
                size: m.size,
                modified: m.modified_at,
            })
            .collect(),
        ProviderFamily::OpenAiCompatible => response
            .json::<OpenAiModelList>()
            .await
            .map_err(unreadable)?
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id,
                size: 0,
                modified: m.created.map(|c| c.to_string()).unwrap_or_default(),
            })
            .collect(),
        ProviderFamily::Anthropic => response
            .json::<AnthropicModelList>()
            .await
            .map_err(unreadable)?
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id,
                size: 0,
                modified: m.created_at,
            })
            .collect(),
    };

    models.sort_by(|a, b| a.name.cmp(&b.name));
    info!("{provider} lists {} models", models.len());
    Ok(models)
}

/// Checks that a provider is reachable and accepts the credentials.
/// Returns a human-readable success message.
pub async fn test_connection(
    client: &Client,
    provider: Provider,
    base_url: &str,
    api_key: Option<&str>,
) -> Result<String, AppError> {
    let models = list_models(client, provider, base_url, api_key, CONNECTION_TEST_TIMEOUT).await?;
    Ok(format!(
        "Connected to {provider} ({} models available)",
        models.len()
    ))
}
