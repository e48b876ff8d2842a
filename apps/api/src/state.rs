use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data: each generation owns its own channel and buffers.
#[derive(Clone)]
pub struct AppState {
    /// Pooled HTTP client for every provider call. Its timeout is the generation
    /// ceiling; probes override it per request.
    pub http: Client,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.generation_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }
}
