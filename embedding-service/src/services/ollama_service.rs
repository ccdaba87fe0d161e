//! Lightweight Ollama client for batch embeddings.
//!
//! - `POST {endpoint}/api/embed` with `{ "model", "input": [..] }`
//!
//! It uses the universal configuration [`EmbeddingModelConfig`] and ensures
//! that the selected provider is [`EmbeddingProvider::Ollama`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::embedding_model_config::EmbeddingModelConfig;
use crate::config::embedding_provider::EmbeddingProvider;
use crate::error_handler::{
    ConfigError, EmbeddingServiceError, HealthError, HttpError, Result, make_snippet,
};

/// Thin client for Ollama.
///
/// Reuses an HTTP client with a configurable timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: EmbeddingModelConfig,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidProvider`] if `cfg.provider` is not `Ollama`
    /// - [`HealthError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`EmbeddingServiceError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self> {
        if cfg.provider != EmbeddingProvider::Ollama {
            return Err(ConfigError::InvalidProvider { expected: "Ollama" }.into());
        }
        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(HealthError::InvalidEndpoint(cfg.endpoint.clone()).into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_embed = format!("{}/api/embed", base);

        Ok(Self {
            client,
            cfg,
            url_embed,
        })
    }

    /// Retrieves embeddings for a batch of inputs via `/api/embed`.
    ///
    /// # Errors
    /// - [`EmbeddingServiceError::Http`] for non-2xx responses
    /// - [`EmbeddingServiceError::HttpTransport`] for client errors
    /// - [`EmbeddingServiceError::Decode`] if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbedRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!("POST {}", self.url_embed);
        let resp = self
            .client
            .post(&self.url_embed)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HttpError {
                status,
                url: self.url_embed.clone(),
                snippet: make_snippet(&text),
            }
            .into());
        }

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            EmbeddingServiceError::Decode(format!(
                "serde error: {e}; expected `{{ embeddings: number[][] }}`"
            ))
        })?;

        Ok(out.embeddings)
    }
}

/* ==========================
HTTP payloads
========================== */

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response body for `/api/embed`.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}
