//! Readiness checks for embedding backends.
//!
//! - Ollama: `GET {endpoint}/api/tags` and verify the model is pulled
//! - Vertex AI: `GET {endpoint}/v1beta1/publishers/google/models/{model}` with Bearer auth
//!
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).
//! Provider-specific checks (`try_*`) return strict `Result`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::embedding_model_config::EmbeddingModelConfig;
use crate::config::embedding_provider::EmbeddingProvider;
use crate::error_handler::{
    ConfigError, EmbeddingServiceError, HealthError, HttpError, make_snippet,
};

/// Health snapshot for a single provider/config.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "VertexAi", "Ollama").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier the check looked for.
    pub model: String,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the check.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    fn new(
        cfg: &EmbeddingModelConfig,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// A health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`EmbeddingServiceError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, EmbeddingServiceError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        debug!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks a config, routing to the provider-specific check.
    ///
    /// Never returns an error: failures become `HealthStatus { ok: false, .. }`.
    pub async fn check(&self, cfg: &EmbeddingModelConfig) -> HealthStatus {
        let start = Instant::now();
        let result = match cfg.provider {
            EmbeddingProvider::Ollama => self.try_check_ollama(cfg).await,
            EmbeddingProvider::VertexAi => self.try_check_vertex(cfg).await,
        };

        match result {
            Ok(mut status) => {
                if status.latency_ms == 0 {
                    status.latency_ms = start.elapsed().as_millis();
                }
                info!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    model = %status.model,
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health check completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    model = %status.model,
                    message = %status.message,
                    "health check failed"
                );
                status
            }
        }
    }

    /// Strict Ollama check.
    ///
    /// - `GET {endpoint}/api/tags`, ensure 2xx
    /// - `ok=false` if `cfg.model` is not in the returned tags (with or without `:latest`)
    async fn try_check_ollama(
        &self,
        cfg: &EmbeddingModelConfig,
    ) -> Result<HealthStatus, EmbeddingServiceError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim().trim_end_matches('/'));
        let timeout = self.timeout_for(cfg);

        let start = Instant::now();
        debug!(provider = "Ollama", model = %cfg.model, "GET {}", url);
        let resp = self.client.get(&url).timeout(timeout).send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            })
            .into());
        }

        let tags: OllamaTags = resp
            .json()
            .await
            .map_err(|e| EmbeddingServiceError::Decode(format!("/api/tags: {e}")))?;

        if tags.contains(&cfg.model) {
            Ok(HealthStatus::new(cfg, true, latency, "Ollama is healthy; model is available"))
        } else {
            Ok(HealthStatus::new(
                cfg,
                false,
                latency,
                "Ollama is up, but model not found in /api/tags",
            ))
        }
    }

    /// Strict Vertex AI check.
    ///
    /// - `GET {endpoint}/v1beta1/publishers/google/models/{model}` with Bearer auth
    /// - 404 means the model name is unknown to Vertex AI
    async fn try_check_vertex(
        &self,
        cfg: &EmbeddingModelConfig,
    ) -> Result<HealthStatus, EmbeddingServiceError> {
        let token = cfg
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingVar("VERTEX_ACCESS_TOKEN"))?;
        let url = publisher_model_url(cfg);
        let timeout = self.timeout_for(cfg);

        let start = Instant::now();
        debug!(provider = "VertexAi", model = %cfg.model, "GET {}", url);
        let resp = self
            .client
            .get(&url)
            .timeout(timeout)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        let latency = start.elapsed().as_millis();

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(HealthStatus::new(
                cfg,
                false,
                latency,
                format!("Vertex AI does not know model `{}`", cfg.model),
            ));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet: make_snippet(&text),
            })
            .into());
        }

        Ok(HealthStatus::new(cfg, true, latency, "Vertex AI model is available"))
    }

    fn timeout_for(&self, cfg: &EmbeddingModelConfig) -> Duration {
        cfg.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
    }
}

/// Publisher model resource URL used by the Vertex AI check.
pub fn publisher_model_url(cfg: &EmbeddingModelConfig) -> String {
    format!(
        "{}/v1beta1/publishers/google/models/{}",
        cfg.endpoint.trim().trim_end_matches('/'),
        cfg.model.trim()
    )
}

/// Minimal `/api/tags` shape: `{ "models": [ { "name": "<model>" }, ... ] }`.
#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
}

impl OllamaTags {
    fn contains(&self, model: &str) -> bool {
        let model = model.trim();
        self.models.iter().any(|m| {
            m.name == model || m.name.strip_suffix(":latest").is_some_and(|base| base == model)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_with_and_without_latest_suffix() {
        let tags: OllamaTags = serde_json::from_str(
            r#"{"models":[{"name":"nomic-embed-text:latest"},{"name":"bge-m3:567m"}]}"#,
        )
        .unwrap();
        assert!(tags.contains("nomic-embed-text"));
        assert!(tags.contains("nomic-embed-text:latest"));
        assert!(tags.contains("bge-m3:567m"));
        assert!(!tags.contains("bge-m3"));
    }

    #[test]
    fn empty_tags_response_contains_nothing() {
        let tags: OllamaTags = serde_json::from_str("{}").unwrap();
        assert!(!tags.contains("nomic-embed-text"));
    }

    #[test]
    fn publisher_model_url_uses_regional_host() {
        assert_eq!(
            publisher_model_url(&EmbeddingModelConfig::default()),
            "https://us-central1-aiplatform.googleapis.com/v1beta1/publishers/google/models/text-embedding-004"
        );
    }

    #[tokio::test]
    async fn vertex_check_without_token_reports_not_ok() {
        let health = HealthService::new(Some(1)).unwrap();
        let status = health.check(&EmbeddingModelConfig::default()).await;
        assert!(!status.ok);
        assert!(status.message.contains("VERTEX_ACCESS_TOKEN"));
    }
}
