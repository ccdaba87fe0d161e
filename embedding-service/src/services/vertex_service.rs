//! Vertex AI text-embedding client.
//!
//! Calls the publisher-model `:predict` endpoint:
//! `POST {endpoint}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:predict`
//!
//! Request body: `{ "instances": [ { "content": "..." }, ... ] }`
//! Response body: `{ "predictions": [ { "embeddings": { "values": [..] } }, ... ] }`
//!
//! Authentication uses an OAuth bearer token taken from the config. It is
//! either set explicitly (`VERTEX_ACCESS_TOKEN`) or filled in from
//! Application Default Credentials by [`crate::auth::resolve_access_token`].

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::embedding_model_config::EmbeddingModelConfig;
use crate::config::embedding_provider::EmbeddingProvider;
use crate::error_handler::{
    ConfigError, EmbeddingServiceError, HttpError, Result, make_snippet, validate_http_endpoint,
};

/// Thin client for Vertex AI embeddings.
///
/// Keeps a preconfigured `reqwest::Client` with the bearer token installed
/// as a default header.
#[derive(Debug)]
pub struct VertexService {
    client: reqwest::Client,
    cfg: EmbeddingModelConfig,
    url_predict: String,
}

impl VertexService {
    /// Creates a new [`VertexService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidProvider`] if `cfg.provider` is not Vertex AI
    /// - [`ConfigError::MissingVar`] if project, location or token is absent
    /// - [`ConfigError::EmptyModel`] if the model name is empty
    /// - [`EmbeddingServiceError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self> {
        if cfg.provider != EmbeddingProvider::VertexAi {
            return Err(ConfigError::InvalidProvider {
                expected: "VertexAi",
            }
            .into());
        }
        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        if cfg.project_id.trim().is_empty() {
            return Err(ConfigError::MissingVar("VERTEX_PROJECT_ID").into());
        }
        if cfg.location.trim().is_empty() {
            return Err(ConfigError::MissingVar("VERTEX_LOCATION").into());
        }
        validate_http_endpoint("VERTEX_ENDPOINT", cfg.endpoint.trim())?;

        let token = cfg
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingVar("VERTEX_ACCESS_TOKEN"))?;
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            ConfigError::InvalidFormat {
                var: "VERTEX_ACCESS_TOKEN",
                reason: "token contains characters not allowed in a header",
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .build()?;

        let url_predict = predict_url(&cfg);

        Ok(Self {
            client,
            cfg,
            url_predict,
        })
    }

    /// Embeds a batch of texts in a single `:predict` call.
    ///
    /// Output order matches input order.
    ///
    /// # Errors
    /// - [`EmbeddingServiceError::Http`] for non-2xx responses
    /// - [`EmbeddingServiceError::HttpTransport`] for client errors
    /// - [`EmbeddingServiceError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = PredictRequest::new(inputs);

        debug!("POST {}", self.url_predict);
        let resp = self
            .client
            .post(&self.url_predict)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HttpError {
                status,
                url: self.url_predict.clone(),
                snippet: make_snippet(&text),
            }
            .into());
        }

        let out: PredictResponse = resp.json().await.map_err(|e| {
            EmbeddingServiceError::Decode(format!(
                "serde error: {e}; expected `{{ predictions: [{{ embeddings: {{ values }} }}] }}`"
            ))
        })?;

        Ok(out.into_vectors())
    }

    /// Returns the `:predict` URL this client posts to.
    pub fn url(&self) -> &str {
        &self.url_predict
    }
}

/// Builds the publisher-model `:predict` URL for the config.
pub fn predict_url(cfg: &EmbeddingModelConfig) -> String {
    format!(
        "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
        cfg.endpoint.trim().trim_end_matches('/'),
        cfg.project_id.trim(),
        cfg.location.trim(),
        cfg.model.trim()
    )
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: Vec<PredictInstance<'a>>,
}

impl<'a> PredictRequest<'a> {
    fn new(inputs: &'a [String]) -> Self {
        Self {
            instances: inputs
                .iter()
                .map(|content| PredictInstance { content })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

impl PredictResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        self.predictions
            .into_iter()
            .map(|p| p.embeddings.values)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    embeddings: PredictionEmbeddings,
}

#[derive(Debug, Deserialize)]
struct PredictionEmbeddings {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with_token() -> EmbeddingModelConfig {
        let mut cfg = EmbeddingModelConfig::default();
        cfg.access_token = Some("ya29.test".into());
        cfg
    }

    #[test]
    fn predict_url_targets_publisher_model() {
        assert_eq!(
            predict_url(&EmbeddingModelConfig::default()),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/passionpay/locations/us-central1/publishers/google/models/text-embedding-004:predict"
        );
    }

    #[test]
    fn request_wraps_each_text_as_instance() {
        let inputs = vec!["Data Scientist".to_string(), "ML Engineer".to_string()];
        let json = serde_json::to_value(PredictRequest::new(&inputs)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "instances": [
                    { "content": "Data Scientist" },
                    { "content": "ML Engineer" }
                ]
            })
        );
    }

    #[test]
    fn response_values_are_extracted_in_order() {
        let raw = r#"{
            "predictions": [
                { "embeddings": { "values": [0.1, 0.2], "statistics": { "token_count": 2, "truncated": false } } },
                { "embeddings": { "values": [0.3, 0.4], "statistics": { "token_count": 3, "truncated": false } } }
            ],
            "metadata": { "billableCharacterCount": 25 }
        }"#;
        let resp: PredictResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.into_vectors(), vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = VertexService::new(EmbeddingModelConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingServiceError::Config(ConfigError::MissingVar("VERTEX_ACCESS_TOKEN"))
        ));
    }

    #[test]
    fn ollama_config_is_rejected() {
        let cfg = EmbeddingModelConfig::ollama("http://localhost:11434", "nomic-embed-text");
        assert!(matches!(
            VertexService::new(cfg),
            Err(EmbeddingServiceError::Config(ConfigError::InvalidProvider { .. }))
        ));
    }

    #[test]
    fn client_builds_with_token() {
        let svc = VertexService::new(cfg_with_token()).unwrap();
        assert!(svc.url().ends_with("text-embedding-004:predict"));
    }
}
