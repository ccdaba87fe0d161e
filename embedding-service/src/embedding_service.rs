//! Provider-agnostic embedding service.
//!
//! - Construct once from an [`EmbeddingModelConfig`]; the matching HTTP
//!   client is built eagerly so configuration problems surface at startup.
//! - [`EmbeddingService::connect`] first resolves a Vertex AI access token,
//!   falling back to Application Default Credentials.
//! - [`EmbeddingService::ready`] runs the provider health check and fails if
//!   the backend is unreachable or the model is unknown.
//! - [`EmbeddingService::embed_batch`] sends one request per batch and
//!   guarantees one vector per input.
//!
//! # Example
//! ```no_run
//! use embedding_service::{EmbeddingModelConfig, EmbeddingService};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = EmbeddingService::connect(EmbeddingModelConfig::default()).await?;
//! svc.ready().await?;
//! let vectors = svc.embed_batch(&["Data Scientist".to_string()]).await?;
//! println!("dim = {}", vectors[0].len());
//! # Ok(()) }
//! ```

use tracing::info;

use crate::{
    auth::resolve_access_token,
    config::{embedding_model_config::EmbeddingModelConfig, embedding_provider::EmbeddingProvider},
    error_handler::{EmbeddingServiceError, HealthError},
    health_service::{HealthService, HealthStatus},
    services::{ollama_service::OllamaService, vertex_service::VertexService},
};

/// The concrete client behind an [`EmbeddingService`].
#[derive(Debug)]
enum Backend {
    Vertex(VertexService),
    Ollama(OllamaService),
}

/// Shared embedding service for one model profile.
pub struct EmbeddingService {
    cfg: EmbeddingModelConfig,
    backend: Backend,
    health: HealthService,
}

impl EmbeddingService {
    /// Creates the service and its provider client.
    ///
    /// # Errors
    /// Returns [`EmbeddingServiceError::Config`] for invalid configs and
    /// [`EmbeddingServiceError::HttpTransport`] if a client cannot be built.
    pub fn new(cfg: EmbeddingModelConfig) -> Result<Self, EmbeddingServiceError> {
        let backend = match cfg.provider {
            EmbeddingProvider::VertexAi => Backend::Vertex(VertexService::new(cfg.clone())?),
            EmbeddingProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
        };
        let health = HealthService::new(cfg.timeout_secs)?;

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            "embedding service created"
        );

        Ok(Self {
            cfg,
            backend,
            health,
        })
    }

    /// Like [`EmbeddingService::new`], but obtains a Vertex AI token first
    /// when the config carries none.
    ///
    /// # Errors
    /// Returns [`EmbeddingServiceError::Auth`] when no token can be obtained,
    /// otherwise the errors of [`EmbeddingService::new`].
    pub async fn connect(mut cfg: EmbeddingModelConfig) -> Result<Self, EmbeddingServiceError> {
        if let Some(token) = resolve_access_token(&cfg).await? {
            cfg.access_token = Some(token);
        }
        Self::new(cfg)
    }

    /// Probes the backend and returns its status if it is usable.
    ///
    /// # Errors
    /// Returns [`HealthError::NotReady`] when the check reports `ok = false`.
    pub async fn ready(&self) -> Result<HealthStatus, EmbeddingServiceError> {
        let status = self.health.check(&self.cfg).await;
        if status.ok {
            Ok(status)
        } else {
            Err(HealthError::NotReady(status.message).into())
        }
    }

    /// Embeds a batch of texts with a single provider call.
    ///
    /// # Errors
    /// Propagates provider errors and returns
    /// [`EmbeddingServiceError::LengthMismatch`] when the provider returns a
    /// different number of vectors than inputs.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingServiceError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = match &self.backend {
            Backend::Vertex(cli) => cli.embed_batch(inputs).await?,
            Backend::Ollama(cli) => cli.embed_batch(inputs).await?,
        };

        if vectors.len() != inputs.len() {
            return Err(EmbeddingServiceError::LengthMismatch {
                sent: inputs.len(),
                received: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::ConfigError;

    #[test]
    fn vertex_without_token_fails_at_construction() {
        let err = EmbeddingService::new(EmbeddingModelConfig::default())
            .err()
            .expect("missing token must fail");
        assert!(matches!(
            err,
            EmbeddingServiceError::Config(ConfigError::MissingVar("VERTEX_ACCESS_TOKEN"))
        ));
    }

    #[tokio::test]
    async fn empty_batch_does_not_call_the_provider() {
        let cfg = EmbeddingModelConfig::ollama("http://127.0.0.1:9", "nomic-embed-text");
        let svc = EmbeddingService::new(cfg).unwrap();
        assert!(svc.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn connect_keeps_an_explicit_vertex_token() {
        let mut cfg = EmbeddingModelConfig::default();
        cfg.access_token = Some("ya29.explicit".into());
        let svc = EmbeddingService::connect(cfg).await.unwrap();
        assert!(matches!(svc.backend, Backend::Vertex(_)));
    }

    #[tokio::test]
    async fn connect_needs_no_credentials_for_ollama() {
        let cfg = EmbeddingModelConfig::ollama("http://127.0.0.1:9", "nomic-embed-text");
        let svc = EmbeddingService::connect(cfg).await.unwrap();
        assert!(matches!(svc.backend, Backend::Ollama(_)));
    }
}
