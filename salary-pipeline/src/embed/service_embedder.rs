//! [`EmbeddingsProvider`] backed by the `embedding-service` HTTP clients.

use embedding_service::{EmbeddingModelConfig, EmbeddingService};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::info;

use crate::embed::EmbeddingsProvider;
use crate::errors::EmbeddingError;

/// Lazily constructed embedding service.
///
/// The client is built and health-checked in [`EmbeddingsProvider::initialize`],
/// so missing credentials or an unreachable endpoint become an init failure
/// instead of a startup error. Without `VERTEX_ACCESS_TOKEN` the token comes
/// from Application Default Credentials.
pub struct ServiceEmbedder {
    cfg: EmbeddingModelConfig,
    svc: OnceCell<EmbeddingService>,
}

impl ServiceEmbedder {
    pub fn new(cfg: EmbeddingModelConfig) -> Self {
        Self {
            cfg,
            svc: OnceCell::new(),
        }
    }

    async fn connect(&self) -> Result<(), EmbeddingError> {
        if self.svc.initialized() {
            return Ok(());
        }
        let svc = EmbeddingService::connect(self.cfg.clone())
            .await
            .map_err(|e| EmbeddingError::Init(e.to_string()))?;
        let status = svc
            .ready()
            .await
            .map_err(|e| EmbeddingError::Init(e.to_string()))?;
        info!(
            model = %status.model,
            latency_ms = status.latency_ms as u64,
            "Embedding model loaded successfully"
        );
        // already set by a concurrent initializer
        let _ = self.svc.set(svc);
        Ok(())
    }
}

impl EmbeddingsProvider for ServiceEmbedder {
    fn initialize(&self) -> BoxFuture<'_, Result<(), EmbeddingError>> {
        self.connect().boxed()
    }

    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, EmbeddingError>> {
        async move {
            let svc = self.svc.get().ok_or(EmbeddingError::NotInitialized)?;
            svc.embed_batch(texts)
                .await
                .map_err(|e| EmbeddingError::Request(e.to_string()))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_before_initialize_is_rejected() {
        let emb = ServiceEmbedder::new(EmbeddingModelConfig::ollama(
            "http://127.0.0.1:9",
            "nomic-embed-text",
        ));
        let err = emb.embed_batch(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::NotInitialized));
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_init_error() {
        let emb = ServiceEmbedder::new(EmbeddingModelConfig::ollama(
            "http://127.0.0.1:9",
            "nomic-embed-text",
        ));
        let err = emb.initialize().await.unwrap_err();
        assert!(err.is_init());
        let err = emb.embed_batch(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::NotInitialized));
    }
}
