//! Access tokens for Vertex AI.
//!
//! An explicit `VERTEX_ACCESS_TOKEN` wins. Otherwise a token is requested
//! through Application Default Credentials via `gcp_auth`, which looks at
//! `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud user credentials and the
//! GCE metadata server in turn.

use gcp_auth::TokenProvider;
use tracing::{debug, info};

use crate::config::embedding_model_config::EmbeddingModelConfig;
use crate::config::embedding_provider::EmbeddingProvider;
use crate::error_handler::{EmbeddingServiceError, Result};

/// OAuth scope accepted by the Vertex AI prediction API.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Non-blank token already present in the config.
fn explicit_token(cfg: &EmbeddingModelConfig) -> Option<String> {
    cfg.access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Returns the bearer token to use for `cfg`.
///
/// `Ok(None)` for providers that need no token (Ollama).
///
/// # Errors
/// Returns [`EmbeddingServiceError::Auth`] when no credentials are available
/// or the token request fails.
pub async fn resolve_access_token(cfg: &EmbeddingModelConfig) -> Result<Option<String>> {
    if cfg.provider != EmbeddingProvider::VertexAi {
        return Ok(None);
    }
    if let Some(token) = explicit_token(cfg) {
        debug!("using VERTEX_ACCESS_TOKEN");
        return Ok(Some(token));
    }

    info!("VERTEX_ACCESS_TOKEN not set; using Application Default Credentials");
    let provider = gcp_auth::provider()
        .await
        .map_err(|e| EmbeddingServiceError::Auth(e.to_string()))?;
    let token = provider
        .token(&[CLOUD_PLATFORM_SCOPE])
        .await
        .map_err(|e| EmbeddingServiceError::Auth(e.to_string()))?;
    Ok(Some(token.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_token_skips_default_credentials() {
        let mut cfg = EmbeddingModelConfig::default();
        cfg.access_token = Some("  ya29.abc  ".into());
        let token = resolve_access_token(&cfg).await.unwrap();
        assert_eq!(token.as_deref(), Some("ya29.abc"));
    }

    #[tokio::test]
    async fn ollama_needs_no_token() {
        let cfg = EmbeddingModelConfig::ollama("http://localhost:11434", "nomic-embed-text");
        assert_eq!(resolve_access_token(&cfg).await.unwrap(), None);
    }

    #[test]
    fn blank_token_is_not_explicit() {
        let mut cfg = EmbeddingModelConfig::default();
        cfg.access_token = Some("   ".into());
        assert_eq!(explicit_token(&cfg), None);
    }
}
