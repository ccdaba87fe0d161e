//! Embedding model config resolved from environment variables.
//!
//! # Environment variables
//!
//! - `EMBEDDING_PROVIDER`     = `vertex` (default) or `ollama`
//! - `EMBEDDING_MODEL`        = model name (default `text-embedding-004`)
//! - `EMBEDDING_TIMEOUT_SECS` = optional request timeout (default 60)
//!
//! Vertex AI:
//! - `VERTEX_PROJECT_ID`   (default `passionpay`)
//! - `VERTEX_LOCATION`     (default `us-central1`)
//! - `VERTEX_ENDPOINT`     (optional override of the regional host)
//! - `VERTEX_ACCESS_TOKEN` (bearer token; Application Default Credentials when unset)
//!
//! Ollama:
//! - `OLLAMA_URL` (default `http://localhost:11434`)

use crate::{
    config::{
        embedding_model_config::{
            DEFAULT_LOCATION, DEFAULT_MODEL, DEFAULT_OLLAMA_URL, DEFAULT_PROJECT_ID,
            EmbeddingModelConfig,
        },
        embedding_provider::EmbeddingProvider,
    },
    error_handler::{ConfigError, opt_u64, opt_var, validate_http_endpoint},
};

/// Builds the embedding config from an arbitrary key/value lookup.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `EMBEDDING_PROVIDER`
/// - [`ConfigError::InvalidNumber`] for a malformed `EMBEDDING_TIMEOUT_SECS`
/// - [`ConfigError::InvalidFormat`] for an endpoint without http/https
pub fn config_from_lookup<F>(get: &F) -> Result<EmbeddingModelConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = match opt_var(get, "EMBEDDING_PROVIDER") {
        Some(p) => p.parse::<EmbeddingProvider>()?,
        None => EmbeddingProvider::VertexAi,
    };
    let model = opt_var(get, "EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let mut cfg = match provider {
        EmbeddingProvider::VertexAi => {
            let project = opt_var(get, "VERTEX_PROJECT_ID")
                .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());
            let location =
                opt_var(get, "VERTEX_LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string());
            let mut cfg = EmbeddingModelConfig::vertex(project, location, model);
            if let Some(endpoint) = opt_var(get, "VERTEX_ENDPOINT") {
                validate_http_endpoint("VERTEX_ENDPOINT", &endpoint)?;
                cfg.endpoint = endpoint;
            }
            cfg.access_token = opt_var(get, "VERTEX_ACCESS_TOKEN");
            cfg
        }
        EmbeddingProvider::Ollama => {
            let endpoint =
                opt_var(get, "OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            validate_http_endpoint("OLLAMA_URL", &endpoint)?;
            EmbeddingModelConfig::ollama(endpoint, model)
        }
    };

    if let Some(secs) = opt_u64(get, "EMBEDDING_TIMEOUT_SECS")? {
        cfg.timeout_secs = Some(secs);
    }

    Ok(cfg)
}
