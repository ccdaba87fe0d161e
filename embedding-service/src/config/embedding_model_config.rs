use crate::config::embedding_provider::EmbeddingProvider;

/// Default Google Cloud project used for Vertex AI calls.
pub const DEFAULT_PROJECT_ID: &str = "passionpay";
/// Default Vertex AI region.
pub const DEFAULT_LOCATION: &str = "us-central1";
/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-004";
/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Configuration for an embedding model invocation.
///
/// # Fields
///
/// - `provider`: which backend to use (Vertex AI or Ollama).
/// - `model`: model identifier (e.g., `"text-embedding-004"`, `"nomic-embed-text"`).
/// - `endpoint`: base URL of the inference API.
/// - `project_id` / `location`: Vertex AI namespace; ignored by Ollama.
/// - `access_token`: OAuth bearer token for Vertex AI; ignored by Ollama.
/// - `timeout_secs`: optional request timeout in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingModelConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub endpoint: String,
    pub project_id: String,
    pub location: String,
    pub access_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl EmbeddingModelConfig {
    /// Vertex AI config with the given namespace; the endpoint is the
    /// regional `aiplatform` host.
    pub fn vertex(
        project_id: impl Into<String>,
        location: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            provider: EmbeddingProvider::VertexAi,
            model: model.into(),
            endpoint: vertex_endpoint(&location),
            project_id: project_id.into(),
            location,
            access_token: None,
            timeout_secs: Some(60),
        }
    }

    /// Ollama config for a local or remote Ollama server.
    pub fn ollama(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: EmbeddingProvider::Ollama,
            model: model.into(),
            endpoint: endpoint.into(),
            project_id: String::new(),
            location: String::new(),
            access_token: None,
            timeout_secs: Some(60),
        }
    }
}

impl Default for EmbeddingModelConfig {
    fn default() -> Self {
        Self::vertex(DEFAULT_PROJECT_ID, DEFAULT_LOCATION, DEFAULT_MODEL)
    }
}

/// Regional Vertex AI base URL, e.g. `https://us-central1-aiplatform.googleapis.com`.
pub fn vertex_endpoint(location: &str) -> String {
    format!("https://{location}-aiplatform.googleapis.com")
}
