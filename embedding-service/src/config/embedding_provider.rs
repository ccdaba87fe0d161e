use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the backend used to compute text embeddings.
///
/// Adding more providers (e.g., OpenAI) is done by extending this enum and
/// adding a client under `services`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingProvider {
    /// Google Vertex AI text-embedding models (`:predict` endpoint).
    VertexAi,
    /// Local Ollama runtime (`/api/embed`).
    Ollama,
}

impl FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vertex" | "vertexai" | "vertex_ai" | "vertex-ai" => Ok(Self::VertexAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!("Vertex".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::VertexAi));
        assert_eq!("vertex-ai".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::VertexAi));
        assert_eq!(" ollama ".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::Ollama));
    }

    #[test]
    fn rejects_unknown_provider() {
        assert_eq!(
            "openai".parse::<EmbeddingProvider>(),
            Err(ConfigError::UnsupportedProvider("openai".into()))
        );
    }
}
