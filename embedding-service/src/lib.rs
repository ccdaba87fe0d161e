//! Batch text-embedding clients for the salary ETL.
//!
//! - [`auth`]: Vertex AI access tokens (explicit or Application Default Credentials)
//! - [`config`]: provider/model configuration, resolved from the environment
//! - [`services`]: thin HTTP clients (Vertex AI `:predict`, Ollama `/api/embed`)
//! - [`health_service`]: readiness checks used during initialization
//! - [`embedding_service`]: provider-agnostic facade used by the pipeline
//! - [`telemetry`]: tracing layer shared by the ETL binaries

pub mod auth;
pub mod config;
pub mod embedding_service;
pub mod error_handler;
pub mod health_service;
pub mod services;
pub mod telemetry;

pub use config::default_config::config_from_lookup;
pub use config::embedding_model_config::EmbeddingModelConfig;
pub use config::embedding_provider::EmbeddingProvider;
pub use embedding_service::EmbeddingService;
pub use error_handler::{ConfigError, EmbeddingServiceError};
pub use health_service::HealthStatus;
