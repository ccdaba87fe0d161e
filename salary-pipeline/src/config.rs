//! Runtime configuration for a pipeline run.
//!
//! Defaults reproduce the production job; every value can be overridden
//! from the environment (see [`PipelineConfig::from_lookup`]).

use std::path::PathBuf;
use std::time::Duration;

use embedding_service::EmbeddingModelConfig;

use crate::errors::ConfigError;

/// Default input file.
pub const DEFAULT_INPUT_PATH: &str = "data/raw/DataScience_salaries_2025.csv";
/// Texts per embedding request.
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 20;
/// Pause between successive embedding requests.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(500);
/// Target database.
pub const DEFAULT_DATABASE: &str = "passion_pay_db";
/// Target collection.
pub const DEFAULT_COLLECTION: &str = "job_salaries";
/// Documents per `insert_many`.
pub const DEFAULT_WRITE_BATCH_SIZE: usize = 5000;

/// Embedding stage settings.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbedderConfig {
    /// Provider, model and namespace (project/location).
    pub model: EmbeddingModelConfig,
    /// Unique texts per request.
    pub batch_size: usize,
    /// Fixed pause between successive requests.
    pub batch_pause: Duration,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModelConfig::default(),
            batch_size: DEFAULT_EMBEDDING_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

/// Sink stage settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// MongoDB connection string; `None` skips the sink.
    pub uri: Option<String>,
    /// Target database name.
    pub database: String,
    /// Target collection name.
    pub collection: String,
    /// Documents per insert request.
    pub write_batch_size: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
        }
    }
}

/// Configuration for one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Delimited input file with a header row.
    pub input_path: PathBuf,
    pub embedding: EmbedderConfig,
    pub sink: SinkConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            embedding: EmbedderConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|k: &str| std::env::var(k).ok())
    }

    /// Reads the configuration from an arbitrary key/value lookup.
    ///
    /// Variables used:
    /// - `SALARY_CSV_PATH` (default: `data/raw/DataScience_salaries_2025.csv`)
    /// - `EMBEDDING_BATCH_SIZE` (default: 20)
    /// - `EMBEDDING_BATCH_PAUSE_MS` (default: 500)
    /// - `MONGODB_URI` (no default; the sink is skipped without it)
    /// - `MONGODB_DATABASE` (default: `passion_pay_db`)
    /// - `MONGODB_COLLECTION` (default: `job_salaries`)
    /// - `MONGODB_WRITE_BATCH` (default: 5000)
    /// - provider settings, see [`embedding_service::config_from_lookup`]
    pub fn from_lookup<F>(get: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let embedding = EmbedderConfig {
            model: embedding_service::config_from_lookup(get)?,
            batch_size: read_usize(&var, "EMBEDDING_BATCH_SIZE")?
                .unwrap_or(DEFAULT_EMBEDDING_BATCH_SIZE),
            batch_pause: read_u64(&var, "EMBEDDING_BATCH_PAUSE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BATCH_PAUSE),
        };

        let sink = SinkConfig {
            uri: var("MONGODB_URI"),
            database: var("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            collection: var("MONGODB_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            write_batch_size: read_usize(&var, "MONGODB_WRITE_BATCH")?
                .unwrap_or(DEFAULT_WRITE_BATCH_SIZE),
        };

        let cfg = Self {
            input_path: var("SALARY_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH)),
            embedding,
            sink,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize("EMBEDDING_BATCH_SIZE"));
        }
        if self.sink.write_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize("MONGODB_WRITE_BATCH"));
        }
        Ok(())
    }
}

fn read_usize<F>(var: &F, key: &'static str) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber { var: key, value: v })
        })
        .transpose()
}

fn read_u64<F>(var: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { var: key, value: v })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_production_job() {
        let cfg = PipelineConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.embedding.batch_size, 20);
        assert_eq!(cfg.embedding.batch_pause, Duration::from_millis(500));
        assert_eq!(cfg.embedding.model.project_id, "passionpay");
        assert_eq!(cfg.embedding.model.location, "us-central1");
        assert_eq!(cfg.embedding.model.model, "text-embedding-004");
        assert_eq!(cfg.sink.database, "passion_pay_db");
        assert_eq!(cfg.sink.collection, "job_salaries");
        assert_eq!(cfg.sink.write_batch_size, 5000);
        assert!(cfg.sink.uri.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let cfg = PipelineConfig::from_lookup(&lookup(&[
            ("SALARY_CSV_PATH", "/tmp/salaries.csv"),
            ("EMBEDDING_BATCH_SIZE", "5"),
            ("EMBEDDING_BATCH_PAUSE_MS", "0"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("MONGODB_COLLECTION", "job_salaries_test"),
            ("MONGODB_WRITE_BATCH", "100"),
        ]))
        .unwrap();
        assert_eq!(cfg.input_path, PathBuf::from("/tmp/salaries.csv"));
        assert_eq!(cfg.embedding.batch_size, 5);
        assert_eq!(cfg.embedding.batch_pause, Duration::ZERO);
        assert_eq!(cfg.sink.uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(cfg.sink.collection, "job_salaries_test");
        assert_eq!(cfg.sink.write_batch_size, 100);
    }

    #[test]
    fn blank_uri_means_no_sink() {
        let cfg = PipelineConfig::from_lookup(&lookup(&[("MONGODB_URI", "  ")])).unwrap();
        assert!(cfg.sink.uri.is_none());
    }

    #[test]
    fn invalid_numbers_and_zero_batches_are_rejected() {
        assert_eq!(
            PipelineConfig::from_lookup(&lookup(&[("EMBEDDING_BATCH_SIZE", "twenty")])),
            Err(ConfigError::InvalidNumber {
                var: "EMBEDDING_BATCH_SIZE",
                value: "twenty".into()
            })
        );
        assert_eq!(
            PipelineConfig::from_lookup(&lookup(&[("MONGODB_WRITE_BATCH", "0")])),
            Err(ConfigError::ZeroBatchSize("MONGODB_WRITE_BATCH"))
        );
    }
}
