//! Salary ETL: load salary records, embed job titles, replace a MongoDB
//! collection with the enriched rows.
//!
//! Stages run strictly in order:
//! - [`loader`]: CSV → [`Dataset`] projected onto the column allow-list
//! - [`embed_batches`]: distinct job titles → [`EmbeddingMap`], batch by batch
//! - [`Dataset::attach_embeddings`]: map → per-row vectors
//! - [`sink`]: delete-all, then batched inserts
//!
//! Only a load failure stops a run; embedding and sink failures are reported
//! in the [`RunSummary`] and the run continues.

mod config;
mod documents;
mod embed;
mod embed_batches;
mod errors;
mod loader;
mod record;
mod sink;
mod store;

pub use config::{EmbedderConfig, PipelineConfig, SinkConfig};
pub use documents::{dataset_to_documents, document_to_row, row_to_document};
pub use embed::EmbeddingsProvider;
pub use embed::service_embedder::ServiceEmbedder;
pub use embed_batches::{BatchReport, EmbeddingOutcome, embed_texts, partition, unique_sorted};
pub use errors::{ConfigError, EmbeddingError, EtlError, LoadError, SinkError};
pub use loader::{LoadedDataset, load_dataset, read_dataset};
pub use record::{Column, Dataset, EMBEDDING_FIELD, EmbeddingMap, MissingReport, Row};
pub use sink::{SinkReport, SinkState, replace_collection};
pub use store::memory::InMemoryStore;
pub use store::mongo::MongoStore;
pub use store::{CollectionHandle, DocumentStore};

use tracing::{error, info, warn};

const JOIN_PREVIEW_ROWS: usize = 3;
const JOIN_PREVIEW_DIMS: usize = 5;

/// What one run did.
#[derive(Debug)]
pub struct RunSummary {
    pub rows: usize,
    pub embedded_rows: usize,
    pub embedding: EmbeddingOutcome,
    pub sink: SinkReport,
}

/// High-level facade that wires the three stages.
///
/// This is the single entry point recommended for application code.
pub struct SalaryPipeline {
    cfg: PipelineConfig,
}

impl SalaryPipeline {
    /// # Errors
    /// Returns `EtlError::Config` if the configuration is invalid.
    pub fn new(cfg: PipelineConfig) -> Result<Self, EtlError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Runs load → embed → join → save once.
    ///
    /// # Errors
    /// Returns `EtlError::Load` when the input cannot be loaded; the provider
    /// and the store are not touched in that case.
    pub async fn run(
        &self,
        provider: &dyn EmbeddingsProvider,
        store: &dyn DocumentStore,
    ) -> Result<RunSummary, EtlError> {
        info!("Starting ETL process");

        let LoadedDataset { mut dataset, .. } = match load_dataset(&self.cfg.input_path) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("ETL process failed during data loading: {e}");
                return Err(e.into());
            }
        };

        let embedding = if dataset.job_titles().flatten().next().is_none() {
            warn!("No job titles found; skipping embedding");
            EmbeddingOutcome::default()
        } else {
            embed_texts(dataset.job_titles(), &self.cfg.embedding, provider).await
        };

        let embedded_rows = dataset.attach_embeddings(&embedding.map);
        log_join(&dataset, embedded_rows);

        let rows = dataset.len();
        let sink = replace_collection(dataset, &self.cfg.sink, store).await;

        info!("ETL process finished");
        Ok(RunSummary {
            rows,
            embedded_rows,
            embedding,
            sink,
        })
    }
}

fn log_join(ds: &Dataset, embedded: usize) {
    if !ds.has_embedding {
        warn!("No embeddings generated; saving rows without `{EMBEDDING_FIELD}`");
        return;
    }
    info!("Rows with embeddings: {} / {}", embedded, ds.len());
    let without = ds.len() - embedded;
    if without > 0 {
        warn!("{without} rows have no embedding");
    }
    for row in ds.rows.iter().take(JOIN_PREVIEW_ROWS) {
        let head: Vec<f32> = row
            .job_title_embedding
            .iter()
            .flatten()
            .take(JOIN_PREVIEW_DIMS)
            .copied()
            .collect();
        info!(
            "{:?}: {:?}",
            row.job_title.as_deref().unwrap_or("<missing>"),
            head
        );
    }
}
