//! Full-replace sink: clear the target collection, then insert every row in
//! fixed-size batches.
//!
//! The stage is a small state machine:
//!
//! ```text
//! Unconnected -> Connected -> Clearing -> Inserting(1) -> .. -> Inserting(n) -> Closed
//! ```
//!
//! Any failure jumps straight to `Closed`. Batches committed before the
//! failure stay in the collection; the rest are abandoned. The connection is
//! closed on every path.

use indicatif::{ProgressBar, ProgressStyle};
use mongodb::bson::Document;
use tracing::{debug, error, info, warn};

use crate::config::SinkConfig;
use crate::documents::dataset_to_documents;
use crate::errors::SinkError;
use crate::record::Dataset;
use crate::store::{CollectionHandle, DocumentStore};

/// Sink lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkState {
    Unconnected,
    Connected,
    Clearing,
    /// One-based number of the batch being inserted.
    Inserting(usize),
    Closed,
}

impl SinkState {
    /// Legal transitions; `Closed` is reachable from every other state.
    pub fn can_transition_to(self, next: SinkState) -> bool {
        use SinkState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Unconnected, Connected) => true,
            (Connected, Clearing) => true,
            (Clearing, Inserting(1)) => true,
            (Inserting(k), Inserting(m)) => m == k + 1,
            _ => false,
        }
    }
}

/// Outcome of one sink run.
#[derive(Debug)]
pub struct SinkReport {
    pub final_state: SinkState,
    /// Every state visited, starting with `Unconnected`.
    pub transitions: Vec<SinkState>,
    pub deleted: u64,
    pub inserted: usize,
    pub batches_committed: usize,
    pub batches_total: usize,
    /// First error; `None` when every batch was written.
    pub error: Option<SinkError>,
}

impl SinkReport {
    fn new() -> Self {
        Self {
            final_state: SinkState::Unconnected,
            transitions: vec![SinkState::Unconnected],
            deleted: 0,
            inserted: 0,
            batches_committed: 0,
            batches_total: 0,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    fn advance(&mut self, next: SinkState) {
        debug_assert!(
            self.final_state.can_transition_to(next),
            "illegal sink transition {:?} -> {:?}",
            self.final_state,
            next
        );
        debug!("sink: {:?} -> {:?}", self.final_state, next);
        self.final_state = next;
        self.transitions.push(next);
    }

    fn fail(&mut self, err: SinkError) {
        error!("Error saving to MongoDB: {err}");
        self.error = Some(err);
    }
}

/// Replaces the contents of the configured collection with `dataset`.
///
/// Never fails: every error is recorded in the returned report.
pub async fn replace_collection(
    dataset: Dataset,
    cfg: &SinkConfig,
    store: &dyn DocumentStore,
) -> SinkReport {
    let mut report = SinkReport::new();

    let Some(uri) = cfg.uri.as_deref() else {
        warn!("{}; skipping save", SinkError::Config);
        report.error = Some(SinkError::Config);
        report.advance(SinkState::Closed);
        return report;
    };

    let handle = match store.connect(uri, &cfg.database, &cfg.collection).await {
        Ok(h) => h,
        Err(e) => {
            report.fail(e);
            report.advance(SinkState::Closed);
            return report;
        }
    };
    report.advance(SinkState::Connected);

    let docs = dataset_to_documents(&dataset);
    drop(dataset);

    if let Err(e) = write_all(&*handle, docs, cfg, &mut report).await {
        report.fail(e);
    }

    handle.close().await;
    report.advance(SinkState::Closed);
    if report.succeeded() {
        info!(
            "Saved {} documents to {}.{}",
            report.inserted, cfg.database, cfg.collection
        );
    }
    report
}

async fn write_all(
    handle: &dyn CollectionHandle,
    docs: Vec<Document>,
    cfg: &SinkConfig,
    report: &mut SinkReport,
) -> Result<(), SinkError> {
    report.advance(SinkState::Clearing);
    report.deleted = handle.delete_all().await?;
    info!(
        "Deleted {} existing documents from {}",
        report.deleted, cfg.collection
    );

    let total = docs.len();
    if total == 0 {
        warn!("No documents to insert");
        return Ok(());
    }

    let size = cfg.write_batch_size.max(1);
    report.batches_total = total.div_ceil(size);

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        pb.set_style(style);
    }

    let mut docs = docs.into_iter();
    let mut start = 0;
    while start < total {
        let batch: Vec<Document> = docs.by_ref().take(size).collect();
        let end = start + batch.len();
        let batch_no = report.batches_committed + 1;
        report.advance(SinkState::Inserting(batch_no));
        info!("Inserting documents {}-{} of {}", start + 1, end, total);

        match handle.insert_many(batch).await {
            Ok(n) => {
                report.inserted += n;
                report.batches_committed += 1;
                pb.inc(n as u64);
            }
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
        start = end;
    }

    pb.finish_and_clear();
    Ok(())
}
