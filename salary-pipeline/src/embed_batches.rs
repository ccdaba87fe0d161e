//! Batch embedder: dedup, ordered batching, per-batch failure isolation and
//! a fixed pause between requests.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};

use crate::config::EmbedderConfig;
use crate::embed::EmbeddingsProvider;
use crate::errors::EmbeddingError;
use crate::record::EmbeddingMap;

/// What happened to one batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Zero-based batch number.
    pub index: usize,
    /// Texts in the batch.
    pub size: usize,
    /// `None` on success.
    pub error: Option<EmbeddingError>,
}

impl BatchReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one embedding phase.
#[derive(Debug, Default)]
pub struct EmbeddingOutcome {
    pub map: EmbeddingMap,
    /// Distinct non-missing input values.
    pub unique_count: usize,
    pub batches: Vec<BatchReport>,
    /// Pauses taken between batches.
    pub pauses: usize,
    /// Set when the provider could not be initialized; no batch ran.
    pub init_error: Option<EmbeddingError>,
}

impl EmbeddingOutcome {
    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| !b.succeeded()).count()
    }
}

/// Distinct values in lexicographic order; missing values are dropped.
pub fn unique_sorted<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values
        .into_iter()
        .flatten()
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Consecutive chunks of at most `batch_size` texts.
pub fn partition(texts: &[String], batch_size: usize) -> Vec<&[String]> {
    texts.chunks(batch_size.max(1)).collect()
}

/// Embeds the distinct values of `values` batch by batch.
///
/// Never fails: an init failure yields an empty map with `init_error` set,
/// and a failed batch is reported and skipped without retry.
pub async fn embed_texts<'a, I>(
    values: I,
    cfg: &EmbedderConfig,
    provider: &dyn EmbeddingsProvider,
) -> EmbeddingOutcome
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let texts = unique_sorted(values);
    let mut out = EmbeddingOutcome {
        unique_count: texts.len(),
        ..EmbeddingOutcome::default()
    };
    if texts.is_empty() {
        warn!("No texts provided for embedding");
        return out;
    }

    info!(
        "Generating embeddings for {} unique texts with {}",
        texts.len(),
        cfg.model.model
    );
    if let Err(e) = provider.initialize().await {
        error!("Failed to load embedding model: {e}");
        out.init_error = Some(e);
        return out;
    }

    let batches = partition(&texts, cfg.batch_size);
    let total = batches.len();
    let mut dim: Option<usize> = None;

    for (index, batch) in batches.into_iter().enumerate() {
        if index > 0 && !cfg.batch_pause.is_zero() {
            tokio::time::sleep(cfg.batch_pause).await;
        }
        if index > 0 {
            out.pauses += 1;
        }

        info!("Processing batch {}/{} ({} texts)", index + 1, total, batch.len());
        let res = match provider.embed_batch(batch).await {
            Ok(vectors) => accept(batch, vectors, &mut dim, &mut out.map),
            Err(e) => Err(e),
        };
        if let Err(e) = &res {
            error!("Error processing batch {}: {e}", index + 1);
        }
        out.batches.push(BatchReport {
            index,
            size: batch.len(),
            error: res.err(),
        });
    }

    info!(
        "Generated embeddings for {} of {} unique texts ({} failed batches)",
        out.map.len(),
        out.unique_count,
        out.failed_batches()
    );
    out
}

/// Checks a batch response and merges it into `map`; nothing is merged on error.
fn accept(
    batch: &[String],
    vectors: Vec<Vec<f32>>,
    dim: &mut Option<usize>,
    map: &mut EmbeddingMap,
) -> Result<(), EmbeddingError> {
    if vectors.len() != batch.len() {
        return Err(EmbeddingError::CountMismatch {
            got: vectors.len(),
            want: batch.len(),
        });
    }
    if vectors.iter().any(Vec::is_empty) {
        return Err(EmbeddingError::EmptyVector);
    }
    let want = match *dim {
        Some(d) => d,
        None => vectors.first().map_or(0, Vec::len),
    };
    if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
        return Err(EmbeddingError::VectorSizeMismatch {
            got: bad.len(),
            want,
        });
    }
    *dim = Some(want);
    debug!("batch accepted: {} vectors of dim {}", vectors.len(), want);
    map.extend(batch.iter().cloned().zip(vectors));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Returns `[len, first byte]` per text; fails the listed batch numbers.
    #[derive(Default)]
    struct Scripted {
        fail_init: bool,
        fail_batches: Vec<usize>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl EmbeddingsProvider for Scripted {
        fn initialize(&self) -> BoxFuture<'_, Result<(), EmbeddingError>> {
            let fail = self.fail_init;
            async move {
                if fail {
                    Err(EmbeddingError::Init("unreachable".into()))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }

        fn embed_batch<'a>(
            &'a self,
            texts: &'a [String],
        ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, EmbeddingError>> {
            async move {
                let n = {
                    let mut calls = self.calls.lock().unwrap();
                    calls.push(texts.to_vec());
                    calls.len() - 1
                };
                if self.fail_batches.contains(&n) {
                    return Err(EmbeddingError::Request("boom".into()));
                }
                Ok(texts
                    .iter()
                    .map(|t| vec![t.len() as f32, t.as_bytes()[0] as f32])
                    .collect())
            }
            .boxed()
        }
    }

    fn cfg(batch_size: usize) -> EmbedderConfig {
        EmbedderConfig {
            batch_size,
            batch_pause: Duration::ZERO,
            ..EmbedderConfig::default()
        }
    }

    #[test]
    fn dedup_drops_missing_and_sorts() {
        let got = unique_sorted([Some("b"), None, Some("a"), Some("b")]);
        assert_eq!(got, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn partition_is_deterministic() {
        let texts: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        let sizes: Vec<usize> = partition(&texts, 3).iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(partition(&texts, 3), partition(&texts, 3));
    }

    #[tokio::test]
    async fn empty_input_skips_initialization() {
        let p = Scripted {
            fail_init: true,
            ..Scripted::default()
        };
        let out = embed_texts([None, None], &cfg(5), &p).await;
        assert!(out.map.is_empty());
        assert!(out.init_error.is_none());
        assert!(out.batches.is_empty());
    }

    #[tokio::test]
    async fn init_failure_yields_empty_map() {
        let p = Scripted {
            fail_init: true,
            ..Scripted::default()
        };
        let out = embed_texts([Some("a")], &cfg(5), &p).await;
        assert!(out.map.is_empty());
        assert!(out.init_error.as_ref().is_some_and(EmbeddingError::is_init));
        assert!(p.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_batch_is_skipped_and_pauses_still_counted() {
        let p = Scripted {
            fail_batches: vec![1],
            ..Scripted::default()
        };
        let values = ["a", "b", "c", "d", "e"].map(Some);
        let out = embed_texts(values, &cfg(2), &p).await;

        assert_eq!(out.batches.len(), 3);
        assert_eq!(out.pauses, 2);
        assert_eq!(out.failed_batches(), 1);
        let keys: Vec<&str> = out.map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "e"]);
    }

    #[tokio::test]
    async fn short_response_is_a_count_mismatch() {
        struct Short;
        impl EmbeddingsProvider for Short {
            fn initialize(&self) -> BoxFuture<'_, Result<(), EmbeddingError>> {
                async { Ok(()) }.boxed()
            }
            fn embed_batch<'a>(
                &'a self,
                _texts: &'a [String],
            ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, EmbeddingError>> {
                async { Ok(vec![vec![0.0]]) }.boxed()
            }
        }

        let out = embed_texts([Some("a"), Some("b")], &cfg(5), &Short).await;
        assert!(out.map.is_empty());
        assert!(matches!(
            out.batches[0].error,
            Some(EmbeddingError::CountMismatch { got: 1, want: 2 })
        ));
    }

    #[test]
    fn empty_vectors_do_not_fix_the_dimension() {
        let mut map = EmbeddingMap::new();
        let mut dim = None;
        let err = accept(&["x".to_string()], vec![Vec::new()], &mut dim, &mut map).unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyVector));
        assert_eq!(dim, None);

        accept(&["y".to_string()], vec![vec![0.5; 768]], &mut dim, &mut map).unwrap();
        assert_eq!(dim, Some(768));
        assert_eq!(map.len(), 1);
        assert_eq!(map["y"].len(), 768);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_runs_between_batches_only() {
        let p = Scripted::default();
        let cfg = EmbedderConfig {
            batch_size: 1,
            batch_pause: Duration::from_millis(500),
            ..EmbedderConfig::default()
        };

        let started = tokio::time::Instant::now();
        let out = embed_texts(["a", "b", "c", "d"].map(Some), &cfg, &p).await;
        let elapsed = started.elapsed();
        assert_eq!(out.pauses, 3);
        assert!(elapsed >= Duration::from_millis(1500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2000), "{elapsed:?}");

        let started = tokio::time::Instant::now();
        let out = embed_texts([Some("a")], &cfg, &p).await;
        assert_eq!(out.pauses, 0);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn dimension_drift_rejects_the_batch() {
        let mut map = EmbeddingMap::new();
        let mut dim = Some(3);
        let err = accept(&["x".to_string()], vec![vec![0.0; 2]], &mut dim, &mut map).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::VectorSizeMismatch { got: 2, want: 3 }
        ));
        assert!(map.is_empty());
    }
}
