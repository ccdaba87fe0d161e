//! In-process [`DocumentStore`] with injectable failures.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use mongodb::bson::Document;
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::SinkError;
use crate::store::{CollectionHandle, DocumentStore};

type Key = (String, String);

#[derive(Default)]
struct Shared {
    collections: BTreeMap<Key, Vec<Document>>,
    connects: usize,
    closes: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct Faults {
    connect: bool,
    clear: bool,
    /// Zero-based insert call (per connection) that fails.
    insert_on_batch: Option<usize>,
    /// Documents the failing insert still writes before it errors.
    insert_kept: usize,
}

/// Documents kept in memory, keyed by `(database, collection)`.
///
/// Clones share the same contents. A failing `insert_many` writes nothing
/// unless [`InMemoryStore::keep_partial_insert`] is set.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    shared: Arc<Mutex<Shared>>,
    faults: Faults,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `connect` fails.
    pub fn fail_connect(mut self) -> Self {
        self.faults.connect = true;
        self
    }

    /// Every `delete_all` fails.
    pub fn fail_clear(mut self) -> Self {
        self.faults.clear = true;
        self
    }

    /// The `n`-th (zero-based) `insert_many` of a connection fails.
    pub fn fail_insert_on_batch(mut self, n: usize) -> Self {
        self.faults.insert_on_batch = Some(n);
        self
    }

    /// The failing insert keeps its first `n` documents, like an ordered
    /// MongoDB insert that stops at a rejected document.
    pub fn keep_partial_insert(mut self, n: usize) -> Self {
        self.faults.insert_kept = n;
        self
    }

    /// Replaces the contents of a collection.
    pub async fn seed(&self, database: &str, collection: &str, docs: Vec<Document>) {
        let mut g = self.shared.lock().await;
        g.collections
            .insert((database.to_string(), collection.to_string()), docs);
    }

    /// Snapshot of a collection, insertion order.
    pub async fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        let g = self.shared.lock().await;
        g.collections
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn connects(&self) -> usize {
        self.shared.lock().await.connects
    }

    pub async fn closes(&self) -> usize {
        self.shared.lock().await.closes
    }
}

impl DocumentStore for InMemoryStore {
    fn connect<'a>(
        &'a self,
        uri: &'a str,
        database: &'a str,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn CollectionHandle>, SinkError>> {
        async move {
            if self.faults.connect {
                return Err(SinkError::Connect(format!("server at {uri} unreachable")));
            }
            self.shared.lock().await.connects += 1;
            debug!("in-memory store connected: {database}.{collection}");
            Ok(Box::new(MemoryCollection {
                shared: Arc::clone(&self.shared),
                key: (database.to_string(), collection.to_string()),
                faults: self.faults,
                inserts: AtomicUsize::new(0),
            }) as Box<dyn CollectionHandle>)
        }
        .boxed()
    }
}

/// Handle returned by [`InMemoryStore`].
pub struct MemoryCollection {
    shared: Arc<Mutex<Shared>>,
    key: Key,
    faults: Faults,
    inserts: AtomicUsize,
}

impl CollectionHandle for MemoryCollection {
    fn delete_all(&self) -> BoxFuture<'_, Result<u64, SinkError>> {
        async move {
            if self.faults.clear {
                return Err(SinkError::Write("delete_many rejected".into()));
            }
            let mut g = self.shared.lock().await;
            let removed = g.collections.remove(&self.key).map_or(0, |v| v.len());
            Ok(removed as u64)
        }
        .boxed()
    }

    fn insert_many(&self, docs: Vec<Document>) -> BoxFuture<'_, Result<usize, SinkError>> {
        async move {
            let n = self.inserts.fetch_add(1, Ordering::SeqCst);
            let failing = self.faults.insert_on_batch == Some(n);
            let keep = if failing {
                self.faults.insert_kept.min(docs.len())
            } else {
                docs.len()
            };
            let mut g = self.shared.lock().await;
            let coll = g.collections.entry(self.key.clone()).or_default();
            coll.extend(docs.into_iter().take(keep).map(|mut d| {
                if !d.contains_key("_id") {
                    d.insert("_id", ObjectId::new());
                }
                d
            }));
            if failing {
                return Err(SinkError::Write(format!("insert_many #{n} rejected")));
            }
            Ok(keep)
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
        async move {
            self.shared.lock().await.closes += 1;
        }
        .boxed()
    }
}
