//! Document store boundary used by the sink.
//!
//! - [`DocumentStore`] opens a connection and hands out a collection handle
//! - [`CollectionHandle`] clears, inserts and finally closes the connection
//!
//! [`mongo::MongoStore`] talks to a real server; [`memory::InMemoryStore`]
//! keeps documents in process for tests and dry runs.

use futures::future::BoxFuture;
use mongodb::bson::Document;

use crate::errors::SinkError;

/// Opens connections to a document database.
pub trait DocumentStore: Send + Sync {
    /// Connects to `uri` and verifies the server answers.
    ///
    /// Must return [`SinkError::Connect`] on failure.
    fn connect<'a>(
        &'a self,
        uri: &'a str,
        database: &'a str,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn CollectionHandle>, SinkError>>;
}

/// An open connection bound to one collection.
pub trait CollectionHandle: Send + Sync {
    /// Deletes every document; returns the number deleted.
    fn delete_all(&self) -> BoxFuture<'_, Result<u64, SinkError>>;

    /// Inserts one batch; returns the number inserted.
    ///
    /// Not atomic across the batch: an ordered insert that fails partway may
    /// leave the documents before the failure in the collection. The count
    /// only covers batches that returned `Ok`.
    fn insert_many(&self, docs: Vec<Document>) -> BoxFuture<'_, Result<usize, SinkError>>;

    /// Releases the connection.
    fn close(self: Box<Self>) -> BoxFuture<'static, ()>;
}

pub mod memory;
pub mod mongo;
