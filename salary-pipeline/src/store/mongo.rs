//! Thin adapter around the `mongodb` driver to isolate API usage.

use futures::FutureExt;
use futures::future::BoxFuture;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection};
use tracing::{debug, info};

use crate::errors::SinkError;
use crate::store::{CollectionHandle, DocumentStore};

/// MongoDB-backed [`DocumentStore`].
#[derive(Clone, Copy, Debug, Default)]
pub struct MongoStore;

/// Client plus target collection for one sink run.
///
/// Writes run without a session transaction. A failed `insert_many` keeps
/// the documents MongoDB accepted before the failing one.
pub struct MongoCollection {
    client: Client,
    coll: Collection<Document>,
}

impl MongoStore {
    async fn open(
        uri: &str,
        database: &str,
        collection: &str,
    ) -> Result<MongoCollection, SinkError> {
        info!("Connecting to MongoDB");
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| SinkError::Connect(e.to_string()))?;

        // The driver connects lazily; ping to fail fast on a bad URI or server.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| SinkError::Connect(e.to_string()))?;
        info!("Successfully connected to MongoDB");

        let coll = client.database(database).collection::<Document>(collection);
        debug!("target collection {database}.{collection}");
        Ok(MongoCollection { client, coll })
    }
}

impl DocumentStore for MongoStore {
    fn connect<'a>(
        &'a self,
        uri: &'a str,
        database: &'a str,
        collection: &'a str,
    ) -> BoxFuture<'a, Result<Box<dyn CollectionHandle>, SinkError>> {
        async move {
            let handle = Self::open(uri, database, collection).await?;
            Ok(Box::new(handle) as Box<dyn CollectionHandle>)
        }
        .boxed()
    }
}

impl CollectionHandle for MongoCollection {
    fn delete_all(&self) -> BoxFuture<'_, Result<u64, SinkError>> {
        async move {
            let res = self
                .coll
                .delete_many(doc! {})
                .await
                .map_err(|e| SinkError::Write(e.to_string()))?;
            Ok(res.deleted_count)
        }
        .boxed()
    }

    fn insert_many(&self, docs: Vec<Document>) -> BoxFuture<'_, Result<usize, SinkError>> {
        async move {
            let res = self
                .coll
                .insert_many(docs)
                .await
                .map_err(|e| SinkError::Write(e.to_string()))?;
            Ok(res.inserted_ids.len())
        }
        .boxed()
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
        let MongoCollection { client, .. } = *self;
        async move {
            client.shutdown().await;
            info!("MongoDB connection closed");
        }
        .boxed()
    }
}
