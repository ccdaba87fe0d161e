use futures::future::BoxFuture;

use crate::errors::EmbeddingError;

/// Provider interface for batch embedding generation.
///
/// Implement this trait to plug in another backend (a remote API, a local
/// model, a scripted fake in tests). The embedder calls [`initialize`] once
/// before the first batch and then [`embed_batch`] once per batch.
///
/// [`initialize`]: EmbeddingsProvider::initialize
/// [`embed_batch`]: EmbeddingsProvider::embed_batch
pub trait EmbeddingsProvider: Send + Sync {
    /// Connects to the provider and loads the model.
    ///
    /// Must return [`EmbeddingError::Init`] on failure.
    fn initialize(&self) -> BoxFuture<'_, Result<(), EmbeddingError>>;

    /// One vector per input text, in input order.
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, EmbeddingError>>;
}

pub mod service_embedder;
