use async_trait::async_trait;

use crate::domain::{Embedding, PolicyChunk};

#[derive(Debug, Clone)]
pub struct PolicyMatch {
    pub chunk: PolicyChunk,
    /// Cosine similarity between the query and the chunk.
    pub score: f32,
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Creates the collection if missing. Returns `true` when it was created.
    async fn ensure_collection(&self, dimensions: u64) -> Result<bool, PolicyStoreError>;

    async fn upsert(
        &self,
        chunks: &[PolicyChunk],
        embeddings: &[Embedding],
    ) -> Result<(), PolicyStoreError>;

    /// Best matches first. A store that was never created has no matches.
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicyStoreError>;

    /// Number of stored chunks, 0 before the collection exists.
    async fn count(&self) -> Result<u64, PolicyStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyStoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("collection creation failed: {0}")]
    CollectionCreationFailed(String),
    #[error("upsert failed: {0}")]
    UpsertFailed(String),
    #[error("search failed: {0}")]
    SearchFailed(String),
}
