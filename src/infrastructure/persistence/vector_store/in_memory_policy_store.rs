use tokio::sync::RwLock;

use crate::application::ports::{PolicyMatch, PolicyStore, PolicyStoreError};
use crate::domain::{Embedding, PolicyChunk};

/// Brute-force cosine search over chunks held in memory.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    entries: RwLock<Vec<(PolicyChunk, Embedding)>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn ensure_collection(&self, _dimensions: u64) -> Result<bool, PolicyStoreError> {
        Ok(false)
    }

    async fn upsert(
        &self,
        chunks: &[PolicyChunk],
        embeddings: &[Embedding],
    ) -> Result<(), PolicyStoreError> {
        if chunks.len() != embeddings.len() {
            return Err(PolicyStoreError::UpsertFailed(
                "chunks and embeddings count mismatch".to_string(),
            ));
        }

        let mut entries = self.entries.write().await;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            match entries.iter_mut().find(|(existing, _)| existing.id == chunk.id) {
                Some(entry) => *entry = (chunk.clone(), embedding.clone()),
                None => entries.push((chunk.clone(), embedding.clone())),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicyStoreError> {
        let entries = self.entries.read().await;
        let mut matches: Vec<PolicyMatch> = entries
            .iter()
            .map(|(chunk, stored)| PolicyMatch {
                chunk: chunk.clone(),
                score: embedding.similarity(stored),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn count(&self) -> Result<u64, PolicyStoreError> {
        Ok(self.entries.read().await.len() as u64)
    }
}
