use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::ports::{Embedder, EmbedderError, PolicyStore, PolicyStoreError};
use crate::domain::PolicyChunk;

/// Leaves headroom under the vector store's per-document payload limit.
pub const MAX_DOCUMENT_BYTES: usize = 16_000;
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct PolicyFile {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub found: usize,
    pub ingested: usize,
    pub skipped: Vec<String>,
    pub collection_count: u64,
}

pub struct PolicyIngestionService<S>
where
    S: PolicyStore,
{
    embedder: Arc<dyn Embedder>,
    policy_store: Arc<S>,
    batch_size: usize,
    max_document_bytes: usize,
}

impl<S> PolicyIngestionService<S>
where
    S: PolicyStore,
{
    pub fn new(embedder: Arc<dyn Embedder>, policy_store: Arc<S>, batch_size: usize) -> Self {
        Self {
            embedder,
            policy_store,
            batch_size: batch_size.max(1),
            max_document_bytes: MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn ingest(&self, files: Vec<PolicyFile>) -> Result<IngestionReport, IngestionError> {
        let mut report = IngestionReport {
            found: files.len(),
            ..IngestionReport::default()
        };
        info!(found = report.found, "Found chunk files");

        let mut chunks = Vec::with_capacity(files.len());
        for (index, file) in files.into_iter().enumerate() {
            let size = file.content.len();
            if size > self.max_document_bytes {
                warn!(
                    file = %file.file_name,
                    bytes = size,
                    limit = self.max_document_bytes,
                    "Skipping oversized policy chunk"
                );
                report.skipped.push(file.file_name);
                continue;
            }
            chunks.push(PolicyChunk::from_file(&file.file_name, file.content, index));
        }

        let mut collection_ready = false;
        for (batch_number, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if !collection_ready {
                let dimensions = embeddings.first().map(|e| e.dimensions()).unwrap_or(0) as u64;
                self.policy_store.ensure_collection(dimensions).await?;
                collection_ready = true;
            }

            self.policy_store.upsert(batch, &embeddings).await?;
            report.ingested += batch.len();

            info!(
                batch = batch_number + 1,
                from = batch_number * self.batch_size,
                to = batch_number * self.batch_size + batch.len(),
                "Added batch"
            );
        }

        report.collection_count = self.policy_store.count().await?;
        info!(
            ingested = report.ingested,
            skipped = report.skipped.len(),
            total = report.collection_count,
            "Ingestion complete"
        );

        Ok(report)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("storage: {0}")]
    Storage(#[from] PolicyStoreError),
}
