use std::sync::{Arc, Mutex};

use policy_chat::application::ports::{PolicyMatch, PolicyStore, PolicyStoreError};
use policy_chat::application::services::{
    IngestionError, MAX_DOCUMENT_BYTES, PolicyFile, PolicyIngestionService,
};
use policy_chat::domain::{Embedding, PolicyChunk};
use policy_chat::infrastructure::persistence::InMemoryPolicyStore;

use crate::support::{TEST_DIMENSIONS, embedder};

/// Wraps the in-memory store and records collection setup and batch sizes.
#[derive(Default)]
struct RecordingPolicyStore {
    inner: InMemoryPolicyStore,
    ensured_dimensions: Mutex<Vec<u64>>,
    batch_sizes: Mutex<Vec<usize>>,
    fail_upsert: bool,
}

#[async_trait::async_trait]
impl PolicyStore for RecordingPolicyStore {
    async fn ensure_collection(&self, dimensions: u64) -> Result<bool, PolicyStoreError> {
        self.ensured_dimensions.lock().unwrap().push(dimensions);
        Ok(true)
    }

    async fn upsert(
        &self,
        chunks: &[PolicyChunk],
        embeddings: &[Embedding],
    ) -> Result<(), PolicyStoreError> {
        if self.fail_upsert {
            return Err(PolicyStoreError::UpsertFailed("disk full".to_string()));
        }
        self.batch_sizes.lock().unwrap().push(chunks.len());
        self.inner.upsert(chunks, embeddings).await
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicyStoreError> {
        self.inner.search(embedding, top_k).await
    }

    async fn count(&self) -> Result<u64, PolicyStoreError> {
        self.inner.count().await
    }
}

fn policy_file(file_name: &str, content: &str) -> PolicyFile {
    PolicyFile {
        file_name: file_name.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn given_policy_files_when_ingesting_then_all_are_stored_and_counted() {
    let store = Arc::new(RecordingPolicyStore::default());
    let service = PolicyIngestionService::new(embedder(), store.clone(), 100);

    let report = service
        .ingest(vec![
            policy_file("ch1-parking_policy-len20.txt", "Park in lot B."),
            policy_file("ch2-housing_policy-len20.txt", "Dorms close at 11."),
        ])
        .await
        .unwrap();

    assert_eq!(report.found, 2);
    assert_eq!(report.ingested, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(report.collection_count, 2);
    assert_eq!(
        *store.ensured_dimensions.lock().unwrap(),
        vec![TEST_DIMENSIONS as u64]
    );
}

#[tokio::test]
async fn given_oversized_file_when_ingesting_then_it_is_skipped_and_reported() {
    let store = Arc::new(RecordingPolicyStore::default());
    let service = PolicyIngestionService::new(embedder(), store.clone(), 100);
    let oversized = "a".repeat(MAX_DOCUMENT_BYTES + 1);

    let report = service
        .ingest(vec![
            policy_file("ch1-big-len16001.txt", &oversized),
            policy_file("ch2-small-len5.txt", "small"),
        ])
        .await
        .unwrap();

    assert_eq!(report.found, 2);
    assert_eq!(report.ingested, 1);
    assert_eq!(report.skipped, vec!["ch1-big-len16001.txt".to_string()]);
    assert_eq!(report.collection_count, 1);
}

#[tokio::test]
async fn given_file_exactly_at_limit_when_ingesting_then_it_is_kept() {
    let store = Arc::new(RecordingPolicyStore::default());
    let service = PolicyIngestionService::new(embedder(), store, 100);

    let report = service
        .ingest(vec![policy_file(
            "ch1-edge-len16000.txt",
            &"a".repeat(MAX_DOCUMENT_BYTES),
        )])
        .await
        .unwrap();

    assert_eq!(report.ingested, 1);
    assert!(report.skipped.is_empty());
}

#[tokio::test]
async fn given_more_files_than_batch_size_when_ingesting_then_upserts_are_batched() {
    let store = Arc::new(RecordingPolicyStore::default());
    let service = PolicyIngestionService::new(embedder(), store.clone(), 2);
    let files = (0..5)
        .map(|i| policy_file(&format!("ch{}-p-len1.txt", i), &format!("text {}", i)))
        .collect();

    let report = service.ingest(files).await.unwrap();

    assert_eq!(report.ingested, 5);
    assert_eq!(*store.batch_sizes.lock().unwrap(), vec![2, 2, 1]);
    assert_eq!(store.ensured_dimensions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn given_lowered_size_limit_when_ingesting_then_limit_is_applied() {
    let store = Arc::new(RecordingPolicyStore::default());
    let service =
        PolicyIngestionService::new(embedder(), store, 100).with_max_document_bytes(4);

    let report = service
        .ingest(vec![policy_file("ch1-p-len5.txt", "12345")])
        .await
        .unwrap();

    assert_eq!(report.ingested, 0);
    assert_eq!(report.skipped.len(), 1);
}

#[tokio::test]
async fn given_store_failure_when_ingesting_then_storage_error_is_returned() {
    let store = Arc::new(RecordingPolicyStore {
        fail_upsert: true,
        ..RecordingPolicyStore::default()
    });
    let service = PolicyIngestionService::new(embedder(), store, 100);

    let result = service
        .ingest(vec![policy_file("ch1-p-len5.txt", "hello")])
        .await;

    assert!(matches!(result, Err(IngestionError::Storage(_))));
}

#[tokio::test]
async fn given_no_files_when_ingesting_then_report_is_empty() {
    let store = Arc::new(RecordingPolicyStore::default());
    let service = PolicyIngestionService::new(embedder(), store.clone(), 100);

    let report = service.ingest(Vec::new()).await.unwrap();

    assert_eq!(report.found, 0);
    assert_eq!(report.collection_count, 0);
    assert!(store.ensured_dimensions.lock().unwrap().is_empty());
}
