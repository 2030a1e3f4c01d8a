use std::sync::Arc;

use policy_chat::application::ports::PolicyStore;
use policy_chat::application::services::{MAX_DOCUMENT_BYTES, PolicyFile, PolicyIngestionService};
use policy_chat::domain::{Embedding, PolicyChunk};
use policy_chat::infrastructure::llm::HashingEmbedder;

use crate::helpers::TestQdrant;

#[tokio::test]
async fn given_fresh_qdrant_when_counting_then_zero_is_returned() {
    let test_qdrant = TestQdrant::new().await;

    let count = test_qdrant.store.count().await.expect("count should succeed");

    assert_eq!(count, 0);
}

#[tokio::test]
async fn given_fresh_qdrant_when_searching_then_no_matches() {
    let test_qdrant = TestQdrant::new().await;

    let matches = test_qdrant
        .store
        .search(&Embedding::new(vec![1.0, 0.0, 0.0, 0.0]), 3)
        .await
        .expect("search should succeed");

    assert!(matches.is_empty());
}

#[tokio::test]
async fn given_only_oversized_files_when_ingesting_into_fresh_qdrant_then_report_lists_them() {
    let test_qdrant = TestQdrant::new().await;
    let service = PolicyIngestionService::new(
        Arc::new(HashingEmbedder::new(16)),
        Arc::new(test_qdrant.store),
        100,
    );

    let report = service
        .ingest(vec![PolicyFile {
            file_name: "ch1-big-len16001.txt".to_string(),
            content: "a".repeat(MAX_DOCUMENT_BYTES + 1),
        }])
        .await
        .expect("ingestion should report, not fail");

    assert_eq!(report.found, 1);
    assert_eq!(report.ingested, 0);
    assert_eq!(report.skipped, vec!["ch1-big-len16001.txt".to_string()]);
    assert_eq!(report.collection_count, 0);
}

#[tokio::test]
async fn given_upserted_chunk_when_searching_then_payload_round_trips() {
    let test_qdrant = TestQdrant::new().await;
    let chunk = PolicyChunk::from_file(
        "ch3-parking_policy-len14.txt",
        "Park in lot B.".to_string(),
        0,
    );
    let embedding = Embedding::new(vec![0.1, 0.2, 0.3, 0.4]);

    let created = test_qdrant.store.ensure_collection(4).await.unwrap();
    test_qdrant
        .store
        .upsert(std::slice::from_ref(&chunk), std::slice::from_ref(&embedding))
        .await
        .unwrap();

    let matches = test_qdrant.store.search(&embedding, 3).await.unwrap();

    assert!(created);
    assert!(!test_qdrant.store.ensure_collection(4).await.unwrap());
    assert_eq!(test_qdrant.store.count().await.unwrap(), 1);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].chunk, chunk);
}
