use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, VectorsConfig,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::ports::{PolicyMatch, PolicyStore, PolicyStoreError};
use crate::domain::{Embedding, PolicyChunk};

pub struct QdrantPolicyStore {
    client: Arc<Qdrant>,
    collection_name: String,
}

impl QdrantPolicyStore {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection_name: String,
    ) -> Result<Self, PolicyStoreError> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .map_err(|e| PolicyStoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            collection_name,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Qdrant only accepts UUID or integer ids, so string chunk ids are hashed.
    pub fn point_id(chunk_id: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes())
    }

    async fn collection_exists(&self) -> Result<bool, PolicyStoreError> {
        self.client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| PolicyStoreError::ConnectionFailed(e.to_string()))
    }

    fn payload(chunk: &PolicyChunk) -> HashMap<String, serde_json::Value> {
        HashMap::from([
            ("chunk_id".to_string(), chunk.id.clone().into()),
            ("text".to_string(), chunk.text.clone().into()),
            ("source".to_string(), chunk.source.clone().into()),
            ("policy_name".to_string(), chunk.policy_name.clone().into()),
            ("chunk".to_string(), chunk.chunk.clone().into()),
        ])
    }
}

#[async_trait]
impl PolicyStore for QdrantPolicyStore {
    #[instrument(skip(self), fields(collection = %self.collection_name))]
    async fn ensure_collection(&self, dimensions: u64) -> Result<bool, PolicyStoreError> {
        if self.collection_exists().await? {
            return Ok(false);
        }

        let vectors_config =
            VectorsConfig::from(VectorParamsBuilder::new(dimensions, Distance::Cosine));

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name).vectors_config(vectors_config),
            )
            .await
            .map_err(|e| PolicyStoreError::CollectionCreationFailed(e.to_string()))?;

        info!(collection = %self.collection_name, dimensions, "collection_created");
        Ok(true)
    }

    #[instrument(skip(self, chunks, embeddings), fields(collection = %self.collection_name, count = chunks.len()))]
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

        let points: Vec<PointStruct> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                PointStruct::new(
                    PointId::from(Self::point_id(&chunk.id).to_string()),
                    embedding.values.clone(),
                    Self::payload(chunk),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await
            .map_err(|e| PolicyStoreError::UpsertFailed(e.to_string()))?;

        info!(collection = %self.collection_name, count = chunks.len(), "points_upserted");
        Ok(())
    }

    #[instrument(skip(self, embedding), fields(collection = %self.collection_name))]
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicyStoreError> {
        if !self.collection_exists().await? {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.collection_name,
                    embedding.values.clone(),
                    top_k as u64,
                )
                .with_payload(true),
            )
            .await
            .map_err(|e| PolicyStoreError::SearchFailed(e.to_string()))?;

        let matches = response
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;
                let field = |name: &str| -> Option<String> {
                    payload.get(name)?.as_str().map(|s| s.to_string())
                };

                let chunk = PolicyChunk {
                    id: field("chunk_id")?,
                    text: field("text")?,
                    source: field("source").unwrap_or_else(|| "Unknown Source".to_string()),
                    policy_name: field("policy_name")
                        .unwrap_or_else(|| "Unknown Policy".to_string()),
                    chunk: field("chunk").unwrap_or_default(),
                };

                Some(PolicyMatch {
                    chunk,
                    score: point.score,
                })
            })
            .collect();

        Ok(matches)
    }

    #[instrument(skip(self), fields(collection = %self.collection_name))]
    async fn count(&self) -> Result<u64, PolicyStoreError> {
        if !self.collection_exists().await? {
            return Ok(0);
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection_name).exact(true))
            .await
            .map_err(|e| PolicyStoreError::SearchFailed(e.to_string()))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}
