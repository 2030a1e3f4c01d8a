use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use crate::application::ports::{ChatTurn, RepositoryError, ThreadMemory};
use crate::domain::ThreadId;

/// Thread memory stored as one JSONB row per turn, replayed in insertion order.
pub struct PgThreadMemory {
    pool: PgPool,
}

impl PgThreadMemory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreadMemory for PgThreadMemory {
    #[instrument(skip(self, thread_id), fields(thread_id = %thread_id))]
    async fn load(&self, thread_id: &ThreadId) -> Result<Vec<ChatTurn>, RepositoryError> {
        let rows: Vec<(Json<ChatTurn>,)> =
            sqlx::query_as("SELECT turn FROM thread_turns WHERE thread_id = $1 ORDER BY id ASC")
                .bind(thread_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(rows.into_iter().map(|(Json(turn),)| turn).collect())
    }

    #[instrument(skip(self, turns, thread_id), fields(thread_id = %thread_id, count = turns.len()))]
    async fn append(
        &self,
        thread_id: &ThreadId,
        turns: &[ChatTurn],
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        for turn in turns {
            sqlx::query("INSERT INTO thread_turns (thread_id, turn) VALUES ($1, $2)")
                .bind(thread_id.as_str())
                .bind(Json(turn))
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    #[instrument(skip(self, thread_id), fields(thread_id = %thread_id))]
    async fn delete(&self, thread_id: &ThreadId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM thread_turns WHERE thread_id = $1")
            .bind(thread_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}
