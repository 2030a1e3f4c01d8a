use async_trait::async_trait;

use super::{ChatTurn, RepositoryError};
use crate::domain::ThreadId;

/// Conversation memory keyed by thread, replayed to the model on each turn.
#[async_trait]
pub trait ThreadMemory: Send + Sync {
    async fn load(&self, thread_id: &ThreadId) -> Result<Vec<ChatTurn>, RepositoryError>;

    async fn append(&self, thread_id: &ThreadId, turns: &[ChatTurn])
    -> Result<(), RepositoryError>;

    async fn delete(&self, thread_id: &ThreadId) -> Result<(), RepositoryError>;
}
