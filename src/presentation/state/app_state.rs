use std::sync::Arc;

use crate::application::ports::{ChatRepository, LlmClient, PolicyStore};
use crate::application::services::ChatAgent;
use crate::presentation::config::Settings;

pub struct AppState<L, S>
where
    L: LlmClient,
    S: PolicyStore,
{
    pub chat_agent: Arc<ChatAgent<L, S>>,
    pub chat_repository: Arc<dyn ChatRepository>,
    pub settings: Settings,
}

impl<L, S> Clone for AppState<L, S>
where
    L: LlmClient,
    S: PolicyStore,
{
    fn clone(&self) -> Self {
        Self {
            chat_agent: Arc::clone(&self.chat_agent),
            chat_repository: Arc::clone(&self.chat_repository),
            settings: self.settings.clone(),
        }
    }
}
