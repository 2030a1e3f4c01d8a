use crate::application::ports::{
    ChatTurn, Completion, LlmClient, LlmClientError, ToolSpec, TurnRole,
};

/// Answers without a model: echoes the last user turn. Used when no API key is configured.
pub struct OfflineLlmClient;

#[async_trait::async_trait]
impl LlmClient for OfflineLlmClient {
    async fn complete(
        &self,
        turns: &[ChatTurn],
        _tools: &[ToolSpec],
    ) -> Result<Completion, LlmClientError> {
        let question = turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        Ok(Completion::Text(format!(
            "No language model is configured. You asked:\n\n{}",
            question
        )))
    }
}
