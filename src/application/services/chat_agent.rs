use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::policy_search::{PolicySearch, SEARCH_POLICIES_TOOL};
use crate::application::ports::{
    ChatTurn, Completion, LlmClient, LlmClientError, PolicyStore, RepositoryError, ThreadMemory,
    ToolCall,
};
use crate::domain::ThreadId;
use crate::infrastructure::observability::sanitize_prompt;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an institutional policy specialist.
Always rely on the context supplied from the knowledge base to answer user questions.
When the context is relevant, quote or paraphrase it precisely and mention the policy title or section.
If the context is insufficient or missing, say so and suggest what additional information is needed. Do not guess.
Keep answers concise, professional, and focused on the user's question about university policies.";

#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub content: String,
    pub context_used: bool,
    pub tool_calls: Vec<String>,
}

/// Retrieval-augmented policy assistant with per-thread memory.
pub struct ChatAgent<L, S>
where
    L: LlmClient,
    S: PolicyStore,
{
    llm_client: Arc<L>,
    policy_search: Arc<PolicySearch<S>>,
    thread_memory: Arc<dyn ThreadMemory>,
    system_prompt: String,
    max_tool_iterations: usize,
}

impl<L, S> ChatAgent<L, S>
where
    L: LlmClient,
    S: PolicyStore,
{
    pub fn new(
        llm_client: Arc<L>,
        policy_search: Arc<PolicySearch<S>>,
        thread_memory: Arc<dyn ThreadMemory>,
        system_prompt: String,
        max_tool_iterations: usize,
    ) -> Self {
        Self {
            llm_client,
            policy_search,
            thread_memory,
            system_prompt,
            max_tool_iterations,
        }
    }

    #[instrument(skip(self, user_input, thread_id), fields(thread_id = %thread_id))]
    pub async fn chat(
        &self,
        user_input: &str,
        thread_id: &ThreadId,
    ) -> Result<AgentReply, AgentError> {
        tracing::debug!(prompt = %sanitize_prompt(user_input), "Processing chat turn");

        let context = self.policy_search.relevant_context(user_input).await;
        let context_used = !context.is_empty();
        let enriched_input = if context_used {
            format!("Context:\n{}\n\nUser Question:\n{}", context, user_input)
        } else {
            user_input.to_string()
        };

        let history = self.thread_memory.load(thread_id).await?;

        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(ChatTurn::system(self.system_prompt.clone()));
        turns.extend(history);
        let first_new_turn = turns.len();
        turns.push(ChatTurn::user(enriched_input));

        let tools = [PolicySearch::<S>::tool_spec()];
        let mut tool_names = Vec::new();
        let mut tool_rounds = 0;

        let content = loop {
            match self.llm_client.complete(&turns, &tools).await? {
                Completion::Text(text) => break text,
                Completion::ToolCalls(calls) => {
                    if tool_rounds >= self.max_tool_iterations {
                        warn!(
                            iterations = self.max_tool_iterations,
                            "Tool call limit reached"
                        );
                        return Err(AgentError::ToolLimitExceeded(self.max_tool_iterations));
                    }

                    tool_rounds += 1;
                    turns.push(ChatTurn::assistant_tool_calls(calls.clone()));
                    for call in calls {
                        let output = self.run_tool(&call).await;
                        tool_names.push(call.name.clone());
                        turns.push(ChatTurn::tool_result(call.id, output));
                    }
                }
            }
        };

        turns.push(ChatTurn::assistant(content.clone()));
        self.thread_memory
            .append(thread_id, &turns[first_new_turn..])
            .await?;

        info!(
            context_used,
            tool_calls = tool_names.len(),
            "Chat turn completed"
        );

        Ok(AgentReply {
            content,
            context_used,
            tool_calls: tool_names,
        })
    }

    #[instrument(skip(self, thread_id), fields(thread_id = %thread_id))]
    pub async fn delete_thread(&self, thread_id: &ThreadId) -> Result<(), AgentError> {
        self.thread_memory.delete(thread_id).await?;
        info!("Thread memory deleted");
        Ok(())
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        match call.name.as_str() {
            SEARCH_POLICIES_TOOL => self.policy_search.call_tool(&call.arguments).await,
            other => {
                warn!(tool = other, "Model requested unknown tool");
                format!("Unknown tool: {}", other)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("completion: {0}")]
    Completion(#[from] LlmClientError),
    #[error("memory: {0}")]
    Memory(#[from] RepositoryError),
    #[error("tool call limit of {0} exceeded")]
    ToolLimitExceeded(usize),
}
