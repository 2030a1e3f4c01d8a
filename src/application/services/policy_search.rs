use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::application::ports::{
    Embedder, EmbedderError, PolicyMatch, PolicyStore, PolicyStoreError, ToolSpec,
};
use crate::infrastructure::observability::sanitize_prompt;

pub const SEARCH_POLICIES_TOOL: &str = "search_policies";
pub const NO_POLICIES_FOUND: &str = "No relevant policies found for your query.";

const CONTEXT_TOP_K: usize = 3;
const TOOL_TOP_K: usize = 5;
const EXCERPT_CHARS: usize = 500;

/// Semantic lookup over the policy knowledge base.
pub struct PolicySearch<S>
where
    S: PolicyStore,
{
    embedder: Arc<dyn Embedder>,
    policy_store: Arc<S>,
}

#[derive(Deserialize)]
struct SearchPoliciesArgs {
    query: String,
}

impl<S> PolicySearch<S>
where
    S: PolicyStore,
{
    pub fn new(embedder: Arc<dyn Embedder>, policy_store: Arc<S>) -> Self {
        Self {
            embedder,
            policy_store,
        }
    }

    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<PolicyMatch>, PolicySearchError> {
        let embedding = self.embedder.embed(query).await?;
        Ok(self.policy_store.search(&embedding, top_k).await?)
    }

    /// Top chunks joined by blank lines, or an empty string when retrieval fails.
    #[instrument(skip(self, query))]
    pub async fn relevant_context(&self, query: &str) -> String {
        match self.search(query, CONTEXT_TOP_K).await {
            Ok(matches) => matches
                .into_iter()
                .map(|m| m.chunk.text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Err(e) => {
                warn!(error = %e, "Error retrieving context");
                String::new()
            }
        }
    }

    /// Body of the `search_policies` tool. Never fails; errors become the tool output.
    #[instrument(skip(self, query))]
    pub async fn search_policies(&self, query: &str) -> String {
        tracing::debug!(query = %sanitize_prompt(query), "Searching policies");

        match self.search(query, TOOL_TOP_K).await {
            Ok(matches) if matches.is_empty() => NO_POLICIES_FOUND.to_string(),
            Ok(matches) => {
                info!(results = matches.len(), "search_policies tool used");
                matches
                    .iter()
                    .enumerate()
                    .map(|(i, m)| format_match(i + 1, m))
                    .collect::<Vec<_>>()
                    .join("\n---\n")
            }
            Err(e) => format!("Error searching policies: {}", e),
        }
    }

    /// Runs the tool from raw model-supplied JSON arguments.
    pub async fn call_tool(&self, arguments: &str) -> String {
        match serde_json::from_str::<SearchPoliciesArgs>(arguments) {
            Ok(args) => self.search_policies(&args.query).await,
            Err(e) => format!("Error searching policies: invalid arguments: {}", e),
        }
    }

    pub fn tool_spec() -> ToolSpec {
        ToolSpec {
            name: SEARCH_POLICIES_TOOL.to_string(),
            description: "Search across all policies using semantic similarity. Given a topic \
                or question, return the most relevant policy excerpts with their titles and \
                relevance scores. Use this when the specific policy is not known."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The topic or question to search for in the policy database."
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

fn format_match(rank: usize, policy_match: &PolicyMatch) -> String {
    let relevance = (policy_match.score * 1000.0).round() / 1000.0;
    let text = &policy_match.chunk.text;
    let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    let ellipsis = if text.chars().count() > EXCERPT_CHARS {
        "..."
    } else {
        ""
    };

    format!(
        "**Result {}**\nPolicy: {}\nSource: {}\nRelevance: {}\nExcerpt:\n{}{}\n",
        rank, policy_match.chunk.policy_name, policy_match.chunk.source, relevance, excerpt, ellipsis
    )
}

#[derive(Debug, thiserror::Error)]
pub enum PolicySearchError {
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("search: {0}")]
    Store(#[from] PolicyStoreError),
}
