mod chat_agent;
mod chat_session;
mod policy_ingestion;
mod policy_search;

pub use chat_agent::{AgentError, AgentReply, ChatAgent, DEFAULT_SYSTEM_PROMPT};
pub use chat_session::{ChatSession, ERROR_REPLY, SessionError};
pub use policy_ingestion::{
    DEFAULT_BATCH_SIZE, IngestionError, IngestionReport, MAX_DOCUMENT_BYTES, PolicyFile,
    PolicyIngestionService,
};
pub use policy_search::{
    NO_POLICIES_FOUND, PolicySearch, PolicySearchError, SEARCH_POLICIES_TOOL,
};
