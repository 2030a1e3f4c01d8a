mod embedder;
mod offline_llm_client;
mod openai_client;

pub use embedder::{HashingEmbedder, OpenAiEmbedder};
pub use offline_llm_client::OfflineLlmClient;
pub use openai_client::OpenAiClient;
