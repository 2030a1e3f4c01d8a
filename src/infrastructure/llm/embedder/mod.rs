mod hashing_embedder;
mod openai_embedder;

pub use hashing_embedder::HashingEmbedder;
pub use openai_embedder::OpenAiEmbedder;
