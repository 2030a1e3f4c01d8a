pub mod http;
pub mod llm;
pub mod observability;
pub mod persistence;
pub mod text_processing;
