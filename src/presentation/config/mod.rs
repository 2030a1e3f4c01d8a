mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AgentSettings, ClientSettings, CorsSettings, DatabaseSettings, EmbeddingProvider,
    EmbeddingsSettings, IngestionSettings, LlmSettings, LoggingSettings, QdrantSettings,
    ServerSettings, Settings,
};
