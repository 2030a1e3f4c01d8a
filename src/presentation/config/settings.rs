use serde::Deserialize;

use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub cors: CorsSettings,
    pub database: DatabaseSettings,
    pub qdrant: QdrantSettings,
    pub embeddings: EmbeddingsSettings,
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub ingestion: IngestionSettings,
    pub logging: LoggingSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Chat history and thread memory stay in process memory when unset.
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Hashing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub system_prompt: Option<String>,
    pub max_tool_iterations: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionSettings {
    pub chunks_dir: String,
    pub batch_size: usize,
    /// Files larger than this are skipped.
    pub max_document_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub api_url: String,
}

impl Settings {
    /// Layers built-in defaults, `appsettings.toml`, `appsettings.{env}.toml` and
    /// `APP__SECTION__KEY` variables, then the conventional unprefixed overrides.
    pub fn load(environment: Environment) -> Result<Self, ::config::ConfigError> {
        Self::builder(environment)?.build()?.try_deserialize()
    }

    pub fn builder(
        environment: Environment,
    ) -> Result<::config::ConfigBuilder<::config::builder::DefaultState>, ::config::ConfigError>
    {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        ::config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            .set_default("database.max_connections", 5)?
            .set_default("database.run_migrations", true)?
            .set_default("qdrant.url", "http://localhost:6334")?
            .set_default("qdrant.collection_name", "institutional_policies")?
            .set_default("embeddings.provider", "openai")?
            .set_default("embeddings.model", "text-embedding-3-small")?
            .set_default("embeddings.dimension", 1536)?
            .set_default("llm.api_key", "")?
            .set_default("llm.base_url", "https://api.openai.com/v1")?
            .set_default("llm.chat_model", "gpt-4o-mini")?
            .set_default("llm.max_tokens", 1024)?
            .set_default("llm.temperature", 0.2)?
            .set_default("agent.max_tool_iterations", 4)?
            .set_default("ingestion.chunks_dir", "policies/chunked")?
            .set_default("ingestion.batch_size", 100)?
            .set_default("ingestion.max_document_bytes", 16000)?
            .set_default("logging.json", false)?
            .set_default("client.api_url", "http://localhost:8000")?
            .add_source(::config::File::with_name("appsettings").required(false))
            .add_source(
                ::config::File::with_name(&format!("appsettings.{}", environment.as_file_suffix()))
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .set_override_option("llm.api_key", env("OPENAI_API_KEY"))?
            .set_override_option("database.url", env("DATABASE_URL"))?
            .set_override_option("qdrant.url", env("QDRANT_URL"))?
            .set_override_option("qdrant.api_key", env("QDRANT_API_KEY"))
    }
}
