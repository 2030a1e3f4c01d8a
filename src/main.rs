use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use policy_chat::application::ports::{
    ChatRepository, Embedder, LlmClient, PolicyStore, ThreadMemory,
};
use policy_chat::application::services::{
    ChatAgent, ChatSession, DEFAULT_SYSTEM_PROMPT, PolicyIngestionService, PolicySearch,
};
use policy_chat::domain::{ThreadId, group_chats_by_date};
use policy_chat::infrastructure::http::HttpChatBackend;
use policy_chat::infrastructure::llm::{
    HashingEmbedder, OfflineLlmClient, OpenAiClient, OpenAiEmbedder,
};
use policy_chat::infrastructure::observability::{TracingConfig, init_tracing};
use policy_chat::infrastructure::persistence::{
    InMemoryChatRepository, InMemoryThreadMemory, PgChatRepository, PgThreadMemory,
    QdrantPolicyStore, create_pool, run_migrations,
};
use policy_chat::infrastructure::text_processing::load_policy_files;
use policy_chat::presentation::config::EmbeddingProvider;
use policy_chat::presentation::{AppState, Environment, Settings, create_router};

#[derive(Parser)]
#[command(name = "policy-chat", about = "Institutional policy chat service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP chat API (default).
    Serve,
    /// Load pre-chunked policy `.txt` files into the vector store.
    Ingest {
        /// Directory of chunk files; defaults to `ingestion.chunks_dir`.
        #[arg(env = "POLICY_CHUNKS_DIR")]
        dir: Option<PathBuf>,
    },
    /// Talk to the agent in-process.
    Repl {
        #[arg(long, default_value = "session_1")]
        thread_id: String,
    },
    /// Chat with a running server through the client session.
    Client {
        /// Defaults to `client.api_url`.
        #[arg(long, env = "CHAT_API_URL")]
        api_url: Option<String>,
    },
    /// Print vector store collection details.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("failed to load settings")?;

    let tracing_config = TracingConfig {
        environment: environment.to_string(),
        json_format: settings.logging.json,
        ..TracingConfig::default()
    };
    init_tracing(&tracing_config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if settings.llm.api_key.is_empty() {
                tracing::warn!("OPENAI_API_KEY is not set; replies come from the offline client");
                serve(settings, Arc::new(OfflineLlmClient)).await
            } else {
                let llm = Arc::new(OpenAiClient::new(&settings.llm));
                serve(settings, llm).await
            }
        }
        Command::Ingest { dir } => ingest(&settings, dir).await,
        Command::Repl { thread_id } => {
            let thread_id = ThreadId::parse(thread_id).map_err(anyhow::Error::msg)?;
            if settings.llm.api_key.is_empty() {
                repl(settings, Arc::new(OfflineLlmClient), thread_id).await
            } else {
                let llm = Arc::new(OpenAiClient::new(&settings.llm));
                repl(settings, llm, thread_id).await
            }
        }
        Command::Client { api_url } => {
            let api_url = api_url.unwrap_or_else(|| settings.client.api_url.clone());
            client(&api_url).await
        }
        Command::Status => status(&settings).await,
    }
}

async fn serve<L>(settings: Settings, llm_client: Arc<L>) -> anyhow::Result<()>
where
    L: LlmClient + 'static,
{
    let (chat_repository, thread_memory) = build_repositories(&settings).await?;
    let chat_agent = build_agent(&settings, llm_client, thread_memory)?;

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState {
        chat_agent,
        chat_repository,
        settings,
    };
    let router = create_router(state);

    tracing::info!(%addr, "Listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ingest(settings: &Settings, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or_else(|| PathBuf::from(&settings.ingestion.chunks_dir));
    let files = load_policy_files(&dir).await?;

    let service = PolicyIngestionService::new(
        build_embedder(settings),
        build_policy_store(settings)?,
        settings.ingestion.batch_size,
    )
    .with_max_document_bytes(settings.ingestion.max_document_bytes);
    let report = service.ingest(files).await?;

    println!(
        "Ingestion complete! Found {}, ingested {}, skipped {}. Total documents: {}",
        report.found,
        report.ingested,
        report.skipped.len(),
        report.collection_count
    );
    Ok(())
}

async fn repl<L>(settings: Settings, llm_client: Arc<L>, thread_id: ThreadId) -> anyhow::Result<()>
where
    L: LlmClient + 'static,
{
    let (_, thread_memory) = build_repositories(&settings).await?;
    let agent = build_agent(&settings, llm_client, thread_memory)?;

    println!("Policy chat - type 'quit' to exit\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("You: ").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        match agent.chat(input, &thread_id).await {
            Ok(reply) => println!("AI: {}\n", reply.content),
            Err(e) => eprintln!("Error: {}\n", e),
        }
    }
    Ok(())
}

const CLIENT_HELP: &str = "Commands: /new, /list, /select <n>, /rename <title>, /delete, \
/search <query>, /help, quit. Anything else is sent as a message.";

async fn client(api_url: &str) -> anyhow::Result<()> {
    let mut session = ChatSession::new(Arc::new(HttpChatBackend::new(api_url)));
    match session.load_chats().await {
        Ok(count) => tracing::info!(count, "Loaded stored chats"),
        Err(e) => tracing::warn!(error = %e, "Could not load stored chats"),
    }

    println!("Connected to {}. {}\n", api_url, CLIENT_HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("> ").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input.split_once(' ').unwrap_or((input, "")) {
            ("quit", "") => break,
            ("", _) => continue,
            ("/help", _) => println!("{}", CLIENT_HELP),
            ("/new", _) => {
                session.create_new_chat().await;
            }
            ("/list", _) => print_chats(&session, ""),
            ("/search", query) => print_chats(&session, query),
            ("/select", index) => {
                let chosen = index
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| session.chats().get(i.saturating_sub(1)))
                    .map(|chat| chat.id);
                match chosen {
                    Some(id) => session.select_chat(id),
                    None => println!("No chat at position {}", index.trim()),
                }
            }
            ("/rename", title) => match session.active_chat().map(|c| c.id) {
                Some(id) => session.update_chat_title(id, title.trim()).await,
                None => println!("No active chat"),
            },
            ("/delete", _) => match session.active_chat().map(|c| c.id) {
                Some(id) => session.delete_chat(id).await,
                None => println!("No active chat"),
            },
            _ => {
                if let Err(e) = session.send_message(input).await {
                    println!("{}", e);
                    continue;
                }
                if let Some(reply) = session.active_chat().and_then(|c| c.messages.last()) {
                    println!("{}\n", reply.content);
                }
            }
        }
    }
    Ok(())
}

fn print_chats(session: &ChatSession, query: &str) {
    let matches: Vec<_> = session.search(query).into_iter().cloned().collect();
    let active = session.active_chat().map(|c| c.id);

    for group in group_chats_by_date(&matches, chrono::Utc::now()) {
        println!("{}", group.bucket.label());
        for chat in group.chats {
            let position = session
                .chats()
                .iter()
                .position(|c| c.id == chat.id)
                .map(|i| i + 1)
                .unwrap_or_default();
            let marker = if Some(chat.id) == active { "*" } else { " " };
            println!("  {}{:>3}. {}", marker, position, chat.title);
        }
    }
}

async fn status(settings: &Settings) -> anyhow::Result<()> {
    let store = build_policy_store(settings)?;
    println!("Qdrant: {}", settings.qdrant.url);
    println!("Collection: {}", store.collection_name());
    println!("Collection count: {}", store.count().await?);
    Ok(())
}

async fn prompt(text: &str) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await
}

async fn build_repositories(
    settings: &Settings,
) -> anyhow::Result<(Arc<dyn ChatRepository>, Arc<dyn ThreadMemory>)> {
    let Some(url) = settings.database.url.as_deref() else {
        tracing::warn!("No database configured; chat history is kept in memory");
        return Ok((
            Arc::new(InMemoryChatRepository::new()),
            Arc::new(InMemoryThreadMemory::new()),
        ));
    };

    let pool = create_pool(url, settings.database.max_connections).await?;
    if settings.database.run_migrations {
        run_migrations(&pool).await?;
    }

    Ok((
        Arc::new(PgChatRepository::new(pool.clone())),
        Arc::new(PgThreadMemory::new(pool)),
    ))
}

fn build_embedder(settings: &Settings) -> Arc<dyn Embedder> {
    match settings.embeddings.provider {
        EmbeddingProvider::OpenAi if !settings.llm.api_key.is_empty() => {
            Arc::new(OpenAiEmbedder::new(
                &settings.llm.base_url,
                settings.llm.api_key.clone(),
                settings.embeddings.model.clone(),
            ))
        }
        EmbeddingProvider::OpenAi => {
            tracing::warn!("OpenAI embeddings requested without an API key; using hashing embedder");
            Arc::new(HashingEmbedder::new(settings.embeddings.dimension))
        }
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(settings.embeddings.dimension)),
    }
}

fn build_policy_store(settings: &Settings) -> anyhow::Result<Arc<QdrantPolicyStore>> {
    Ok(Arc::new(QdrantPolicyStore::new(
        &settings.qdrant.url,
        settings.qdrant.api_key.clone(),
        settings.qdrant.collection_name.clone(),
    )?))
}

fn build_agent<L>(
    settings: &Settings,
    llm_client: Arc<L>,
    thread_memory: Arc<dyn ThreadMemory>,
) -> anyhow::Result<Arc<ChatAgent<L, QdrantPolicyStore>>>
where
    L: LlmClient + 'static,
{
    let policy_search = Arc::new(PolicySearch::new(
        build_embedder(settings),
        build_policy_store(settings)?,
    ));
    let system_prompt = settings
        .agent
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    Ok(Arc::new(ChatAgent::new(
        llm_client,
        policy_search,
        thread_memory,
        system_prompt,
        settings.agent.max_tool_iterations,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
