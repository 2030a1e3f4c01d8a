mod pg_pool;
mod repositories;
mod vector_store;

pub use pg_pool::{create_pool, run_migrations};

pub use repositories::{
    InMemoryChatRepository, InMemoryThreadMemory, PgChatRepository, PgThreadMemory,
};

pub use vector_store::{InMemoryPolicyStore, QdrantPolicyStore};
