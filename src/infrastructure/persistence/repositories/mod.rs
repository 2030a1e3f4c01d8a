mod in_memory_repository;
mod pg_chat_repository;
mod pg_thread_memory;

pub use in_memory_repository::{InMemoryChatRepository, InMemoryThreadMemory};
pub use pg_chat_repository::PgChatRepository;
pub use pg_thread_memory::PgThreadMemory;
