mod in_memory_policy_store;
mod qdrant_policy_store;

pub use in_memory_policy_store::InMemoryPolicyStore;
pub use qdrant_policy_store::QdrantPolicyStore;
