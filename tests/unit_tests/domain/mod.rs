mod message_metadata_test;
mod policy_chunk_test;
