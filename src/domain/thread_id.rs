use std::fmt;

use super::ChatId;

pub const DEFAULT_THREAD_ID: &str = "default";

/// Opaque key correlating a client chat with backend conversation memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn parse(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err("thread id must not be empty".to_string());
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self(DEFAULT_THREAD_ID.to_string())
    }
}

impl From<ChatId> for ThreadId {
    fn from(id: ChatId) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
