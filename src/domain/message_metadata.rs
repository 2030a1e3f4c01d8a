use serde::{Deserialize, Serialize};

/// Per-message feedback captured alongside assistant replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<String>>,
    #[serde(default)]
    pub error_occurred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl MessageMetadata {
    pub fn success(response_time_ms: i64) -> Self {
        Self {
            response_time_ms: Some(response_time_ms),
            ..Self::default()
        }
    }

    pub fn failure(response_time_ms: i64, error_type: impl Into<String>) -> Self {
        Self {
            response_time_ms: Some(response_time_ms),
            error_occurred: true,
            error_type: Some(error_type.into()),
            ..Self::default()
        }
    }

    /// Storage form of `tool_calls`: a single comma-joined column, `None` when empty.
    pub fn tool_calls_column(&self) -> Option<String> {
        self.tool_calls
            .as_ref()
            .filter(|calls| !calls.is_empty())
            .map(|calls| calls.join(","))
    }

    pub fn tool_calls_from_column(column: Option<&str>) -> Option<Vec<String>> {
        column
            .filter(|value| !value.is_empty())
            .map(|value| value.split(',').map(str::to_string).collect())
    }
}
