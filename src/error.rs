//! Error types for the Jimeng MCP server.

use thiserror::Error;

/// Library-level error type for tool operations.
#[derive(Error, Debug)]
pub enum JimengError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Task submission failed: {0}")]
    Submission(String),

    #[error("Timed out after {waited_secs}s waiting for task {task_id}")]
    PollTimeout { task_id: String, waited_secs: u64 },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Generation failed for task {task_id}: {message}")]
    BackendFailure { task_id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl JimengError {
    /// Whether the failure came from a wait budget running out, either the
    /// poll deadline or the HTTP request timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            JimengError::PollTimeout { .. } => true,
            JimengError::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Task id associated with the failure, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            JimengError::PollTimeout { task_id, .. }
            | JimengError::BackendFailure { task_id, .. } => Some(task_id),
            _ => None,
        }
    }
}

/// Result type alias for tool operations.
pub type Result<T> = std::result::Result<T, JimengError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_timeout_is_timeout() {
        let err = JimengError::PollTimeout {
            task_id: "t-1".to_string(),
            waited_secs: 300,
        };
        assert!(err.is_timeout());
        assert_eq!(err.task_id(), Some("t-1"));
        assert!(err.to_string().contains("300s"));
    }

    #[test]
    fn test_other_errors_are_not_timeouts() {
        let err = JimengError::Api {
            code: 50400,
            message: "Access Denied".to_string(),
        };
        assert!(!err.is_timeout());
        assert_eq!(err.task_id(), None);
        assert!(!JimengError::Submission("rejected".to_string()).is_timeout());
    }
}
