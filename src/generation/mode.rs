//! Execution mode selection for video generation.

use serde::Serialize;

/// How a video generation call is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Submit and return the task id immediately.
    Async,
    /// Submit and wait for the task to finish.
    Sync,
}

impl ExecutionMode {
    /// Resolve the mode from the caller's `async` flag and the sync intent signal.
    ///
    /// Sync wins if async was explicitly turned off or if sync intent was
    /// detected; otherwise the call stays async.
    pub fn select(explicit_async: bool, intent_sync: bool) -> Self {
        if !explicit_async || intent_sync {
            ExecutionMode::Sync
        } else {
            ExecutionMode::Async
        }
    }

    pub fn is_sync(self) -> bool {
        self == ExecutionMode::Sync
    }
}
