//! Generation requests, video jobs, and task status classification.

use crate::error::{JimengError, Result};
use crate::jimeng::VisualApi;
use tracing::{info, warn};

/// A text-to-video request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub model_key: String,
    pub region: String,
}

/// A text-to-image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub model_key: String,
    pub region: String,
}

/// Handle to a submitted video task. The backend owns all other job state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub task_id: String,
    pub model_key: String,
    pub region: String,
}

impl Job {
    pub fn new(task_id: impl Into<String>, model_key: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            model_key: model_key.into(),
            region: region.into(),
        }
    }
}

/// Non-empty list of result URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrls(Vec<String>);

impl VideoUrls {
    /// Returns `None` when no non-blank URL is present.
    pub fn new(urls: Vec<String>) -> Option<Self> {
        let urls: Vec<String> = urls.into_iter().filter(|u| !u.trim().is_empty()).collect();
        if urls.is_empty() {
            None
        } else {
            Some(Self(urls))
        }
    }

    pub fn first(&self) -> &str {
        &self.0[0]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Classified lifecycle state of a backend task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    InProgress,
    Succeeded(VideoUrls),
    Failed { error: Option<String> },
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded(_) | TaskState::Failed { .. })
    }
}

/// Raw result of one status query, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskResult {
    pub status: String,
    pub video_urls: Vec<String>,
    pub error: Option<String>,
}

impl TaskResult {
    /// Classify the raw status.
    ///
    /// A success code without any URL is reported as a failure. Unknown codes
    /// are treated as still pending.
    pub fn state(&self) -> TaskState {
        match self.status.as_str() {
            "SUCCEEDED" | "done" => match VideoUrls::new(self.video_urls.clone()) {
                Some(urls) => TaskState::Succeeded(urls),
                None => TaskState::Failed {
                    error: Some(
                        self.error
                            .clone()
                            .unwrap_or_else(|| "Task finished without returning any video URL".to_string()),
                    ),
                },
            },
            "FAILED" | "failed" | "not_found" | "expired" => TaskState::Failed {
                error: self.error.clone(),
            },
            "IN_PROGRESS" | "RUNNING" | "generating" => TaskState::InProgress,
            _ => TaskState::Pending,
        }
    }
}

/// Submit a video task with a single backend call. Never retries or polls.
pub async fn submit_job(api: &dyn VisualApi, request: &VideoRequest) -> Result<Job> {
    let task_id = api.submit_task(request).await?;

    match task_id.filter(|id| !id.trim().is_empty()) {
        Some(task_id) => {
            info!(task_id = %task_id, model = %request.model_key, "Submitted video task");
            Ok(Job::new(task_id, &request.model_key, &request.region))
        }
        None => {
            warn!("Backend accepted the submission but returned no task id");
            Err(JimengError::Submission(
                "Backend response did not contain a task id".to_string(),
            ))
        }
    }
}
