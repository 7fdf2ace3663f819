//! Jimeng visual API client.
//!
//! The tool layer only talks to the backend through [`VisualApi`], so the
//! job lifecycle can be exercised without network access.

mod client;
pub mod signer;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::JimengClient;

use crate::error::Result;
use crate::generation::{ImageRequest, Job, TaskResult, VideoRequest};
use async_trait::async_trait;

/// Result of a single-shot image generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageResult {
    pub image_urls: Vec<String>,
    /// Prompt as rewritten by the backend's prompt rephraser, if it ran.
    pub rephrased_prompt: Option<String>,
}

/// Remote operations consumed by the tools. Each method is one request with no retry.
#[async_trait]
pub trait VisualApi: Send + Sync {
    /// Submit a video task. `Ok(None)` means the backend accepted the call but sent no id.
    async fn submit_task(&self, request: &VideoRequest) -> Result<Option<String>>;

    /// Query a video task's current status, in the region it was submitted to.
    async fn get_task_result(&self, job: &Job) -> Result<TaskResult>;

    /// Generate an image synchronously.
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult>;
}
