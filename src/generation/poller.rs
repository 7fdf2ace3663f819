//! Synchronous completion: poll a submitted task until it finishes or the wait budget runs out.

use super::job::{Job, TaskState, VideoUrls};
use crate::config::VideoSettings;
use crate::error::{JimengError, Result};
use crate::jimeng::VisualApi;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Polling cadence and deadline for sync mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl From<&VideoSettings> for PollConfig {
    fn from(settings: &VideoSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_wait: settings.max_wait(),
        }
    }
}

/// Poll `job` until it succeeds, fails, or `config.max_wait` elapses.
///
/// Sleeps between queries rather than spinning. Dropping the returned future
/// stops polling immediately; the backend task itself keeps running.
/// Never yields a pending state: the result is either the video URLs or an error.
#[instrument(skip(api, config), fields(task_id = %job.task_id))]
pub async fn wait_for_completion(
    api: &dyn VisualApi,
    job: &Job,
    config: &PollConfig,
) -> Result<VideoUrls> {
    let poll = async {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = api.get_task_result(job).await?;

            match result.state() {
                TaskState::Succeeded(urls) => {
                    info!(attempt, urls = urls.as_slice().len(), "Video task succeeded");
                    return Ok(urls);
                }
                TaskState::Failed { error } => {
                    warn!(attempt, status = %result.status, "Video task failed");
                    return Err(JimengError::BackendFailure {
                        task_id: job.task_id.clone(),
                        message: error.unwrap_or_else(|| "Video generation task failed".to_string()),
                    });
                }
                TaskState::Pending | TaskState::InProgress => {
                    debug!(attempt, status = %result.status, "Video task not finished yet");
                    tokio::time::sleep(config.interval).await;
                }
            }
        }
    };

    match tokio::time::timeout(config.max_wait, poll).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!("Gave up waiting after {:?}", config.max_wait);
            Err(JimengError::PollTimeout {
                task_id: job.task_id.clone(),
                waited_secs: config.max_wait.as_secs(),
            })
        }
    }
}
