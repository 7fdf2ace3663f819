//! Tool orchestration.
//!
//! Each public method is one tool: it runs the credential guard, validates its
//! input, drives the backend, and shapes the outcome into an [`Envelope`].
//! Errors never escape as `Err`; they are always turned into error envelopes.

use crate::config::{Credentials, Settings, ACCESS_KEY_VAR, SECRET_KEY_VAR};
use crate::envelope::Envelope;
use crate::error::{JimengError, Result};
use crate::generation::{
    compose_image_prompt, submit_job, translate_task_status, wait_for_completion, ExecutionMode,
    ImageRequest, Job, PollConfig, Ratio, VideoRequest,
};
use crate::jimeng::{JimengClient, VisualApi};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

const TIMEOUT_NOTE: &str = "Video generation usually takes 1-2 minutes. Use async mode instead: \
    set async=true or call submit-video-task, then poll with get-video-task.";
const FAILURE_NOTE: &str = "Video generation failed. Check the prompt and the network connection.";
const SHUTDOWN_NOTE: &str = "The server stopped waiting because its input closed. The task keeps \
    running on the backend; fetch the result with get-video-task.";
const QUERY_HELP: &str = "Call get-video-task with this task_id to fetch the result";

/// Runs the four tools against a backend.
pub struct Orchestrator {
    settings: Arc<Settings>,
    credentials: Option<Credentials>,
    api: Arc<dyn VisualApi>,
    shutdown: watch::Sender<bool>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the HTTP client.
    pub fn new(settings: Settings, credentials: Option<Credentials>) -> Result<Self> {
        let client = JimengClient::new(&settings, credentials.clone())?;
        Ok(Self::with_api(settings, credentials, Arc::new(client)))
    }

    /// Create an orchestrator with a custom backend.
    pub fn with_api(
        settings: Settings,
        credentials: Option<Credentials>,
        api: Arc<dyn VisualApi>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            credentials,
            api,
            shutdown: watch::channel(false).0,
        }
    }

    /// Stop synchronous waits in progress and any started afterwards.
    ///
    /// Each affected call still answers, with an error envelope that carries
    /// its task id. Other operations are unaffected.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Credential guard: the backend is only reachable once keys are configured.
    fn backend(&self) -> std::result::Result<&dyn VisualApi, Envelope> {
        if self.credentials.is_some() {
            Ok(self.api.as_ref())
        } else {
            warn!("Rejecting tool call: credentials not configured");
            Err(Envelope::error(
                "API key not configured",
                format!("Environment variables {} and {} are not set", ACCESS_KEY_VAR, SECRET_KEY_VAR),
            )
            .with_field(
                "help",
                format!(
                    "Set {} and {} in the environment, in a .env file, or in the [credentials] section of the config file",
                    ACCESS_KEY_VAR, SECRET_KEY_VAR
                ),
            ))
        }
    }

    fn video_request(&self, prompt: &str) -> VideoRequest {
        VideoRequest {
            prompt: prompt.to_string(),
            model_key: self.settings.video.req_key.clone(),
            region: self.settings.video.region.clone(),
        }
    }

    /// `generate-image`: compose a poster prompt and render it in one backend call.
    #[instrument(skip(self, illustration, color))]
    pub async fn generate_image(
        &self,
        text: &str,
        illustration: &str,
        color: &str,
        ratio: &str,
    ) -> Envelope {
        let ratio: Ratio = match ratio.parse() {
            Ok(r) => r,
            Err(e) => {
                return Envelope::error("Unsupported image ratio", e.to_string())
                    .with_field("supported_ratios", Ratio::supported())
            }
        };

        let api = match self.backend() {
            Ok(api) => api,
            Err(envelope) => return envelope,
        };

        let dimensions = ratio.dimensions();
        let prompt = compose_image_prompt(text, illustration, color);
        let request = ImageRequest {
            prompt: prompt.clone(),
            width: dimensions.width,
            height: dimensions.height,
            model_key: self.settings.image.req_key.clone(),
            region: self.settings.image.region.clone(),
        };

        match api.generate_image(&request).await {
            Ok(result) if !result.image_urls.is_empty() => {
                info!(count = result.image_urls.len(), "Image generated");
                let llm_prompt = result.rephrased_prompt.unwrap_or_else(|| prompt.clone());
                Envelope::success(
                    "Image generated successfully",
                    json!({
                        "text": text,
                        "illustration": illustration,
                        "color": color,
                        "ratio": ratio.as_str(),
                        "dimensions": dimensions.to_string(),
                        "prompt": prompt,
                        "llm_prompt": llm_prompt,
                        "image_url": result.image_urls[0],
                        "image_urls": result.image_urls,
                    }),
                )
            }
            Ok(_) => Envelope::error("Image generation failed", "Backend returned no image URL"),
            Err(e @ JimengError::Api { .. }) => {
                Envelope::error("Image generation failed", e.to_string())
            }
            Err(e) => {
                warn!("Image generation error: {}", e);
                Envelope::error("Error while generating image", e.to_string())
            }
        }
    }

    /// `generate-video`: async by default, sync when requested or when sync intent was detected.
    #[instrument(skip(self, prompt))]
    pub async fn generate_video(&self, prompt: &str, explicit_async: bool, intent_sync: bool) -> Envelope {
        let api = match self.backend() {
            Ok(api) => api,
            Err(envelope) => return envelope,
        };

        let mode = ExecutionMode::select(explicit_async, intent_sync);
        info!(?mode, "Resolved video execution mode");

        match mode {
            ExecutionMode::Async => self.submit(api, prompt).await,
            ExecutionMode::Sync => self.generate_video_sync(api, prompt).await,
        }
    }

    /// `submit-video-task`: submit only, never wait.
    #[instrument(skip(self, prompt))]
    pub async fn submit_video_task(&self, prompt: &str) -> Envelope {
        match self.backend() {
            Ok(api) => self.submit(api, prompt).await,
            Err(envelope) => envelope,
        }
    }

    /// `get-video-task`: one status query, translated into success, error, or pending.
    #[instrument(skip(self))]
    pub async fn get_video_task(&self, task_id: &str) -> Envelope {
        let api = match self.backend() {
            Ok(api) => api,
            Err(envelope) => return envelope,
        };

        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Envelope::error("Invalid arguments", "task_id must not be empty");
        }

        let job = Job::new(task_id, &self.settings.video.req_key, &self.settings.video.region);
        match translate_task_status(api, &job).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Status query failed: {}", e);
                Envelope::error("Failed to query video generation task", e.to_string())
                    .with_field("task_id", task_id)
            }
        }
    }

    async fn submit(&self, api: &dyn VisualApi, prompt: &str) -> Envelope {
        match submit_job(api, &self.video_request(prompt)).await {
            Ok(job) => Envelope::success(
                "Video generation task submitted",
                json!({
                    "prompt": prompt,
                    "task_id": job.task_id,
                    "help": QUERY_HELP,
                }),
            ),
            Err(e) => submission_failure(e),
        }
    }

    async fn generate_video_sync(&self, api: &dyn VisualApi, prompt: &str) -> Envelope {
        let job: Job = match submit_job(api, &self.video_request(prompt)).await {
            Ok(job) => job,
            Err(e) => return submission_failure(e),
        };

        let config = PollConfig::from(&self.settings.video);
        let mut shutdown = self.shutdown.subscribe();
        let outcome = tokio::select! {
            outcome = wait_for_completion(api, &job, &config) => outcome,
            _ = shutdown_requested(&mut shutdown) => {
                info!(task_id = %job.task_id, "Stopped waiting for video task on shutdown");
                return Envelope::error(
                    "Video generation cancelled",
                    format!("Stopped waiting for task {} before it finished", job.task_id),
                )
                .with_field("note", SHUTDOWN_NOTE)
                .with_field("task_id", job.task_id);
            }
        };

        match outcome {
            Ok(urls) => Envelope::success(
                "Video generated successfully",
                json!({
                    "prompt": prompt,
                    "video_urls": urls.as_slice(),
                    "video_url": urls.first(),
                    "task_id": job.task_id,
                }),
            ),
            Err(e) => {
                warn!(task_id = %job.task_id, "Synchronous video generation failed: {}", e);
                let (message, note) = if e.is_timeout() {
                    ("Video generation timed out", TIMEOUT_NOTE)
                } else if matches!(e, JimengError::BackendFailure { .. }) {
                    ("Video generation failed", FAILURE_NOTE)
                } else {
                    ("Error while generating video", FAILURE_NOTE)
                };
                let error = match e {
                    JimengError::BackendFailure { message, .. } => message,
                    other => other.to_string(),
                };
                Envelope::error(message, error)
                    .with_field("note", note)
                    .with_field("task_id", job.task_id)
            }
        }
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        let stopped = *rx.borrow_and_update();
        if stopped {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: no shutdown can arrive anymore.
            std::future::pending::<()>().await;
        }
    }
}

fn submission_failure(e: JimengError) -> Envelope {
    let message = match e {
        JimengError::Submission(_) | JimengError::Api { .. } => {
            "Failed to submit video generation task"
        }
        _ => "Error while submitting video generation task",
    };
    warn!("{}: {}", message, e);
    Envelope::error(message, e.to_string())
}
