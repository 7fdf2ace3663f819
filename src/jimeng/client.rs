//! HTTP implementation of [`VisualApi`].

use super::signer::Signer;
use super::types::*;
use super::{ImageResult, VisualApi};
use crate::config::{ApiSettings, Credentials, Settings};
use crate::error::{JimengError, Result};
use crate::generation::{ImageRequest, Job, TaskResult, VideoRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const CONTENT_TYPE: &str = "application/json";

/// Signed client for the Jimeng visual API.
pub struct JimengClient {
    http: reqwest::Client,
    endpoint: Url,
    host: String,
    api: ApiSettings,
    credentials: Option<Credentials>,
}

impl JimengClient {
    /// Create a client. Missing credentials are only reported when a request is made.
    pub fn new(settings: &Settings, credentials: Option<Credentials>) -> Result<Self> {
        let endpoint = Url::parse(&settings.api.endpoint).map_err(|e| {
            JimengError::Config(format!("Invalid API endpoint '{}': {}", settings.api.endpoint, e))
        })?;
        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(JimengError::Config(format!(
                    "API endpoint has no host: {}",
                    settings.api.endpoint
                )))
            }
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.api.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            host,
            api: settings.api.clone(),
            credentials,
        })
    }

    /// Send one signed action and unwrap the response envelope.
    async fn call<B, T>(&self, action: &str, region: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            JimengError::Config("API credentials are not configured".to_string())
        })?;

        let payload = serde_json::to_vec(body)?;
        let query = [("Action", action), ("Version", self.api.version.as_str())];
        let signed = Signer::new(credentials, region, &self.api.service).sign(
            "POST",
            &self.host,
            self.endpoint.path(),
            &query,
            CONTENT_TYPE,
            &payload,
            chrono::Utc::now(),
        );

        debug!(action, region, bytes = payload.len(), "Sending request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&query)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Date", &signed.x_date)
            .header("X-Content-Sha256", &signed.content_sha256)
            .header("Authorization", &signed.authorization)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        let parsed: ApiResponse<T> = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(JimengError::Api {
                    code: i64::from(status.as_u16()),
                    message: truncate(&text, 300),
                })
            }
        };

        if let Some(error) = parsed
            .response_metadata
            .as_ref()
            .and_then(|meta| meta.error.as_ref())
        {
            warn!(
                action,
                request_id = ?parsed.response_metadata.as_ref().and_then(|m| m.request_id.as_deref()),
                "Gateway rejected request: {}",
                error.code
            );
            return Err(JimengError::Api {
                code: error.code_n.unwrap_or_else(|| i64::from(status.as_u16())),
                message: format!("{}: {}", error.code, error.message),
            });
        }

        match parsed.code {
            Some(SUCCESS_CODE) => {
                debug!(action, request_id = ?parsed.request_id, "Request succeeded");
                Ok(parsed.data)
            }
            code => {
                let code = code.unwrap_or_else(|| i64::from(status.as_u16()));
                let message = parsed.message.unwrap_or_else(|| "Unknown error".to_string());
                warn!(action, code, request_id = ?parsed.request_id, "API returned error: {}", message);
                Err(JimengError::Api { code, message })
            }
        }
    }
}

#[async_trait]
impl VisualApi for JimengClient {
    #[instrument(skip(self, request), fields(model = %request.model_key))]
    async fn submit_task(&self, request: &VideoRequest) -> Result<Option<String>> {
        let body = SubmitTaskBody {
            req_key: &request.model_key,
            prompt: &request.prompt,
        };
        let data: Option<SubmitTaskData> =
            self.call(ACTION_SUBMIT_TASK, &request.region, &body).await?;
        Ok(data.and_then(|d| d.task_id))
    }

    #[instrument(skip(self, job), fields(task_id = %job.task_id, region = %job.region))]
    async fn get_task_result(&self, job: &Job) -> Result<TaskResult> {
        let body = GetResultBody {
            req_key: &job.model_key,
            task_id: &job.task_id,
        };
        let data: Option<TaskResultData> = self.call(ACTION_GET_RESULT, &job.region, &body).await?;
        let data = data.ok_or_else(|| JimengError::Api {
            code: SUCCESS_CODE,
            message: "Status response did not contain data".to_string(),
        })?;

        let mut video_urls = data.video_urls.unwrap_or_default();
        if let Some(url) = data.video_url {
            if !video_urls.contains(&url) {
                video_urls.insert(0, url);
            }
        }

        Ok(TaskResult {
            status: data.status.unwrap_or_default(),
            video_urls,
            error: data.error,
        })
    }

    #[instrument(skip(self, request), fields(width = request.width, height = request.height))]
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult> {
        let body = ImageBody {
            req_key: &request.model_key,
            prompt: &request.prompt,
            width: request.width,
            height: request.height,
            return_url: true,
            use_pre_llm: true,
            use_sr: true,
        };
        let data: Option<ImageData> = self.call(ACTION_PROCESS, &request.region, &body).await?;

        Ok(data
            .map(|d| ImageResult {
                image_urls: d.image_urls.unwrap_or_default(),
                rephrased_prompt: d.rephraser_result.filter(|p| !p.is_empty()),
            })
            .unwrap_or_default())
    }
}

/// Truncate text with ellipsis.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
