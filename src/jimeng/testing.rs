//! Scripted [`VisualApi`] double for unit tests.

use super::{ImageResult, VisualApi};
use crate::error::{JimengError, Result};
use crate::generation::{ImageRequest, Job, TaskResult, VideoRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Replays queued responses and counts calls.
#[derive(Default)]
pub struct ScriptedApi {
    submits: Mutex<VecDeque<Result<Option<String>>>>,
    statuses: Mutex<VecDeque<Result<TaskResult>>>,
    default_status: Option<TaskResult>,
    images: Mutex<VecDeque<Result<ImageResult>>>,
    submitted: Mutex<Vec<VideoRequest>>,
    queried: Mutex<Vec<Job>>,
    image_requests: Mutex<Vec<ImageRequest>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submit(self, response: Result<Option<String>>) -> Self {
        self.submits.lock().unwrap().push_back(response);
        self
    }

    pub fn with_status(self, response: Result<TaskResult>) -> Self {
        self.statuses.lock().unwrap().push_back(response);
        self
    }

    /// Status returned once the queue is exhausted.
    pub fn with_default_status(mut self, response: Result<TaskResult>) -> Self {
        self.default_status = Some(response.expect("default status must be Ok"));
        self
    }

    pub fn with_image(self, response: Result<ImageResult>) -> Self {
        self.images.lock().unwrap().push_back(response);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.submit_calls() + self.status_calls() + self.image_calls()
    }

    pub fn submitted(&self) -> Vec<VideoRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Jobs passed to status queries, in call order.
    pub fn queried(&self) -> Vec<Job> {
        self.queried.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisualApi for ScriptedApi {
    async fn submit_task(&self, request: &VideoRequest) -> Result<Option<String>> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Some("task-default".to_string())))
    }

    async fn get_task_result(&self, job: &Job) -> Result<TaskResult> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(job.clone());
        let queued = self.statuses.lock().unwrap().pop_front();
        match queued {
            Some(response) => response,
            None => self.default_status.clone().ok_or_else(|| JimengError::Api {
                code: 50000,
                message: "no scripted status".to_string(),
            }),
        }
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image_requests.lock().unwrap().push(request.clone());
        self.images.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(JimengError::Api {
                code: 50000,
                message: "no scripted image".to_string(),
            })
        })
    }
}
