//! On-demand status query for a previously submitted video task.

use super::job::{Job, TaskResult, TaskState};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::jimeng::VisualApi;
use serde_json::json;
use tracing::instrument;

/// Query the task once and shape the result into an envelope.
///
/// Read-only: safe to call repeatedly or concurrently for the same task id.
#[instrument(skip(api, job), fields(task_id = %job.task_id))]
pub async fn translate_task_status(api: &dyn VisualApi, job: &Job) -> Result<Envelope> {
    let result = api.get_task_result(job).await?;
    Ok(task_envelope(&job.task_id, &result))
}

/// Map a raw status to a success, error, or pending envelope.
pub fn task_envelope(task_id: &str, result: &TaskResult) -> Envelope {
    match result.state() {
        TaskState::Succeeded(urls) => Envelope::success(
            "Video generated successfully",
            json!({
                "status": result.status,
                "video_urls": urls.as_slice(),
                "video_url": urls.first(),
                "task_id": task_id,
            }),
        ),
        TaskState::Failed { error } => Envelope::error_in_data(
            "Video generation task failed",
            error.unwrap_or_else(|| "Video generation task failed".to_string()),
            json!({
                "status": result.status,
                "task_id": task_id,
            }),
        ),
        TaskState::Pending | TaskState::InProgress => Envelope::pending(
            "Video generation task is still in progress",
            json!({
                "status": result.status,
                "task_id": task_id,
                "help": "Query again later with the get-video-task tool",
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeStatus;
    use crate::jimeng::testing::ScriptedApi;

    fn raw(status: &str, urls: &[&str], error: Option<&str>) -> TaskResult {
        TaskResult {
            status: status.to_string(),
            video_urls: urls.iter().map(|u| u.to_string()).collect(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_success_includes_first_url() {
        let env = task_envelope("t1", &raw("SUCCEEDED", &["u1", "u2"], None));
        assert_eq!(env.status, EnvelopeStatus::Success);
        assert_eq!(env.data_field("video_url"), Some(&json!("u1")));
        assert_eq!(env.data_field("video_urls"), Some(&json!(["u1", "u2"])));
        assert_eq!(env.data_field("task_id"), Some(&json!("t1")));
    }

    #[test]
    fn test_failed_task() {
        let env = task_envelope("t2", &raw("FAILED", &[], Some("risk check failed")));
        assert_eq!(env.status, EnvelopeStatus::Error);
        assert_eq!(env.data_field("status"), Some(&json!("FAILED")));
        assert_eq!(env.data_field("task_id"), Some(&json!("t2")));
        assert_eq!(env.data_field("error"), Some(&json!("risk check failed")));
    }

    #[test]
    fn test_failed_without_backend_message() {
        let env = task_envelope("t2", &raw("FAILED", &[], None));
        assert!(env.has_error_field());
    }

    #[test]
    fn test_done_without_urls_is_error() {
        let env = task_envelope("t3", &raw("done", &[], None));
        assert_eq!(env.status, EnvelopeStatus::Error);
        assert!(env.has_error_field());
        assert!(env.data_field("video_urls").is_none());
    }

    #[test]
    fn test_in_progress_is_pending() {
        let env = task_envelope("t4", &raw("generating", &[], None));
        assert_eq!(env.status, EnvelopeStatus::Pending);
        assert!(!env.has_error_field());
        assert!(env.data_field("help").is_some());
    }

    #[tokio::test]
    async fn test_repeated_queries_are_independent() {
        let api = ScriptedApi::new().with_default_status(Ok(raw("in_queue", &[], None)));

        let job = Job::new("t5", "jimeng_vgfm_t2v_l20", "cn-north-1");
        let first = translate_task_status(&api, &job).await.unwrap();
        let second = translate_task_status(&api, &job).await.unwrap();

        for env in [&first, &second] {
            assert_eq!(env.status, EnvelopeStatus::Pending);
            assert_eq!(env.data_field("task_id"), Some(&json!("t5")));
        }
        assert_eq!(api.status_calls(), 2);
        assert_eq!(api.submit_calls(), 0);
    }
}
