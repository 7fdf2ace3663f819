//! Wire types for the visual API.

use serde::{Deserialize, Serialize};

/// Business code the API returns on success.
pub const SUCCESS_CODE: i64 = 10000;

pub const ACTION_SUBMIT_TASK: &str = "CVSync2AsyncSubmitTask";
pub const ACTION_GET_RESULT: &str = "CVSync2AsyncGetResult";
pub const ACTION_PROCESS: &str = "CVProcess";

/// Common response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub data: Option<T>,
    pub request_id: Option<String>,
    /// Gateway-level errors (signature, permission) arrive here instead of `code`.
    #[serde(rename = "ResponseMetadata")]
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseMetadata {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub error: Option<MetadataError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetadataError {
    #[serde(default)]
    pub code_n: Option<i64>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitTaskBody<'a> {
    pub req_key: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTaskData {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetResultBody<'a> {
    pub req_key: &'a str,
    pub task_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TaskResultData {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_urls: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageBody<'a> {
    pub req_key: &'a str,
    pub prompt: &'a str,
    pub width: u32,
    pub height: u32,
    pub return_url: bool,
    pub use_pre_llm: bool,
    pub use_sr: bool,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub rephraser_result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submit_response() {
        let body = r#"{"code":10000,"data":{"task_id":"7392616336519610409"},"message":"Success","request_id":"abc","status":10000}"#;
        let parsed: ApiResponse<SubmitTaskData> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.code, Some(SUCCESS_CODE));
        assert_eq!(
            parsed.data.unwrap().task_id.as_deref(),
            Some("7392616336519610409")
        );
    }

    #[test]
    fn test_parse_gateway_error() {
        let body = r#"{"ResponseMetadata":{"RequestId":"r1","Action":"CVProcess","Error":{"CodeN":100010,"Code":"SignatureDoesNotMatch","Message":"The request signature we calculated does not match"}}}"#;
        let parsed: ApiResponse<ImageData> = serde_json::from_str(body).unwrap();
        assert!(parsed.code.is_none());
        let error = parsed.response_metadata.unwrap().error.unwrap();
        assert_eq!(error.code, "SignatureDoesNotMatch");
        assert_eq!(error.code_n, Some(100010));
    }

    #[test]
    fn test_parse_task_result() {
        let body = r#"{"code":10000,"data":{"status":"done","video_url":"https://cdn/v.mp4"},"message":"Success"}"#;
        let parsed: ApiResponse<TaskResultData> = serde_json::from_str(body).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(data.status.as_deref(), Some("done"));
        assert_eq!(data.video_url.as_deref(), Some("https://cdn/v.mp4"));
        assert!(data.video_urls.is_none());
    }

    #[test]
    fn test_parse_business_error_without_data() {
        let body = r#"{"code":50411,"message":"Pre Img Risk Not Pass","request_id":"r2"}"#;
        let parsed: ApiResponse<SubmitTaskData> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.code, Some(50411));
        assert!(parsed.data.is_none());
        assert!(parsed.response_metadata.is_none());
        assert_eq!(parsed.request_id.as_deref(), Some("r2"));
    }
}
