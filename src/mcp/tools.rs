//! MCP tool definitions and argument parsing.

use super::protocol::{Tool, ToolCallResult};
use crate::envelope::Envelope;
use crate::generation::Ratio;
use crate::orchestrator::Orchestrator;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const GENERATE_IMAGE: &str = "generate-image";
pub const GENERATE_VIDEO: &str = "generate-video";
pub const SUBMIT_VIDEO_TASK: &str = "submit-video-task";
pub const GET_VIDEO_TASK: &str = "get-video-task";

#[derive(Debug, Deserialize)]
struct GenerateImageArgs {
    text: String,
    illustration: String,
    color: String,
    ratio: String,
}

#[derive(Debug, Deserialize)]
struct GenerateVideoArgs {
    prompt: String,
    #[serde(rename = "async", default = "default_async")]
    explicit_async: bool,
    #[serde(default)]
    intent_sync: bool,
}

fn default_async() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SubmitVideoTaskArgs {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct GetVideoTaskArgs {
    task_id: String,
}

/// Get all available tools.
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: GENERATE_IMAGE.to_string(),
            description: "Generate a typographic image showing the given text, decorated with \
                illustration elements on a colored gradient background."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Text to display on the image"
                    },
                    "illustration": {
                        "type": "string",
                        "description": "3-5 decorative illustration keywords derived from the text"
                    },
                    "color": {
                        "type": "string",
                        "description": "Main background color"
                    },
                    "ratio": {
                        "type": "string",
                        "enum": Ratio::supported(),
                        "description": "Aspect ratio: 4:3 (512*384), 3:4 (384*512), 16:9 (512*288), 9:16 (288*512)"
                    }
                },
                "required": ["text", "illustration", "color", "ratio"]
            }),
        },
        Tool {
            name: GENERATE_VIDEO.to_string(),
            description: "Generate a video from a text prompt. Async by default (returns a task id); \
                waits for the finished video when async=false or when the user asked for the result \
                in one go (intent_sync=true)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Description of the video content"
                    },
                    "async": {
                        "type": "boolean",
                        "description": "true returns a task id immediately, false waits for the video",
                        "default": true
                    },
                    "intent_sync": {
                        "type": "boolean",
                        "description": "Set when the user asked to wait for the result or get it in one go",
                        "default": false
                    }
                },
                "required": ["prompt"]
            }),
        },
        Tool {
            name: SUBMIT_VIDEO_TASK.to_string(),
            description: "Submit a video generation task and return its task id without waiting."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Description of the video content"
                    }
                },
                "required": ["prompt"]
            }),
        },
        Tool {
            name: GET_VIDEO_TASK.to_string(),
            description: "Get the result of a video generation task by its task id."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "Task id returned by submit-video-task or generate-video"
                    }
                },
                "required": ["task_id"]
            }),
        },
    ]
}

/// Dispatch a tool call to the orchestrator.
pub async fn call_tool(orchestrator: &Orchestrator, name: &str, args: Option<Value>) -> ToolCallResult {
    let envelope = match name {
        GENERATE_IMAGE => match parse_args::<GenerateImageArgs>(args) {
            Ok(a) => {
                orchestrator
                    .generate_image(&a.text, &a.illustration, &a.color, &a.ratio)
                    .await
            }
            Err(envelope) => envelope,
        },
        GENERATE_VIDEO => match parse_args::<GenerateVideoArgs>(args) {
            Ok(a) => {
                orchestrator
                    .generate_video(&a.prompt, a.explicit_async, a.intent_sync)
                    .await
            }
            Err(envelope) => envelope,
        },
        SUBMIT_VIDEO_TASK => match parse_args::<SubmitVideoTaskArgs>(args) {
            Ok(a) => orchestrator.submit_video_task(&a.prompt).await,
            Err(envelope) => envelope,
        },
        GET_VIDEO_TASK => match parse_args::<GetVideoTaskArgs>(args) {
            Ok(a) => orchestrator.get_video_task(&a.task_id).await,
            Err(envelope) => envelope,
        },
        _ => Envelope::error("Unknown tool", format!("Unknown tool: {}", name)),
    };

    ToolCallResult::from_envelope(&envelope)
}

fn parse_args<T: DeserializeOwned>(args: Option<Value>) -> Result<T, Envelope> {
    serde_json::from_value(args.unwrap_or_else(|| json!({})))
        .map_err(|e| Envelope::error("Invalid arguments", e.to_string()))
}
