//! Static MCP resources: server status and per-tool usage help.

use super::protocol::Resource;
use super::server::{SERVER_NAME, SERVER_VERSION};

pub const SERVER_INFO_URI: &str = "info://server";

const HELP_GENERATE_IMAGE: &str = "\
# generate-image

Generates an image showing the given text, decorated with illustration elements.

## Parameters

- text: text to display on the image
- illustration: 3-5 decorative illustration keywords derived from the text
- color: main background color
- ratio: aspect ratio. Supported: 4:3 (512*384), 3:4 (384*512), 16:9 (512*288), 9:16 (288*512)

## Example

Use generate-image to create an image showing \"Innovate the Future\", decorated with \
technology, starry sky and light beams, on a blue background, ratio 16:9.";

const HELP_GENERATE_VIDEO: &str = "\
# generate-video

Generates a video from a text prompt.

## Parameters

- prompt: description of the video content
- async: true returns a task id immediately, false waits for the finished video (default: true)
- intent_sync: set when the user asked to wait for the result or get it in one go (default: false)

## Behavior

By default the task is submitted asynchronously and a task id is returned; query it later \
with get-video-task.

The call waits for the finished video when either:
- async=false
- intent_sync=true

## Notes

- Video generation takes 1-2 minutes; waiting for it may hit the timeout
- The async default is recommended

## Examples

Async (recommended):
Use generate-video to create a video of \"a panda playing in a bamboo forest\"

Sync:
Use generate-video to create a video of \"a panda playing in a bamboo forest\", I want the result in one go";

const HELP_SUBMIT_VIDEO_TASK: &str = "\
# submit-video-task

Submits a video generation task and returns its task id without waiting for completion.

## Parameters

- prompt: description of the video content

## Example

Use submit-video-task to submit a video of \"a white piglet running on the beach\", then \
query the result with get-video-task.";

const HELP_GET_VIDEO_TASK: &str = "\
# get-video-task

Fetches the result of a video generation task.

## Parameters

- task_id: task id returned by submit-video-task or generate-video

## Result

- status \"success\": the video is ready; data.video_url holds the first URL
- status \"pending\": the task is still running; query again later. This is not an error, \
so the tool result carries no isError flag
- status \"error\": the task failed or could not be queried; isError is set

## Example

Use get-video-task to fetch the result of task \"12345678901234567890\".";

const HELP_PAGES: [(&str, &str, &str); 4] = [
    ("help://generate-image", "generate-image help", HELP_GENERATE_IMAGE),
    ("help://generate-video", "generate-video help", HELP_GENERATE_VIDEO),
    ("help://submit-video-task", "submit-video-task help", HELP_SUBMIT_VIDEO_TASK),
    ("help://get-video-task", "get-video-task help", HELP_GET_VIDEO_TASK),
];

/// All resources exposed by the server.
pub fn list_resources() -> Vec<Resource> {
    let mut resources = vec![Resource {
        uri: SERVER_INFO_URI.to_string(),
        name: "info".to_string(),
        description: "Server identity and credential status".to_string(),
        mime_type: "text/plain".to_string(),
    }];

    resources.extend(HELP_PAGES.iter().map(|(uri, name, _)| Resource {
        uri: uri.to_string(),
        name: name.to_string(),
        description: format!("Usage help for {}", uri.trim_start_matches("help://")),
        mime_type: "text/markdown".to_string(),
    }));

    resources
}

/// Text of a resource, or `None` for an unknown URI.
pub fn read_resource(uri: &str, credentials_configured: bool) -> Option<(String, &'static str)> {
    if uri == SERVER_INFO_URI {
        let status = if credentials_configured {
            "credentials configured"
        } else {
            "credentials not configured"
        };
        return Some((
            format!(
                "Jimeng AI image and video generation (MCP)\n\nServer: {}\nVersion: {}\nStatus: {}",
                SERVER_NAME, SERVER_VERSION, status
            ),
            "text/plain",
        ));
    }

    HELP_PAGES
        .iter()
        .find(|(page_uri, _, _)| *page_uri == uri)
        .map(|(_, _, text)| (text.to_string(), "text/markdown"))
}
