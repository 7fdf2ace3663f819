//! Generation domain: request shaping, execution mode, and the video job lifecycle.
//!
//! Image generation is a single request. Video generation is a backend job that
//! is either submitted and handed back to the caller (async mode) or submitted
//! and polled until it reaches a terminal state (sync mode).

pub mod job;
pub mod mode;
pub mod poller;
pub mod prompt;
pub mod ratio;
pub mod status;

pub use job::{submit_job, ImageRequest, Job, TaskResult, TaskState, VideoRequest, VideoUrls};
pub use mode::ExecutionMode;
pub use poller::{wait_for_completion, PollConfig};
pub use prompt::compose_image_prompt;
pub use ratio::{Dimensions, Ratio};
pub use status::translate_task_status;
