//! Jimeng MCP - text-to-image and text-to-video tools over the Model Context Protocol
//!
//! Exposes the Jimeng (Volcengine visual) generation backend to AI assistants as MCP tools
//! served over stdio.
//!
//! # Overview
//!
//! The server offers four tools:
//! - `generate-image` - typographic image with illustration elements
//! - `generate-video` - video from a prompt, async by default or waiting for the result
//! - `submit-video-task` - submit a video job and return its task id
//! - `get-video-task` - query a video job by task id
//!
//! Every tool answers with a JSON envelope carrying `status`, `message` and `timestamp`.
//!
//! # Architecture
//!
//! - `config` - Settings and credential resolution
//! - `envelope` - Uniform response envelope
//! - `generation` - Ratios, prompt composition, mode selection, job submission and polling
//! - `jimeng` - Signed HTTP client for the visual API
//! - `orchestrator` - Tool-level operations behind the credential guard
//! - `mcp` - JSON-RPC protocol and stdio server
//!
//! # Example
//!
//! ```rust,no_run
//! use jimeng_mcp::config::Settings;
//! use jimeng_mcp::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = settings.credentials();
//!     let orchestrator = Orchestrator::new(settings, credentials)?;
//!
//!     let envelope = orchestrator.submit_video_task("a panda playing in a bamboo forest").await;
//!     println!("{}", envelope.to_json_pretty());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod envelope;
pub mod error;
pub mod generation;
pub mod jimeng;
pub mod mcp;
pub mod orchestrator;

pub use error::{JimengError, Result};
