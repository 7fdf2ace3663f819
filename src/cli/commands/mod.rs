//! CLI command implementations.

mod config;
mod doctor;
mod mcp;

pub use config::run_config;
pub use doctor::run_doctor;
pub use mcp::run_mcp;
