//! CLI module for the Jimeng MCP server.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Jimeng MCP - text-to-image and text-to-video tools for AI assistants
///
/// Serves the Jimeng generation tools over the Model Context Protocol (stdio).
#[derive(Parser, Debug)]
#[command(name = "jimeng-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server on stdio
    Mcp,

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (secrets masked)
    Show,

    /// Show configuration file path
    Path,
}
