//! MCP (Model Context Protocol) server.
//!
//! Exposes the generation tools and their help texts to AI assistants.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod resources;
mod server;
mod tools;

pub use server::McpServer;
