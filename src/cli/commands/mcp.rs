//! MCP command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use tracing::warn;

/// Run the MCP server.
///
/// Missing credentials do not stop the server: tools answer with a
/// configuration error and the info/help resources stay available.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    let credentials = settings.credentials();
    if credentials.is_none() {
        warn!("JIMENG_ACCESS_KEY and JIMENG_SECRET_KEY are not set; tools will report a configuration error");
    }

    let orchestrator = Orchestrator::new(settings, credentials)?;
    let server = McpServer::new(orchestrator);
    server.run().await
}
