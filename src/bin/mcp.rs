//! `sop-engine-mcp`: stdio MCP server exposing the `sop_generate` tool.

use anyhow::Context;
use sop_engine::core::mcp_server::{self, McpServer};
use std::io;

fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let mut server = McpServer::new(cwd);

    let stdin = io::stdin();
    let stdout = io::stdout();
    mcp_server::serve(&mut server, stdin.lock(), stdout.lock()).context("stdio transport failed")?;
    Ok(())
}
