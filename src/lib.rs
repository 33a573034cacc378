//! sop-engine: standard operating procedures for Claude Code projects.
//!
//! One command sets a project up and keeps one shared file honest:
//!
//! - **`.claude/`** is scaffolded once from a template: hook engine,
//!   validators, loggers, `sop.json`, a generated `settings.json`, and any
//!   skills or agents `sop.json` lists. If `.claude/` exists it is left alone.
//! - **`.mcp.json`** is reconciled on every run. The servers declared under
//!   `mcpServers` in `sop.json` are managed: written, overwritten, and removed
//!   once no longer declared. Servers a human added by hand are kept verbatim.
//!
//! # Configuration
//!
//! The template (and with it `sop.json`) comes from `<project>/.sop-engine/`
//! when that directory exists, otherwise from the copy bundled into the
//! binary.
//!
//! # Limitations
//!
//! `.mcp.json` is rewritten in place without locking. Running two instances
//! against the same project at once is unsupported and may lose an update; a
//! crash mid-write leaves a file the next run reports as invalid and replaces.
//!
//! # Examples
//!
//! ```bash
//! # Set up the current project
//! sop-engine
//!
//! # Set up another project
//! sop-engine ~/my-project
//!
//! # Serve the same operation as an MCP tool over stdio
//! sop-engine-mcp
//! ```
//!
//! # Crate Structure
//!
//! - [`core::reconcile`]: pure merge of declared and manual `.mcp.json` entries
//! - [`core::generate`]: one run end to end (scaffold gate, load, reconcile, save)
//! - [`core::mcp_server`]: JSON-RPC stdio surface for the `sop_generate` tool

pub mod core;

mod cli;

use clap::Parser;
use cli::Cli;
use crate::core::{error, generate, output};

pub fn run() -> Result<(), error::SopError> {
    let cli = Cli::parse();
    let target_dir = match cli.target_dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };

    let outcome = generate::generate(&target_dir)?;
    output::print_outcome(&outcome);
    Ok(())
}
