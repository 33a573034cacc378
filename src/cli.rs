//! CLI struct definitions for the sop-engine command-line interface.

use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
  sop-engine .              Generate in current directory
  sop-engine ~/my-project   Generate in specified directory

The generated .claude/ includes:
  hooks/engine.sh     Route events to validators
  validators/         Rule enforcement scripts
  loggers/            Event logging
  sop.json            Rule configuration
  settings.json       Claude Code hook config
  skills/, agents/    Generated from sop.json, when listed

.claude/ is generated once; delete it to regenerate. Managed servers in
.mcp.json are reconciled on every run, manual entries are kept.
Put a .sop-engine/ directory in the project to replace the bundled template.";

#[derive(Parser, Debug)]
#[clap(
    name = "sop-engine",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate .claude/ and reconcile managed MCP servers in .mcp.json",
    after_help = AFTER_HELP
)]
pub(crate) struct Cli {
    /// Project directory to generate into (defaults to current working directory).
    pub target_dir: Option<PathBuf>,
}
