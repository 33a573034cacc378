//! One invocation of the engine against a target project.
//!
//! Order of operations:
//!
//! 1. note whether `.claude/` already exists (the scaffold gate)
//! 2. resolve the configuration source and load `sop.json` from it
//! 3. scaffold `.claude/` unless the gate said it exists
//! 4. load `.mcp.json`, reconcile it against the declaration, write it back
//!
//! Parse problems in `sop.json` or `.mcp.json` are downgraded to warnings.
//! I/O failures abort the run.

use crate::core::config::{self, ConfigSource};
use crate::core::error::SopError;
use crate::core::reconcile::{self, ReconcileReport};
use crate::core::scaffold::{self, ScaffoldOutcome};
use crate::core::state_file;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOutcome {
    pub target_dir: PathBuf,
    pub source: ConfigSource,
    /// Downgraded configuration problems, in the order they were found.
    pub warnings: Vec<String>,
    pub scaffold: ScaffoldOutcome,
    pub state_path: PathBuf,
    pub report: ReconcileReport,
}

pub fn generate(target_dir: &Path) -> Result<GenerateOutcome, SopError> {
    fs::create_dir_all(target_dir).map_err(SopError::at(target_dir))?;
    let target_dir = fs::canonicalize(target_dir).map_err(SopError::at(target_dir))?;

    let scaffold_present = scaffold::scaffold_exists(&target_dir);

    let source = config::resolve_source(&target_dir);
    let loaded = config::load_tool_config(&source)?;

    let scaffold = if scaffold_present {
        ScaffoldOutcome::Skipped
    } else {
        scaffold::scaffold_project(&target_dir, &source, &loaded.config)?
    };

    let state_path = state_file::state_path(&target_dir);
    let previous = state_file::load(&state_path)?;
    let reconciliation = reconcile::reconcile(previous, &loaded.config.declaration);
    state_file::save(&state_path, &reconciliation.state)?;

    Ok(GenerateOutcome {
        target_dir,
        source,
        warnings: loaded.warnings,
        scaffold,
        state_path,
        report: reconciliation.report,
    })
}
