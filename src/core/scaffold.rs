//! One-time scaffolding of the `.claude/` automation directory.
//!
//! Scaffolding is gated purely on the existence of `<target>/.claude/`: if it
//! is there, nothing under it is touched. Otherwise:
//!
//! - the template tree is copied byte-for-byte, except `content/`
//! - files under `hooks/`, `validators/` and `loggers/` are made executable
//! - `settings.json` is generated
//! - skills and agents listed in `sop.json` are assembled from `content/`
//!
//! There is no merge step and no rollback. A scaffold that fails halfway
//! leaves a partial `.claude/` behind, which later runs will skip.

use crate::core::config::{ConfigSource, ToolConfig};
use crate::core::error::SopError;
use crate::core::frontmatter;
use crate::core::settings;
use std::fs;
use std::path::{Path, PathBuf};

/// Scaffold directory, relative to the target project root.
pub const SCAFFOLD_DIR: &str = ".claude";
/// Source material for skills and agents; never copied.
const CONTENT_DIR: &str = "content";
const EXECUTABLE_DIRS: &[&str] = &["hooks", "validators", "loggers"];
/// The single handler every lifecycle event is wired to.
pub const ENGINE_SCRIPT: &str = "hooks/engine.sh";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldOutcome {
    /// Files written, relative to `.claude/`, in write order.
    Created { files: Vec<String> },
    /// `.claude/` already existed.
    Skipped,
}

pub fn scaffold_dir(target_dir: &Path) -> PathBuf {
    target_dir.join(SCAFFOLD_DIR)
}

pub fn scaffold_exists(target_dir: &Path) -> bool {
    scaffold_dir(target_dir).exists()
}

fn ensure_parent(path: &Path) -> Result<(), SopError> {
    if let Some(p) = path.parent() {
        fs::create_dir_all(p).map_err(SopError::at(p))?;
    }
    Ok(())
}

fn is_executable_path(rel_path: &str) -> bool {
    rel_path
        .split('/')
        .next()
        .is_some_and(|top| EXECUTABLE_DIRS.contains(&top))
}

fn is_content_path(rel_path: &str) -> bool {
    rel_path == CONTENT_DIR || rel_path.starts_with("content/")
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SopError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).map_err(SopError::at(path))?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).map_err(SopError::at(path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SopError> {
    Ok(())
}

fn copy_template_file(source: &ConfigSource, rel_path: &str, dest: &Path) -> Result<(), SopError> {
    ensure_parent(dest)?;
    match source {
        // fs::copy carries the source permission bits along.
        ConfigSource::ProjectOverride(dir) => {
            let src = dir.join(rel_path);
            fs::copy(&src, dest).map_err(SopError::at(&src))?;
        }
        ConfigSource::Bundled => {
            let bytes = source
                .read_file(rel_path)?
                .ok_or_else(|| SopError::NotFound(format!("bundled template file {}", rel_path)))?;
            fs::write(dest, bytes).map_err(SopError::at(dest))?;
        }
    }
    if is_executable_path(rel_path) {
        make_executable(dest)?;
    }
    Ok(())
}

fn read_content(source: &ConfigSource, rel_path: &str) -> Result<String, SopError> {
    if rel_path.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(SopError::ValidationError(format!(
            "content path {:?} must be relative to {}/ without '..'",
            rel_path, CONTENT_DIR
        )));
    }
    let full = format!("{}/{}", CONTENT_DIR, rel_path);
    let bytes = source.read_file(&full)?.ok_or_else(|| {
        SopError::NotFound(format!("content file {} in {}", full, source.describe()))
    })?;
    String::from_utf8(bytes)
        .map_err(|_| SopError::ValidationError(format!("content file {} is not UTF-8", full)))
}

fn write_generated(claude_dir: &Path, rel_path: &str, content: &str) -> Result<(), SopError> {
    let dest = claude_dir.join(rel_path);
    ensure_parent(&dest)?;
    fs::write(&dest, content).map_err(SopError::at(&dest))
}

pub fn scaffold_project(
    target_dir: &Path,
    source: &ConfigSource,
    config: &ToolConfig,
) -> Result<ScaffoldOutcome, SopError> {
    let claude_dir = scaffold_dir(target_dir);
    if claude_dir.exists() {
        return Ok(ScaffoldOutcome::Skipped);
    }

    // Reject bad names and a missing engine before anything is written.
    for skill in &config.skills {
        frontmatter::validate_name("skill", &skill.name)?;
    }
    for agent in &config.agents {
        frontmatter::validate_name("agent", &agent.name)?;
    }
    let template_files = source.list_files()?;
    if !template_files.iter().any(|f| f == ENGINE_SCRIPT) {
        return Err(SopError::NotFound(format!(
            "{} in {}",
            ENGINE_SCRIPT,
            source.describe()
        )));
    }

    fs::create_dir_all(&claude_dir).map_err(SopError::at(&claude_dir))?;
    let mut files = Vec::new();

    for rel_path in template_files {
        if is_content_path(&rel_path) || rel_path == SETTINGS_FILE {
            continue;
        }
        copy_template_file(source, &rel_path, &claude_dir.join(&rel_path))?;
        files.push(rel_path);
    }

    write_generated(&claude_dir, SETTINGS_FILE, &settings::render_settings()?)?;
    files.push(SETTINGS_FILE.to_string());

    for skill in &config.skills {
        let body = read_content(source, &skill.source)?;
        let rel_path = format!("skills/{}/SKILL.md", skill.name);
        write_generated(&claude_dir, &rel_path, &frontmatter::skill_document(skill, &body))?;
        files.push(rel_path);
    }

    for agent in &config.agents {
        let body = read_content(source, &agent.source)?;
        let rel_path = format!("agents/{}.md", agent.name);
        write_generated(&claude_dir, &rel_path, &frontmatter::agent_document(agent, &body))?;
        files.push(rel_path);
    }

    Ok(ScaffoldOutcome::Created { files })
}
