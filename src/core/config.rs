//! Configuration source resolution and the tool configuration (`sop.json`).
//!
//! The source is resolved once per run:
//!
//! 1. `<target>/.sop-engine/` if that directory exists (project-local override)
//! 2. the template bundled into the binary
//!
//! Both the scaffold template tree and `sop.json` come from the resolved
//! source. `sop.json` carries the [`Declaration`] under `mcpServers` plus the
//! optional `skills` and `agents` lists; other keys belong to the validator
//! scripts and are ignored here.

use crate::core::assets;
use crate::core::error::SopError;
use crate::core::reconcile::Declaration;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Project-local override directory, relative to the target project root.
pub const OVERRIDE_DIR: &str = ".sop-engine";
/// Tool configuration file inside the configuration source.
pub const CONFIG_FILE: &str = "sop.json";
/// Key of the declaration inside `sop.json`.
pub const DECLARATION_KEY: &str = "mcpServers";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    ProjectOverride(PathBuf),
    Bundled,
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::ProjectOverride(dir) => format!("project override {}", dir.display()),
            ConfigSource::Bundled => "bundled template".to_string(),
        }
    }

    /// Reads a file relative to the source root. Missing files are `None`.
    pub fn read_file(&self, rel_path: &str) -> Result<Option<Vec<u8>>, SopError> {
        match self {
            ConfigSource::ProjectOverride(dir) => {
                let path = dir.join(rel_path);
                match fs::read(&path) {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(SopError::at(path)(e)),
                }
            }
            ConfigSource::Bundled => Ok(assets::get_template_file(rel_path)),
        }
    }

    /// Every file in the source, as sorted `/`-separated relative paths.
    pub fn list_files(&self) -> Result<Vec<String>, SopError> {
        match self {
            ConfigSource::ProjectOverride(dir) => {
                let mut files = Vec::new();
                walk_files(dir, "", &mut files)?;
                files.sort();
                Ok(files)
            }
            ConfigSource::Bundled => Ok(assets::list_template_files()),
        }
    }
}

fn walk_files(root: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), SopError> {
    let dir = root.join(prefix);
    for entry in fs::read_dir(&dir).map_err(SopError::at(&dir))? {
        let entry = entry.map_err(SopError::at(&dir))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        // file_type does not follow symlinks; linked directories are skipped.
        let file_type = entry.file_type().map_err(SopError::at(entry.path()))?;
        if file_type.is_dir() {
            walk_files(root, &rel, out)?;
        } else if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            out.push(rel);
        }
    }
    Ok(())
}

pub fn resolve_source(target_dir: &Path) -> ConfigSource {
    let override_dir = target_dir.join(OVERRIDE_DIR);
    if override_dir.is_dir() {
        ConfigSource::ProjectOverride(override_dir)
    } else {
        ConfigSource::Bundled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SkillSpec {
    pub name: String,
    pub description: String,
    /// Content file, relative to `content/` in the configuration source.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub description: String,
    pub source: String,
    #[serde(default)]
    pub tools: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolConfig {
    pub declaration: Declaration,
    pub skills: Vec<SkillSpec>,
    pub agents: Vec<AgentSpec>,
}

/// A parsed configuration plus the problems that were downgraded on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub config: ToolConfig,
    pub warnings: Vec<String>,
}

/// Parses `sop.json` content. Never fails: each section that does not have
/// the expected shape is dropped with a warning.
pub fn parse_tool_config(content: &str) -> LoadedConfig {
    let mut loaded = LoadedConfig::default();

    let root: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            loaded.warnings.push(format!(
                "{} is not valid JSON ({}); using an empty configuration",
                CONFIG_FILE, e
            ));
            return loaded;
        }
    };
    let Some(root) = root.as_object() else {
        loaded.warnings.push(format!(
            "{} is not a JSON object; using an empty configuration",
            CONFIG_FILE
        ));
        return loaded;
    };

    if let Some(section) = root.get(DECLARATION_KEY) {
        match serde_json::from_value::<Declaration>(section.clone()) {
            Ok(declaration) => loaded.config.declaration = declaration,
            Err(e) => loaded.warnings.push(format!(
                "{}.{} is invalid ({}); declaring no servers",
                CONFIG_FILE, DECLARATION_KEY, e
            )),
        }
    }

    if let Some(section) = root.get("skills") {
        match serde_json::from_value::<Vec<SkillSpec>>(section.clone()) {
            Ok(skills) => loaded.config.skills = skills,
            Err(e) => loaded
                .warnings
                .push(format!("{}.skills is invalid ({}); skipping skills", CONFIG_FILE, e)),
        }
    }

    if let Some(section) = root.get("agents") {
        match serde_json::from_value::<Vec<AgentSpec>>(section.clone()) {
            Ok(agents) => loaded.config.agents = agents,
            Err(e) => loaded
                .warnings
                .push(format!("{}.agents is invalid ({}); skipping agents", CONFIG_FILE, e)),
        }
    }

    loaded
}

/// Loads `sop.json` from the source. A missing file is an empty configuration.
pub fn load_tool_config(source: &ConfigSource) -> Result<LoadedConfig, SopError> {
    let Some(bytes) = source.read_file(CONFIG_FILE)? else {
        return Ok(LoadedConfig::default());
    };
    match String::from_utf8(bytes) {
        Ok(content) => Ok(parse_tool_config(&content)),
        Err(_) => Ok(LoadedConfig {
            config: ToolConfig::default(),
            warnings: vec![format!(
                "{} is not valid UTF-8; using an empty configuration",
                CONFIG_FILE
            )],
        }),
    }
}
