//! Loading and persisting `.mcp.json`.
//!
//! Classification of what is on disk happens here so that
//! [`crate::core::reconcile`] stays pure:
//!
//! - no file: [`Previous::Absent`]
//! - bytes that are not UTF-8 JSON, a top level that is not an object, or an
//!   `mcpServers` that is not an object: [`Previous::Corrupt`] (replaced on
//!   save, with a warning)
//! - anything else: [`Previous::State`]. A null or malformed `managedServers`
//!   or `managedBy` is read as missing, so every entry counts as manual.
//!
//! Writes overwrite the file in place. There is no temp-file-and-rename step
//! and no lock; a crash mid-write leaves a file the next run treats as corrupt,
//! and two concurrent invocations on the same project may race.

use crate::core::error::SopError;
use crate::core::reconcile::{ManagedState, Previous};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Location of the state file relative to the target project root.
pub const STATE_FILE: &str = ".mcp.json";

pub fn state_path(target_dir: &Path) -> PathBuf {
    target_dir.join(STATE_FILE)
}

const OWNER_KEY: &str = "managedBy";
const MANAGED_KEY: &str = "managedServers";
const SERVERS_KEY: &str = "mcpServers";

fn is_name_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|names| names.iter().all(Value::is_string))
}

/// Parses state file content, returning a human-readable reason on failure.
pub fn parse_state(content: &str) -> Result<ManagedState, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let Value::Object(mut doc) = value else {
        return Err("top-level value is not a JSON object".to_string());
    };

    match doc.get(SERVERS_KEY) {
        None | Some(Value::Object(_)) => {}
        Some(Value::Null) => {
            doc.remove(SERVERS_KEY);
        }
        Some(_) => return Err(format!("{} is not a JSON object", SERVERS_KEY)),
    }
    // Ownership keys are ours; a bad value loses ownership, never entries.
    if !doc.get(MANAGED_KEY).is_some_and(is_name_list) {
        doc.remove(MANAGED_KEY);
    }
    if !doc.get(OWNER_KEY).is_some_and(Value::is_string) {
        doc.remove(OWNER_KEY);
    }

    serde_json::from_value(Value::Object(doc)).map_err(|e| e.to_string())
}

pub fn load(path: &Path) -> Result<Previous, SopError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Previous::Absent),
        Err(e) => return Err(SopError::at(path)(e)),
    };

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            return Ok(Previous::Corrupt {
                reason: format!("not valid UTF-8: {}", e.utf8_error()),
            });
        }
    };

    Ok(match parse_state(&content) {
        Ok(state) => Previous::State(state),
        Err(reason) => Previous::Corrupt { reason },
    })
}

pub fn render(state: &ManagedState) -> Result<String, SopError> {
    let mut out = serde_json::to_string_pretty(state)?;
    out.push('\n');
    Ok(out)
}

pub fn save(path: &Path, state: &ManagedState) -> Result<(), SopError> {
    let content = render(state)?;
    fs::write(path, content).map_err(SopError::at(path))
}
