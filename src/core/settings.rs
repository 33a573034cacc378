//! Generation of `.claude/settings.json`.
//!
//! Every lifecycle event is routed to the same handler, `hooks/engine.sh`,
//! which dispatches to loggers and validators itself.

use crate::core::error::SopError;
use serde_json::{Map, Value, json};

pub const LIFECYCLE_EVENTS: &[&str] = &[
    "PreToolUse",
    "PostToolUse",
    "UserPromptSubmit",
    "Notification",
    "Stop",
    "SubagentStop",
    "PreCompact",
    "SessionStart",
    "SessionEnd",
];

/// Events that carry a tool name and therefore take a matcher.
const TOOL_EVENTS: &[&str] = &["PreToolUse", "PostToolUse"];

pub const HOOK_COMMAND: &str = "$CLAUDE_PROJECT_DIR/.claude/hooks/engine.sh";

pub fn settings_document() -> Value {
    let mut hooks = Map::new();
    for event in LIFECYCLE_EVENTS {
        let mut group = json!({
            "hooks": [{ "type": "command", "command": HOOK_COMMAND }]
        });
        if TOOL_EVENTS.contains(event) {
            group["matcher"] = json!("*");
        }
        hooks.insert(event.to_string(), Value::Array(vec![group]));
    }
    json!({ "hooks": hooks })
}

pub fn render_settings() -> Result<String, SopError> {
    let mut out = serde_json::to_string_pretty(&settings_document())?;
    out.push('\n');
    Ok(out)
}
