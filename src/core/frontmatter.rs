//! Front-matter assembly for generated skill and agent files.

use crate::core::config::{AgentSpec, SkillSpec};
use crate::core::error::SopError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Skill and agent names become path components, so they must be plain slugs.
pub fn validate_name(kind: &str, name: &str) -> Result<(), SopError> {
    if SLUG.is_match(name) && !name.contains("..") {
        Ok(())
    } else {
        Err(SopError::ValidationError(format!(
            "invalid {} name {:?}: use letters, digits, '.', '_' or '-'",
            kind, name
        )))
    }
}

/// Double-quotes a front-matter value. JSON string escapes are valid inside
/// YAML double-quoted scalars, so colons, hashes, quotes and newlines survive.
pub fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

pub fn with_front_matter(fields: &[(&str, &str)], body: &str) -> String {
    let mut out = String::from("---\n");
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&quote(value));
        out.push('\n');
    }
    out.push_str("---\n\n");
    out.push_str(body);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

pub fn skill_document(spec: &SkillSpec, body: &str) -> String {
    with_front_matter(
        &[("name", spec.name.as_str()), ("description", spec.description.as_str())],
        body,
    )
}

pub fn agent_document(spec: &AgentSpec, body: &str) -> String {
    let mut fields = vec![("name", spec.name.as_str()), ("description", spec.description.as_str())];
    if let Some(tools) = &spec.tools {
        fields.push(("tools", tools.as_str()));
    }
    if let Some(model) = &spec.model {
        fields.push(("model", model.as_str()));
    }
    with_front_matter(&fields, body)
}
