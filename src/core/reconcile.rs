//! Reconciliation of tool-managed MCP server entries.
//!
//! `.mcp.json` is shared between this tool and humans. The tool records which
//! server names it owns (`managedServers`); everything else in `mcpServers` is
//! a manual entry. Reconciling a new [`Declaration`] against the previous
//! state:
//!
//! - keeps every manual entry the declaration does not name, verbatim
//! - drops every previously managed entry the declaration no longer names
//! - writes every declared entry, overwriting whatever sat at that name
//!
//! This module is pure: no I/O, no clock, no environment. Loading and
//! persisting the state file lives in [`crate::core::state_file`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Owner tag written into every state file this tool produces.
pub const OWNER_TAG: &str = "sop-engine";

/// One MCP server definition.
///
/// The content is opaque to reconciliation: unknown fields survive a
/// load/reconcile/save cycle untouched. The accessors exist for display and
/// for building definitions in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceDefinition(Value);

impl ServiceDefinition {
    pub fn new(command: impl Into<String>) -> Self {
        Self(json!({ "command": command.into() }))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<Value> = args.into_iter().map(|a| Value::String(a.into())).collect();
        if let Some(obj) = self.0.as_object_mut() {
            obj.insert("args".to_string(), Value::Array(args));
        }
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(obj) = self.0.as_object_mut() {
            let env = obj
                .entry("env")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(env) = env.as_object_mut() {
                env.insert(key.into(), Value::String(value.into()));
            }
        }
        self
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn command(&self) -> Option<&str> {
        self.0.get("command").and_then(Value::as_str)
    }

    pub fn args(&self) -> Vec<&str> {
        self.0
            .get("args")
            .and_then(Value::as_array)
            .map(|args| args.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn env(&self) -> Option<&Map<String, Value>> {
        self.0.get("env").and_then(Value::as_object)
    }
}

/// What the tool wants to manage on this run, keyed by server name.
pub type Declaration = BTreeMap<String, ServiceDefinition>;

/// The persisted shape of `.mcp.json`.
///
/// A file written before this tool existed has no `managedBy` and no
/// `managedServers`; it deserializes with an empty managed set, so every
/// entry in it counts as manual.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManagedState {
    #[serde(rename = "managedBy", default, skip_serializing_if = "Option::is_none")]
    pub owner_tag: Option<String>,
    #[serde(rename = "managedServers", default)]
    pub managed_names: BTreeSet<String>,
    #[serde(rename = "mcpServers", default)]
    pub entries: BTreeMap<String, ServiceDefinition>,
    /// Top-level keys this tool does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManagedState {
    /// Entries present in the file that this tool does not own.
    pub fn manual_names(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .filter(|name| !self.managed_names.contains(*name))
            .cloned()
            .collect()
    }
}

/// Prior state handed to [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub enum Previous {
    /// No state file exists yet.
    Absent,
    /// A state file exists but could not be parsed; it is replaced.
    Corrupt { reason: String },
    State(ManagedState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Created,
    Replaced,
    Updated,
}

/// Name-level diff of a reconciliation, all lists sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub kind: ReportKind,
    /// Set when the previous file was unparseable and has been replaced.
    pub corrupt_reason: Option<String>,
    pub currently_managed: Vec<String>,
    pub newly_managed: Vec<String>,
    pub preserved_manual: Vec<String>,
    pub removed_managed: Vec<String>,
    /// Manual entries whose name is now declared, and which therefore became managed.
    pub claimed: Vec<String>,
}

impl ReconcileReport {
    pub fn replaced_corrupt(&self) -> bool {
        self.corrupt_reason.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub state: ManagedState,
    pub report: ReconcileReport,
}

/// Applies `declared` on top of `base`. On a name collision the declared value wins.
pub fn overlay(
    mut base: BTreeMap<String, ServiceDefinition>,
    declared: &Declaration,
) -> BTreeMap<String, ServiceDefinition> {
    for (name, definition) in declared {
        base.insert(name.clone(), definition.clone());
    }
    base
}

pub fn reconcile(previous: Previous, declared: &Declaration) -> Reconciliation {
    match previous {
        Previous::Absent => bootstrap(declared, ReportKind::Created, None),
        Previous::Corrupt { reason } => bootstrap(declared, ReportKind::Replaced, Some(reason)),
        Previous::State(prior) => merge(prior, declared),
    }
}

fn bootstrap(
    declared: &Declaration,
    kind: ReportKind,
    corrupt_reason: Option<String>,
) -> Reconciliation {
    let managed: Vec<String> = declared.keys().cloned().collect();
    Reconciliation {
        state: ManagedState {
            owner_tag: Some(OWNER_TAG.to_string()),
            managed_names: declared.keys().cloned().collect(),
            entries: declared.clone(),
            extra: Map::new(),
        },
        report: ReconcileReport {
            kind,
            corrupt_reason,
            currently_managed: managed.clone(),
            newly_managed: managed,
            preserved_manual: Vec::new(),
            removed_managed: Vec::new(),
            claimed: Vec::new(),
        },
    }
}

fn merge(prior: ManagedState, declared: &Declaration) -> Reconciliation {
    let ManagedState {
        managed_names: prior_managed,
        entries,
        extra,
        ..
    } = prior;

    let manual: BTreeMap<String, ServiceDefinition> = entries
        .into_iter()
        .filter(|(name, _)| !prior_managed.contains(name))
        .collect();
    let claimed: Vec<String> = manual
        .keys()
        .filter(|name| declared.contains_key(*name))
        .cloned()
        .collect();

    let merged = overlay(manual, declared);
    let managed_names: BTreeSet<String> = declared.keys().cloned().collect();

    let report = ReconcileReport {
        kind: ReportKind::Updated,
        corrupt_reason: None,
        currently_managed: managed_names.iter().cloned().collect(),
        newly_managed: managed_names.difference(&prior_managed).cloned().collect(),
        preserved_manual: merged
            .keys()
            .filter(|name| !declared.contains_key(*name))
            .cloned()
            .collect(),
        removed_managed: prior_managed.difference(&managed_names).cloned().collect(),
        claimed,
    };

    Reconciliation {
        state: ManagedState {
            owner_tag: Some(OWNER_TAG.to_string()),
            managed_names,
            entries: merged,
            extra,
        },
        report,
    }
}
