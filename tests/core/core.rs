use serde_json::{Value, json};
use sop_engine::core::assets;
use sop_engine::core::config::{self, ConfigSource};
use sop_engine::core::generate::generate;
use sop_engine::core::reconcile::{
    Declaration, ManagedState, OWNER_TAG, Previous, ReportKind, ServiceDefinition, reconcile,
};
use sop_engine::core::scaffold::ScaffoldOutcome;
use sop_engine::core::state_file;
use std::fs;
use tempfile::tempdir;

fn declared(pairs: &[(&str, ServiceDefinition)]) -> Declaration {
    pairs
        .iter()
        .map(|(name, def)| (name.to_string(), def.clone()))
        .collect()
}

#[test]
fn bundled_template_declares_its_own_server() {
    let loaded = config::load_tool_config(&ConfigSource::Bundled).expect("bundled config");
    assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
    assert!(loaded.config.declaration.contains_key("sop-engine"));
    for skill in &loaded.config.skills {
        let path = format!("content/{}", skill.source);
        assert!(assets::get_template_file(&path).is_some(), "missing {path}");
    }
    for agent in &loaded.config.agents {
        let path = format!("content/{}", agent.source);
        assert!(assets::get_template_file(&path).is_some(), "missing {path}");
    }
}

#[test]
fn reconcile_scenario_from_persisted_state() {
    let prior = state_file::parse_state(
        r#"{
  "managedBy": "sop-engine",
  "managedServers": ["a", "b"],
  "mcpServers": {
    "a": { "command": "x" },
    "b": { "command": "y" },
    "c": { "command": "z", "env": { "TOKEN": "t" } }
  }
}"#,
    )
    .expect("valid state");

    let out = reconcile(
        Previous::State(prior),
        &declared(&[
            ("b", ServiceDefinition::new("y2")),
            ("d", ServiceDefinition::new("w").with_args(["--port", "9"])),
        ]),
    );

    let names: Vec<&str> = out.state.managed_names.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["b", "d"]);
    assert_eq!(out.state.entries.len(), 3);
    assert_eq!(out.state.entries["b"].command(), Some("y2"));
    assert_eq!(out.state.entries["c"].as_value()["env"]["TOKEN"], "t");
    assert_eq!(out.state.entries["d"].args(), vec!["--port", "9"]);
    assert_eq!(out.report.preserved_manual, vec!["c".to_string()]);
    assert_eq!(out.report.removed_managed, vec!["a".to_string()]);
    assert_eq!(
        out.report.currently_managed,
        vec!["b".to_string(), "d".to_string()]
    );
}

#[test]
fn empty_declaration_against_absent_creates_empty_state() {
    let out = reconcile(Previous::Absent, &Declaration::new());
    assert_eq!(out.report.kind, ReportKind::Created);
    assert_eq!(
        out.state,
        ManagedState {
            owner_tag: Some(OWNER_TAG.to_string()),
            ..ManagedState::default()
        }
    );
    let rendered: Value = serde_json::from_str(&state_file::render(&out.state).unwrap()).unwrap();
    assert_eq!(
        rendered,
        json!({ "managedBy": OWNER_TAG, "managedServers": [], "mcpServers": {} })
    );
}

#[test]
fn generate_with_bundled_template_end_to_end() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join(".mcp.json"),
        r#"{ "mcpServers": { "github": { "command": "github-mcp", "args": ["stdio"] } } }"#,
    )
    .expect("seed .mcp.json");

    let first = generate(tmp.path()).expect("first generate");
    let ScaffoldOutcome::Created { files } = &first.scaffold else {
        panic!("expected scaffold on first run");
    };
    for expected in [
        "hooks/engine.sh",
        "sop.json",
        "settings.json",
        "skills/sop-rules/SKILL.md",
        "agents/sop-reviewer.md",
    ] {
        assert!(files.iter().any(|f| f == expected), "{expected} not written");
        assert!(tmp.path().join(".claude").join(expected).is_file());
    }
    assert_eq!(first.report.kind, ReportKind::Updated);
    assert_eq!(first.report.preserved_manual, vec!["github".to_string()]);
    assert_eq!(first.report.currently_managed, vec!["sop-engine".to_string()]);

    let agent = fs::read_to_string(tmp.path().join(".claude/agents/sop-reviewer.md")).unwrap();
    assert!(agent.starts_with("---\nname: \"sop-reviewer\"\n"));
    assert!(agent.contains("tools: \"Read, Grep, Glob, Bash\"\n"));

    let bytes = fs::read(tmp.path().join(".mcp.json")).unwrap();
    let second = generate(tmp.path()).expect("second generate");
    assert_eq!(second.scaffold, ScaffoldOutcome::Skipped);
    assert_eq!(fs::read(tmp.path().join(".mcp.json")).unwrap(), bytes);
    assert_eq!(second.report.preserved_manual, vec!["github".to_string()]);
    assert!(second.report.newly_managed.is_empty());

    let state: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(state["mcpServers"]["github"]["args"], json!(["stdio"]));
    assert_eq!(state["mcpServers"]["sop-engine"]["command"], "sop-engine-mcp");
}

#[test]
fn project_override_replaces_bundled_template() {
    let tmp = tempdir().expect("tempdir");
    let override_dir = tmp.path().join(config::OVERRIDE_DIR);
    fs::create_dir_all(override_dir.join("hooks")).unwrap();
    fs::create_dir_all(override_dir.join("loggers")).unwrap();
    fs::write(override_dir.join("hooks/engine.sh"), "#!/bin/sh\n# custom\n").unwrap();
    fs::write(override_dir.join("loggers/quiet.sh"), "#!/bin/sh\n").unwrap();
    fs::write(
        override_dir.join("sop.json"),
        r#"{ "mcpServers": { "custom": { "command": "custom-mcp" } } }"#,
    )
    .unwrap();

    let outcome = generate(tmp.path()).expect("generate");

    let canonical_override = fs::canonicalize(tmp.path())
        .unwrap()
        .join(config::OVERRIDE_DIR);
    assert_eq!(outcome.source, ConfigSource::ProjectOverride(canonical_override));
    assert_eq!(
        fs::read_to_string(tmp.path().join(".claude/hooks/engine.sh")).unwrap(),
        "#!/bin/sh\n# custom\n"
    );
    assert!(tmp.path().join(".claude/loggers/quiet.sh").is_file());
    assert!(!tmp.path().join(".claude/validators").exists());
    assert_eq!(outcome.report.currently_managed, vec!["custom".to_string()]);
}
