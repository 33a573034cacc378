//! Human-readable rendering of a generate run.
//!
//! Lines are built once as plain text with a level, then styled with
//! `colored` for the terminal or emitted bare for the MCP server.

use crate::core::generate::GenerateOutcome;
use crate::core::reconcile::ReportKind;
use crate::core::scaffold::{SCAFFOLD_DIR, ScaffoldOutcome};
use crate::core::state_file::STATE_FILE;
use colored::Colorize;

/// Longest corrupt-file reason shown before it is cut.
const MAX_REASON_CHARS: usize = 160;
/// Names listed per line before collapsing into `(+N more)`.
const MAX_NAMES: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineLevel {
    Heading,
    Item,
    Warning,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub level: LineLevel,
    pub text: String,
}

impl OutputLine {
    fn new(level: LineLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn plain(&self) -> String {
        match self.level {
            LineLevel::Heading | LineLevel::Done => self.text.clone(),
            LineLevel::Item => format!("  {}", self.text),
            LineLevel::Warning => format!("warning: {}", self.text),
        }
    }

    pub fn styled(&self) -> String {
        match self.level {
            LineLevel::Heading => self.text.bold().to_string(),
            LineLevel::Item => format!("  {}", self.text),
            LineLevel::Warning => format!("{} {}", "warning:".yellow().bold(), self.text),
            LineLevel::Done => self.text.green().to_string(),
        }
    }
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Comma-joined names, at most `max_items` of them.
pub fn name_list(names: &[String], max_items: usize) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    let shown = names
        .iter()
        .take(max_items)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > max_items {
        format!("{} (+{} more)", shown, names.len() - max_items)
    } else {
        shown
    }
}

pub fn render_outcome(outcome: &GenerateOutcome) -> Vec<OutputLine> {
    let mut lines = Vec::new();

    match &outcome.scaffold {
        ScaffoldOutcome::Created { files } => {
            lines.push(OutputLine::new(
                LineLevel::Heading,
                format!(
                    "Generating {}/ in {} (from {})",
                    SCAFFOLD_DIR,
                    outcome.target_dir.display(),
                    outcome.source.describe()
                ),
            ));
            for file in files {
                lines.push(OutputLine::new(LineLevel::Item, file.as_str()));
            }
        }
        ScaffoldOutcome::Skipped => {
            lines.push(OutputLine::new(
                LineLevel::Heading,
                format!(
                    "{}/ already exists in {}; skipping scaffold",
                    SCAFFOLD_DIR,
                    outcome.target_dir.display()
                ),
            ));
        }
    }

    for warning in &outcome.warnings {
        lines.push(OutputLine::new(LineLevel::Warning, warning.as_str()));
    }

    let report = &outcome.report;
    if let Some(reason) = &report.corrupt_reason {
        lines.push(OutputLine::new(
            LineLevel::Warning,
            format!(
                "existing {} was invalid ({}); replacing",
                STATE_FILE,
                compact_line(reason, MAX_REASON_CHARS)
            ),
        ));
    }

    let verb = match report.kind {
        ReportKind::Created => "created",
        ReportKind::Replaced => "replaced",
        ReportKind::Updated => "updated",
    };
    lines.push(OutputLine::new(
        LineLevel::Heading,
        format!("{} {}", verb, STATE_FILE),
    ));
    lines.push(OutputLine::new(
        LineLevel::Item,
        format!("managed: {}", name_list(&report.currently_managed, MAX_NAMES)),
    ));
    if !report.preserved_manual.is_empty() {
        lines.push(OutputLine::new(
            LineLevel::Item,
            format!(
                "preserved manual: {}",
                name_list(&report.preserved_manual, MAX_NAMES)
            ),
        ));
    }
    if !report.removed_managed.is_empty() {
        lines.push(OutputLine::new(
            LineLevel::Item,
            format!(
                "removed managed: {}",
                name_list(&report.removed_managed, MAX_NAMES)
            ),
        ));
    }
    if !report.claimed.is_empty() {
        lines.push(OutputLine::new(
            LineLevel::Item,
            format!(
                "claimed: {} (manual entry now managed)",
                name_list(&report.claimed, MAX_NAMES)
            ),
        ));
    }

    lines.push(OutputLine::new(
        LineLevel::Done,
        format!("\nDone. {}/ is ready.", SCAFFOLD_DIR),
    ));
    lines
}

pub fn render_plain(outcome: &GenerateOutcome) -> String {
    render_outcome(outcome)
        .iter()
        .map(OutputLine::plain)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints to the terminal: warnings on stderr, everything else on stdout.
pub fn print_outcome(outcome: &GenerateOutcome) {
    for line in render_outcome(outcome) {
        match line.level {
            LineLevel::Warning => eprintln!("{}", line.styled()),
            _ => println!("{}", line.styled()),
        }
    }
}
