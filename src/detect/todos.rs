//! TODO/FIXME comment detection.
//!
//! Every marker is reported. Markers that carry specific context read as
//! follow-ups; hollow ones (`// TODO`, `# FIXME: fix this`) get a sharper
//! message asking for the missing detail.

use lazy_static::lazy_static;
use regex::Regex;

use super::{code_lines, Detector, Finding, RuleMeta, Severity};
use crate::source::{Language, SourceUnit};

pub(super) const TODO_COMMENT: RuleMeta = RuleMeta {
    id: "todo-comment",
    name: "TodoComment",
    description: "TODO/FIXME markers in comments",
    languages: &Language::ALL,
    default_severity: Severity::Info,
    suggestion: "Resolve the follow-up or track it in an issue",
};

lazy_static! {
    /// Pattern to match TODO/FIXME markers
    static ref TODO_PATTERN: Regex = Regex::new(r"(?i)\b(TODO|FIXME)\b\s*(?:\([^)]*\))?\s*:?\s*(.*)").unwrap();

    /// Generic placeholder text that says nothing about the work left.
    static ref HOLLOW_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^(implement|finish|complete|write|add)(\s+(this|here|later|it|the\s+\w+))?$").unwrap(),
        Regex::new(r"(?i)^fix(\s+(this|it|later|me|bug|the\s+\w+))?$").unwrap(),
        Regex::new(r"(?i)^(handle|do)(\s+(this|it|something|later|errors?))?$").unwrap(),
        Regex::new(r"(?i)^(placeholder|stub|tbd|wip|later)$").unwrap(),
        Regex::new(r"(?i)^not\s+implemented(\s+yet)?$").unwrap(),
        Regex::new(r"(?i)^(change|update|refactor|clean\s*up|remove|delete)\s+(this|me|later)$").unwrap(),
    ];
}

/// Check if a marker's text lacks meaningful context.
fn is_hollow_todo(content: &str) -> bool {
    let trimmed = content.trim().trim_end_matches(['.', '!']);
    trimmed.is_empty() || HOLLOW_PATTERNS.iter().any(|p| p.is_match(trimmed))
}

/// Flags TODO/FIXME markers inside comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct TodoComment;

impl Detector for TodoComment {
    fn rule(&self) -> &'static RuleMeta {
        &TODO_COMMENT
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for line in code_lines(source) {
            let Some(caps) = line.comments.iter().find_map(|c| TODO_PATTERN.captures(c)) else {
                continue;
            };
            let marker = caps[1].to_uppercase();
            let content = caps[2].trim().trim_end_matches("*/").trim();

            let finding = if content.is_empty() {
                Finding::at_line(&TODO_COMMENT, line.number, format!("{} marker without context", marker))
                    .with_suggestion("Describe the concrete follow-up or link an issue")
            } else if is_hollow_todo(content) {
                Finding::at_line(
                    &TODO_COMMENT,
                    line.number,
                    format!("{} with vague context: {:?}", marker, content),
                )
                .with_suggestion("Describe the concrete follow-up or link an issue")
            } else {
                Finding::at_line(&TODO_COMMENT, line.number, format!("{}: {}", marker, content))
            };
            findings.push(finding);
        }

        Ok(findings)
    }
}
