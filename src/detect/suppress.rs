//! Inline suppression of findings via comments.
//!
//! Supports suppression comments like:
//! - `// smellcheck:ignore <rule> - <reason>`
//! - `# smellcheck:ignore-next-line <rule> - <reason>`
//! - `/* smellcheck:ignore-file <rule> - <reason> */`
//!
//! `<rule>` is a rule id or `*` for every rule.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{code_lines, Finding};
use crate::source::SourceUnit;

/// File-level suppressions must appear within this many leading lines
/// unless only comments precede them.
const FILE_HEADER_LINES: usize = 10;

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Rule to suppress (e.g., "var-usage") or "*" for all
    pub rule: String,
    /// Human-readable reason
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Line of the directive (0 for file-level)
    pub line: usize,
    #[serde(rename = "type")]
    pub suppression_type: SuppressionType,
}

/// A finding that was suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressedFinding {
    pub finding: Finding,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    /// Directive at the start of a comment body, after any block-comment `*` gutter.
    static ref SUPPRESSION_PATTERN: Regex =
        Regex::new(r"^[\s*]*smellcheck:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?").unwrap();
}

/// Parse suppression directives from a source unit.
///
/// Only real comments count, as split by [`code_lines`] for the source's
/// language. Directive text inside string literals is never honored.
pub fn parse_suppressions(source: &SourceUnit) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut in_header = true;

    for line in code_lines(source) {
        // File-level suppressions are only honored in the leading comment block
        if in_header && line.has_code() {
            in_header = false;
        }

        let Some(caps) = line
            .comments
            .iter()
            .find_map(|comment| SUPPRESSION_PATTERN.captures(comment))
        else {
            continue;
        };
        let directive = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let rule = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let reason = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let suppression_type = match directive {
            "ignore-file" => {
                if !in_header && line.number > FILE_HEADER_LINES {
                    continue;
                }
                SuppressionType::File
            }
            "ignore-next-line" => SuppressionType::NextLine,
            // A directive alone on its line covers the next line; after code it covers its own.
            "ignore" if line.has_code() => SuppressionType::Line,
            "ignore" => SuppressionType::NextLine,
            _ => continue,
        };

        suppressions.push(Suppression {
            rule: rule.to_string(),
            reason,
            line: if suppression_type == SuppressionType::File {
                0
            } else {
                line.number
            },
            suppression_type,
        });
    }

    suppressions
}

/// Check if a finding matches a suppression.
pub fn matches_suppression(finding: &Finding, suppression: &Suppression) -> bool {
    if suppression.rule != "*" && suppression.rule != finding.category {
        return false;
    }

    match suppression.suppression_type {
        SuppressionType::File => true,
        SuppressionType::Line => finding.line == Some(suppression.line),
        SuppressionType::NextLine => finding.line == Some(suppression.line + 1),
    }
}

/// Separate findings into active and suppressed, preserving order.
///
/// Items carry an arbitrary tag (the pipeline uses the detector's
/// registration index) that travels with active findings.
pub fn filter_suppressed<T>(
    findings: Vec<(T, Finding)>,
    suppressions: &[Suppression],
) -> (Vec<(T, Finding)>, Vec<SuppressedFinding>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for (tag, finding) in findings {
        match suppressions.iter().find(|s| matches_suppression(&finding, s)) {
            Some(suppression) => suppressed.push(SuppressedFinding {
                finding,
                suppression: suppression.clone(),
            }),
            None => active.push((tag, finding)),
        }
    }

    (active, suppressed)
}
