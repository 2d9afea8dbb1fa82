//! Core types for detection results.

use serde::{Deserialize, Serialize};

use crate::source::Language;

/// Severity levels for findings, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Most severe first, the order renderers group by.
    pub const DESCENDING: [Severity; 3] = [Severity::Critical, Severity::Warning, Severity::Info];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Warnings and criticals are issues; infos are improvement suggestions.
    pub fn is_issue(&self) -> bool {
        *self >= Severity::Warning
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Static description of one rule in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    /// Stable rule id, e.g. `loose-equality`.
    pub id: &'static str,
    /// PascalCase name used by SARIF consumers.
    pub name: &'static str,
    pub description: &'static str,
    pub languages: &'static [Language],
    pub default_severity: Severity,
    /// Default remediation advice attached to each finding.
    pub suggestion: &'static str,
}

impl RuleMeta {
    pub fn applies_to(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }
}

/// Rule id used for findings synthesized from a failing detector.
pub const DETECTOR_FAILED: &str = "detector-failed";

/// A single detected issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    /// 1-based line, `None` for whole-file findings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    /// Finding at a line with the rule's default severity and suggestion.
    pub fn at_line(rule: &RuleMeta, line: usize, message: impl Into<String>) -> Self {
        Self::build(rule, Some(line), message.into())
    }

    /// Whole-file finding with the rule's default severity and suggestion.
    pub fn whole_file(rule: &RuleMeta, message: impl Into<String>) -> Self {
        Self::build(rule, None, message.into())
    }

    fn build(rule: &RuleMeta, line: Option<usize>, message: String) -> Self {
        Self {
            category: rule.id.to_string(),
            line,
            message,
            severity: rule.default_severity,
            suggestion: (!rule.suggestion.is_empty()).then(|| rule.suggestion.to_string()),
        }
    }

    /// Finding reported in place of a detector that errored or panicked.
    pub fn detector_failed(rule_id: &str, reason: &str) -> Self {
        Self {
            category: DETECTOR_FAILED.to_string(),
            line: None,
            message: format!("detector '{}' failed: {}", rule_id, reason),
            severity: Severity::Info,
            suggestion: None,
        }
    }

    /// Replace the suggestion with a more specific one.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}
