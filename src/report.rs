//! The structured result of analyzing one source unit.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::detect::{Finding, Severity, SuppressedFinding};
use crate::source::{Language, SourceUnit};

/// Finding tallies per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut counts = Self::default();
        for f in findings {
            counts.add(f.severity);
        }
        counts
    }

    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.info
    }

    /// Warning and critical findings.
    pub fn issues(&self) -> usize {
        self.critical + self.warning
    }

    pub fn merge(&mut self, other: &SeverityCounts) {
        self.critical += other.critical;
        self.warning += other.warning;
        self.info += other.info;
    }
}

/// Rough structural counts of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub functions: usize,
    pub classes: usize,
    pub imports: usize,
    /// Only meaningful for JavaScript/TypeScript modules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<usize>,
}

lazy_static! {
    static ref PY_FUNCTION: Regex = Regex::new(r"(?m)^\s*(?:async\s+)?def\s+\w+").unwrap();
    static ref PY_IMPORT: Regex = Regex::new(r"(?m)^(?:import|from)\s+").unwrap();
    static ref JS_FUNCTION: Regex =
        Regex::new(r"function\s+\w+|(?:const|let|var)\s+\w+\s*=\s*(?:async\s*)?(?:\([^)]*\)|\w+)\s*=>").unwrap();
    static ref JS_IMPORT: Regex =
        Regex::new(r"(?m)^\s*import\s+|^\s*(?:const|let|var)\s+\w+\s*=\s*require\s*\(").unwrap();
    static ref JS_EXPORT: Regex = Regex::new(r"(?m)^\s*export\s+").unwrap();
    static ref CLASS: Regex = Regex::new(r"(?m)^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+\w+").unwrap();
}

impl Structure {
    /// Count functions, classes and imports with language-specific patterns.
    pub fn measure(source: &SourceUnit) -> Self {
        let Some(text) = source.scan_text() else {
            return Self::default();
        };

        match source.language() {
            Language::Python => Self {
                functions: PY_FUNCTION.find_iter(text).count(),
                classes: CLASS.find_iter(text).count(),
                imports: PY_IMPORT.find_iter(text).count(),
                exports: None,
            },
            Language::JavaScript | Language::TypeScript => Self {
                functions: JS_FUNCTION.find_iter(text).count(),
                classes: CLASS.find_iter(text).count(),
                imports: JS_IMPORT.find_iter(text).count(),
                exports: Some(JS_EXPORT.find_iter(text).count()),
            },
        }
    }
}

/// Statistics attached to every report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub line_count: usize,
    pub detector_count_run: usize,
    pub finding_count_by_severity: SeverityCounts,
    pub suppressed_count: usize,
    pub structure: Structure,
}

/// Ordered findings for one source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub source_id: String,
    pub language: Language,
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedFinding>,
    pub stats: Stats,
}

impl Report {
    /// True when no active findings remain.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings of one severity, in report order.
    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Highest severity among active findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Whether any finding is at or above the given severity.
    pub fn has_findings_at_or_above(&self, severity: Severity) -> bool {
        self.max_severity().is_some_and(|s| s >= severity)
    }

    /// One-line summary of the findings.
    pub fn summary(&self) -> String {
        summarize(&self.stats.finding_count_by_severity)
    }
}

/// Summary wording shared by single reports and batch totals.
pub fn summarize(counts: &SeverityCounts) -> String {
    let issues = counts.issues();
    let suggestions = counts.info;

    if issues == 0 && suggestions == 0 {
        return "Code looks clean! No major issues found.".to_string();
    }

    let mut parts = Vec::new();
    if issues > 0 {
        parts.push(format!("Found {} issue(s)", issues));
    }
    if suggestions > 0 {
        parts.push(format!("{} improvement suggestion(s)", suggestions));
    }
    parts.join(", ")
}
