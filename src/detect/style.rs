//! Style smells: legacy declarations, loose comparisons, globals and oversized files.

use lazy_static::lazy_static;
use regex::Regex;

use super::{scan_code_lines, Detector, Finding, RuleMeta, Severity};
use crate::source::{Language, SourceUnit};

/// Default line limit for the long-file rule.
pub const DEFAULT_MAX_FILE_LINES: usize = 100;

pub(super) const VAR_USAGE: RuleMeta = RuleMeta {
    id: "var-usage",
    name: "VarUsage",
    description: "Function-scoped 'var' declarations",
    languages: Language::JS_FAMILY,
    default_severity: Severity::Warning,
    suggestion: "Use 'let' for mutable variables, 'const' for immutable",
};

pub(super) const LOOSE_EQUALITY: RuleMeta = RuleMeta {
    id: "loose-equality",
    name: "LooseEquality",
    description: "Type-coercing == and != comparisons",
    languages: Language::JS_FAMILY,
    default_severity: Severity::Warning,
    suggestion: "Use strict equality (===/!==) for predictable comparisons",
};

pub(super) const GLOBAL_USAGE: RuleMeta = RuleMeta {
    id: "global-usage",
    name: "GlobalUsage",
    description: "Module state mutated through 'global' statements",
    languages: &[Language::Python],
    default_severity: Severity::Info,
    suggestion: "Pass values as parameters or keep state on a class instance",
};

pub(super) const LONG_FILE: RuleMeta = RuleMeta {
    id: "long-file",
    name: "LongFile",
    description: "Files longer than the configured line limit",
    languages: &Language::ALL,
    default_severity: Severity::Info,
    suggestion: "File is quite long - consider splitting into modules",
};

lazy_static! {
    static ref VAR_DECL: Regex = Regex::new(r"(?:^|[^\w$.])var\s+[A-Za-z_$\[{]").unwrap();
    static ref GLOBAL_STMT: Regex = Regex::new(r"^\s*global\s+\w").unwrap();
}

/// Flags `var` declarations.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarUsage;

impl Detector for VarUsage {
    fn rule(&self) -> &'static RuleMeta {
        &VAR_USAGE
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        Ok(scan_code_lines(source, &VAR_USAGE, |line| {
            VAR_DECL
                .is_match(&line.code)
                .then(|| "'var' declaration instead of 'let' or 'const'".to_string())
        }))
    }
}

/// Flags `==`/`!=` that aren't part of `===`/`!==`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LooseEquality;

impl Detector for LooseEquality {
    fn rule(&self) -> &'static RuleMeta {
        &LOOSE_EQUALITY
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        Ok(scan_code_lines(source, &LOOSE_EQUALITY, |line| {
            find_loose_operator(&line.code)
                .map(|op| format!("loose equality '{}' coerces types before comparing", op))
        }))
    }
}

/// Return the first loose equality operator in a line of code.
fn find_loose_operator(code: &str) -> Option<&'static str> {
    let b = code.as_bytes();
    for i in 0..b.len().saturating_sub(1) {
        let op = match (b[i], b[i + 1]) {
            (b'=', b'=') => "==",
            (b'!', b'=') => "!=",
            _ => continue,
        };
        let extended = b.get(i + 2) == Some(&b'=');
        let prefixed = i > 0 && matches!(b[i - 1], b'=' | b'!' | b'<' | b'>');
        if !extended && !prefixed {
            return Some(op);
        }
    }
    None
}

/// Flags Python `global` statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalUsage;

impl Detector for GlobalUsage {
    fn rule(&self) -> &'static RuleMeta {
        &GLOBAL_USAGE
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        Ok(scan_code_lines(source, &GLOBAL_USAGE, |line| {
            GLOBAL_STMT
                .is_match(&line.code)
                .then(|| format!("global statement: {}", line.code.trim()))
        }))
    }
}

/// Whole-file rule: the file exceeds a line limit.
#[derive(Debug, Clone, Copy)]
pub struct LongFile {
    max_lines: usize,
}

impl LongFile {
    pub fn new(max_lines: usize) -> Self {
        Self { max_lines }
    }
}

impl Default for LongFile {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_LINES)
    }
}

impl Detector for LongFile {
    fn rule(&self) -> &'static RuleMeta {
        &LONG_FILE
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        if source.scan_text().is_none() || source.line_count() <= self.max_lines {
            return Ok(Vec::new());
        }
        Ok(vec![Finding::whole_file(
            &LONG_FILE,
            format!(
                "file has {} lines (limit {})",
                source.line_count(),
                self.max_lines
            ),
        )])
    }
}
