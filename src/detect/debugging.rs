//! Debugging leftovers.

use lazy_static::lazy_static;
use regex::Regex;

use super::{scan_code_lines, Detector, Finding, RuleMeta, Severity};
use crate::source::{Language, SourceUnit};

pub(super) const CONSOLE_LOG: RuleMeta = RuleMeta {
    id: "console-log",
    name: "ConsoleLog",
    description: "Debug print calls (console.log in JS/TS, print() in Python)",
    languages: &Language::ALL,
    default_severity: Severity::Info,
    suggestion: "Use a proper logging library or remove in production",
};

lazy_static! {
    static ref JS_DEBUG_PRINT: Regex =
        Regex::new(r"\bconsole\.(log|debug|trace|dir)\s*\(").unwrap();
    static ref PY_DEBUG_PRINT: Regex = Regex::new(r"(?:^|[^\w.])print\s*\(").unwrap();
}

/// Flags debug-print calls left in code.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl Detector for ConsoleLog {
    fn rule(&self) -> &'static RuleMeta {
        &CONSOLE_LOG
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        if source.language() == Language::Python {
            return Ok(scan_code_lines(source, &CONSOLE_LOG, |line| {
                PY_DEBUG_PRINT
                    .is_match(&line.code)
                    .then(|| "print() used instead of logging".to_string())
            })
            .into_iter()
            .map(|f| f.with_suggestion("Consider using the logging module for production code"))
            .collect());
        }

        Ok(scan_code_lines(source, &CONSOLE_LOG, |line| {
            JS_DEBUG_PRINT
                .captures(&line.code)
                .map(|caps| format!("console.{}() left in code", &caps[1]))
        }))
    }
}
