//! Detection rules for code smells.
//!
//! Every rule is a value implementing [`Detector`]. Rules are grouped by
//! concern into submodules and collected, in a fixed order, by
//! [`Registry::builtin`].

mod debugging;
mod errors;
mod lexical;
mod registry;
mod security;
mod style;
mod suppress;
mod todos;
mod types;
mod typing;

use crate::source::SourceUnit;

pub use debugging::ConsoleLog;
pub use errors::{AwaitOutsideAsync, BadErrorHandling, MissingErrorHandling};
pub use lexical::{code_lines, is_string_literal, CodeLine};
pub use registry::{default_registry, Registration, Registry};
pub use security::{EvalUsage, InnerHtmlXss};
pub use style::{GlobalUsage, LongFile, LooseEquality, VarUsage, DEFAULT_MAX_FILE_LINES};
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, SuppressedFinding, Suppression,
    SuppressionType,
};
pub use todos::TodoComment;
pub use types::{Finding, RuleMeta, Severity, DETECTOR_FAILED};
pub use typing::{AnyType, MissingTypeHint};

/// A single-purpose scan rule.
///
/// Implementations must be pure: the same source always yields the same
/// findings, and nothing is written to shared state.
pub trait Detector: Send + Sync {
    /// Catalogue entry for this rule.
    fn rule(&self) -> &'static RuleMeta;

    /// Scan the source and return findings in emission order.
    ///
    /// "No match" is an empty vector. An `Err` is reported by the pipeline
    /// as a `detector-failed` finding instead of aborting analysis.
    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>>;
}

/// Catalogue entries for all built-in rules, in registration order.
pub fn builtin_rules() -> Vec<&'static RuleMeta> {
    vec![
        &security::EVAL_USAGE,
        &security::INNERHTML_XSS,
        &style::VAR_USAGE,
        &style::LOOSE_EQUALITY,
        &typing::ANY_TYPE,
        &errors::BAD_ERROR_HANDLING,
        &errors::MISSING_ERROR_HANDLING,
        &errors::AWAIT_OUTSIDE_ASYNC,
        &debugging::CONSOLE_LOG,
        &typing::MISSING_TYPE_HINT,
        &style::GLOBAL_USAGE,
        &todos::TODO_COMMENT,
        &style::LONG_FILE,
    ]
}

/// Look up a built-in rule by id.
pub fn find_rule(id: &str) -> Option<&'static RuleMeta> {
    builtin_rules().into_iter().find(|r| r.id == id)
}

/// Run a per-line predicate over the code part of each line.
///
/// Comment-only lines are skipped. The closure returns the message for a
/// match, producing at most one finding per line.
pub(crate) fn scan_code_lines<F>(source: &SourceUnit, rule: &RuleMeta, mut check: F) -> Vec<Finding>
where
    F: FnMut(&CodeLine<'_>) -> Option<String>,
{
    code_lines(source)
        .iter()
        .filter(|l| l.has_code())
        .filter_map(|l| check(l).map(|msg| Finding::at_line(rule, l.number, msg)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique() {
        let rules = builtin_rules();
        let ids: HashSet<_> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), rules.len());
        assert!(!ids.contains(DETECTOR_FAILED));
    }

    #[test]
    fn test_builtin_rules_match_registry_order() {
        let registry = Registry::builtin();
        let from_registry: Vec<_> = registry.rules().map(|r| r.id).collect();
        let from_catalogue: Vec<_> = builtin_rules().iter().map(|r| r.id).collect();
        assert_eq!(from_registry, from_catalogue);
    }

    #[test]
    fn test_find_rule() {
        assert_eq!(find_rule("var-usage").map(|r| r.id), Some("var-usage"));
        assert!(find_rule("nope").is_none());
    }
}
