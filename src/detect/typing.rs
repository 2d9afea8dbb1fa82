//! Type annotation rules: TypeScript `any` and unannotated Python functions.

use lazy_static::lazy_static;
use regex::Regex;

use super::{code_lines, scan_code_lines, Detector, Finding, RuleMeta, Severity};
use crate::source::{Language, SourceUnit};

pub(super) const ANY_TYPE: RuleMeta = RuleMeta {
    id: "any-type",
    name: "AnyType",
    description: "Annotations or casts using the untyped 'any' escape hatch",
    languages: &[Language::TypeScript],
    default_severity: Severity::Warning,
    suggestion: "Consider adding specific types instead of 'any'",
};

pub(super) const MISSING_TYPE_HINT: RuleMeta = RuleMeta {
    id: "missing-type-hint",
    name: "MissingTypeHint",
    description: "Function definitions without parameter or return annotations",
    languages: &[Language::Python],
    default_severity: Severity::Info,
    suggestion: "Consider adding type hints for better code clarity",
};

/// Signatures spanning more lines than this are not reassembled.
const MAX_SIGNATURE_LINES: usize = 20;

lazy_static! {
    static ref ANY_ANNOTATION: Regex =
        Regex::new(r"(?::\s*any\b|\bas\s+any\b|[<,]\s*any\s*[,>]|\bany\[\])").unwrap();

    static ref DEF_START: Regex = Regex::new(r"^\s*(?:async\s+)?def\s+(\w+)\s*\(").unwrap();

    /// Parameter list and optional return annotation of a complete signature.
    static ref DEF_SIGNATURE: Regex =
        Regex::new(r"(?s)^\s*(?:async\s+)?def\s+\w+\s*\((.*)\)\s*(->\s*[^:]+?)?\s*:\s*(?:#.*)?$").unwrap();
}

/// Flags `any` annotations and casts in TypeScript.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyType;

impl Detector for AnyType {
    fn rule(&self) -> &'static RuleMeta {
        &ANY_TYPE
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        Ok(scan_code_lines(source, &ANY_TYPE, |line| {
            match ANY_ANNOTATION.find_iter(&line.code).count() {
                0 => None,
                1 => Some("type annotated as 'any'".to_string()),
                n => Some(format!("type annotated as 'any' ({} occurrences)", n)),
            }
        }))
    }
}

/// Flags Python functions whose parameters or return type lack annotations.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingTypeHint;

impl Detector for MissingTypeHint {
    fn rule(&self) -> &'static RuleMeta {
        &MISSING_TYPE_HINT
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        let lines = code_lines(source);
        let mut findings = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let Some(caps) = DEF_START.captures(&line.code) else {
                continue;
            };
            let name = &caps[1];

            let Some(signature) = join_signature(&lines[idx..]) else {
                continue;
            };
            let Some(sig) = DEF_SIGNATURE.captures(&signature) else {
                continue;
            };

            let untyped = unannotated_params(&sig[1]);
            let missing_return = sig.get(2).is_none();
            if untyped.is_empty() && !missing_return {
                continue;
            }

            let mut missing = Vec::new();
            if !untyped.is_empty() {
                missing.push(format!("parameters: {}", untyped.join(", ")));
            }
            if missing_return {
                missing.push("return".to_string());
            }
            findings.push(Finding::at_line(
                &MISSING_TYPE_HINT,
                line.number,
                format!("function '{}' is missing type hints ({})", name, missing.join("; ")),
            ));
        }

        Ok(findings)
    }
}

/// Join the code of consecutive lines until the signature's closing colon.
fn join_signature(lines: &[super::CodeLine<'_>]) -> Option<String> {
    let mut joined = String::new();
    let mut depth: i32 = 0;

    for line in lines.iter().take(MAX_SIGNATURE_LINES) {
        let code = line.code.trim_end();
        if !joined.is_empty() {
            joined.push(' ');
        }
        joined.push_str(code);
        for c in code.chars() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        if depth <= 0 && code.ends_with(':') {
            return Some(joined);
        }
    }
    None
}

/// Names of parameters without an annotation, ignoring `self`, `cls` and markers.
fn unannotated_params(params: &str) -> Vec<String> {
    split_top_level(params)
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "*" && *p != "/")
        .filter_map(|p| {
            let head = p.split('=').next().unwrap_or(p).trim();
            if head.contains(':') {
                return None;
            }
            let name = head.trim_start_matches('*');
            if name == "self" || name == "cls" {
                return None;
            }
            Some(name.to_string())
        })
        .collect()
}

/// Split a parameter list on commas that aren't nested in brackets.
fn split_top_level(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in params.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&params[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&params[start..]);
    parts
}
