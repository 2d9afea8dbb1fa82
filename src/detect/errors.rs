//! Error handling rules: swallowed errors, unguarded I/O and stray `await`.

use lazy_static::lazy_static;
use regex::Regex;

use super::{code_lines, scan_code_lines, Detector, Finding, RuleMeta, Severity};
use crate::source::{Language, SourceUnit};

pub(super) const BAD_ERROR_HANDLING: RuleMeta = RuleMeta {
    id: "bad-error-handling",
    name: "BadErrorHandling",
    description: "Bare except clauses and empty catch blocks that swallow errors",
    languages: &Language::ALL,
    default_severity: Severity::Warning,
    suggestion: "Catch specific exception types and handle or re-raise them",
};

pub(super) const MISSING_ERROR_HANDLING: RuleMeta = RuleMeta {
    id: "missing-error-handling",
    name: "MissingErrorHandling",
    description: "File or network operations outside a try block",
    languages: &[Language::Python],
    default_severity: Severity::Warning,
    suggestion: "Wrap the operation in try/except and handle OSError or the client's errors",
};

pub(super) const AWAIT_OUTSIDE_ASYNC: RuleMeta = RuleMeta {
    id: "await-outside-async",
    name: "AwaitOutsideAsync",
    description: "'await' used in a file that declares no async function",
    languages: Language::JS_FAMILY,
    default_severity: Severity::Warning,
    suggestion: "Mark the enclosing function 'async' or handle the promise with .then()",
};

lazy_static! {
    static ref BARE_EXCEPT: Regex = Regex::new(r"^\s*except\s*:").unwrap();
    static ref EMPTY_CATCH: Regex = Regex::new(r"\bcatch\s*(?:\([^)]*\))?\s*\{\s*\}").unwrap();

    /// File system and network calls that can raise.
    static ref IO_CALL: Regex = Regex::new(concat!(
        r"(?:^|[^\w.])(open)\s*\(",
        r"|\b(requests\.(?:get|post|put|patch|delete|head|request))\s*\(",
        r"|\b(httpx\.(?:get|post|put|patch|delete|head|request))\s*\(",
        r"|\b((?:urllib\.request\.)?urlopen)\s*\(",
        r"|\b(socket\.(?:socket|create_connection))\s*\(",
        r"|\b(os\.(?:remove|unlink|rename|mkdir|makedirs|rmdir))\s*\(",
        r"|\b(shutil\.(?:copy|copyfile|copytree|move|rmtree))\s*\(",
    ))
    .unwrap();

    static ref TRY_STMT: Regex = Regex::new(r"^\s*try\s*:(.*)$").unwrap();
    static ref AWAIT_KW: Regex = Regex::new(r"\bawait\b").unwrap();
    static ref ASYNC_KW: Regex = Regex::new(r"\basync\b").unwrap();
}

/// Flags Python bare `except:` and JS/TS empty `catch {}` blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct BadErrorHandling;

impl Detector for BadErrorHandling {
    fn rule(&self) -> &'static RuleMeta {
        &BAD_ERROR_HANDLING
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        if source.language() == Language::Python {
            return Ok(scan_code_lines(source, &BAD_ERROR_HANDLING, |line| {
                BARE_EXCEPT
                    .is_match(&line.code)
                    .then(|| "bare except clause catches every exception".to_string())
            })
            .into_iter()
            .map(|f| f.with_suggestion("Use specific exception types: except ValueError as e:"))
            .collect());
        }

        Ok(scan_code_lines(source, &BAD_ERROR_HANDLING, |line| {
            EMPTY_CATCH
                .is_match(&line.code)
                .then(|| "empty catch block silently swallows errors".to_string())
        }))
    }
}

/// Flags Python I/O calls that aren't lexically inside a `try:` body.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingErrorHandling;

impl Detector for MissingErrorHandling {
    fn rule(&self) -> &'static RuleMeta {
        &MISSING_ERROR_HANDLING
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        let mut findings = Vec::new();
        // Indentation of each enclosing `try:` statement.
        let mut open_tries: Vec<usize> = Vec::new();

        for line in code_lines(source).iter().filter(|l| l.has_code()) {
            let indent = line.indent();
            while open_tries.last().is_some_and(|&t| t >= indent) {
                open_tries.pop();
            }

            let try_stmt = TRY_STMT.captures(&line.code);
            let inline_try = try_stmt
                .as_ref()
                .is_some_and(|c| !c[1].trim().is_empty());
            let guarded = !open_tries.is_empty() || inline_try;

            if !guarded {
                if let Some(call) = IO_CALL
                    .captures(&line.code)
                    .and_then(|c| c.iter().skip(1).flatten().next())
                {
                    findings.push(Finding::at_line(
                        &MISSING_ERROR_HANDLING,
                        line.number,
                        format!("{}() called without error handling", call.as_str()),
                    ));
                }
            }

            if try_stmt.is_some() && !inline_try {
                open_tries.push(indent);
            }
        }

        Ok(findings)
    }
}

/// Whole-text rule: `await` appears but nothing in the file is `async`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwaitOutsideAsync;

impl Detector for AwaitOutsideAsync {
    fn rule(&self) -> &'static RuleMeta {
        &AWAIT_OUTSIDE_ASYNC
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        let lines = code_lines(source);
        if lines.iter().any(|l| ASYNC_KW.is_match(&l.code)) {
            return Ok(Vec::new());
        }

        Ok(lines
            .iter()
            .find(|l| AWAIT_KW.is_match(&l.code))
            .map(|l| {
                Finding::at_line(
                    &AWAIT_OUTSIDE_ASYNC,
                    l.number,
                    "'await' used without an 'async' function",
                )
            })
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py(text: &str) -> SourceUnit {
        SourceUnit::new("t.py", text, Language::Python)
    }

    fn js(text: &str) -> SourceUnit {
        SourceUnit::new("t.js", text, Language::JavaScript)
    }

    #[test]
    fn test_bare_except() {
        let src = py("try:\n    go()\nexcept:\n    pass\ntry:\n    go()\nexcept ValueError:\n    pass");
        let found = BadErrorHandling.detect(&src).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(3));
        assert!(found[0].suggestion.as_deref().unwrap().contains("ValueError"));
    }

    #[test]
    fn test_empty_catch() {
        let src = js("try { go(); } catch (e) {}\ntry { go(); } catch (e) { log(e); }\ntry {} catch {}");
        let found = BadErrorHandling.detect(&src).unwrap();
        let lines: Vec<_> = found.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_unguarded_open() {
        let src = py("def load(path):\n    with open(path) as f:\n        return f.read()");
        let found = MissingErrorHandling.detect(&src).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(2));
        assert!(found[0].message.starts_with("open()"));
    }

    #[test]
    fn test_guarded_calls_are_ignored() {
        let text = "\
def load(path):
    try:
        with open(path) as f:
            data = f.read()
        resp = requests.get(url)
    except OSError:
        data = None
    return data
";
        assert!(MissingErrorHandling.detect(&py(text)).unwrap().is_empty());
    }

    #[test]
    fn test_call_after_try_block_is_flagged() {
        let text = "try:\n    x = 1\nexcept Exception:\n    pass\nos.remove(path)\ntry: open(p)\nexcept OSError: pass";
        let found = MissingErrorHandling.detect(&py(text)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(5));
        assert!(found[0].message.contains("os.remove"));
    }

    #[test]
    fn test_reopen_is_not_open() {
        let src = py("conn.reopen()\nself.open(x)\nfile_open(x)");
        assert!(MissingErrorHandling.detect(&src).unwrap().is_empty());
    }

    #[test]
    fn test_await_without_async() {
        let found = AwaitOutsideAsync
            .detect(&js("const a = 1;\nconst data = await fetch(url);\nawait x;"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(2));

        let ok = js("async function load() {\n  return await fetch(url);\n}");
        assert!(AwaitOutsideAsync.detect(&ok).unwrap().is_empty());
    }
}
