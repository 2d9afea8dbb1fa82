//! Security anti-patterns: dynamic code execution and HTML injection sinks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{is_string_literal, scan_code_lines, Detector, Finding, RuleMeta, Severity};
use crate::source::{Language, SourceUnit};

pub(super) const EVAL_USAGE: RuleMeta = RuleMeta {
    id: "eval-usage",
    name: "EvalUsage",
    description: "Calls to eval()/exec() that execute arbitrary code",
    languages: &Language::ALL,
    default_severity: Severity::Critical,
    suggestion: "Avoid eval() - it can execute arbitrary code",
};

pub(super) const INNERHTML_XSS: RuleMeta = RuleMeta {
    id: "innerhtml-xss",
    name: "InnerHtmlXss",
    description: "Assignment of a non-literal value into innerHTML/outerHTML",
    languages: Language::JS_FAMILY,
    default_severity: Severity::Critical,
    suggestion: "Use textContent or sanitize input before inserting HTML",
};

lazy_static! {
    static ref JS_EVAL: Regex = Regex::new(r"(?:^|[^\w$.])eval\s*\(").unwrap();

    /// `eval(` and `exec(` as free functions, not methods like `model.eval()`.
    static ref PY_EVAL: Regex = Regex::new(r"(?:^|[^\w.])(eval|exec)\s*\(").unwrap();

    /// `x.innerHTML = rhs` or `x.outerHTML += rhs`, but not comparisons.
    static ref HTML_SINK: Regex =
        Regex::new(r"\.(innerHTML|outerHTML)\s*\+?=\s*([^=].*)$").unwrap();
}

/// Flags `eval`/`exec` calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvalUsage;

impl Detector for EvalUsage {
    fn rule(&self) -> &'static RuleMeta {
        &EVAL_USAGE
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        let python = source.language() == Language::Python;
        let findings = scan_code_lines(source, &EVAL_USAGE, |line| {
            if python {
                PY_EVAL.captures(&line.code).map(|caps| {
                    format!("call to {}() can execute arbitrary code", &caps[1])
                })
            } else {
                JS_EVAL
                    .is_match(&line.code)
                    .then(|| "call to eval() can execute arbitrary code".to_string())
            }
        });

        if python {
            return Ok(findings
                .into_iter()
                .map(|f| {
                    f.with_suggestion("Parse input explicitly (e.g. ast.literal_eval or json.loads)")
                })
                .collect());
        }
        Ok(findings)
    }
}

/// Flags HTML sinks fed from expressions that aren't plain string literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct InnerHtmlXss;

impl Detector for InnerHtmlXss {
    fn rule(&self) -> &'static RuleMeta {
        &INNERHTML_XSS
    }

    fn detect(&self, source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
        Ok(scan_code_lines(source, &INNERHTML_XSS, |line| {
            let caps = HTML_SINK.captures(&line.code)?;
            let sink = &caps[1];
            let rhs = caps[2].trim();
            if rhs.is_empty() || is_string_literal(rhs) {
                return None;
            }
            Some(format!("potential XSS: {} assigned from a dynamic value", sink))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(text: &str) -> SourceUnit {
        SourceUnit::new("test.js", text, Language::JavaScript)
    }

    #[test]
    fn test_eval_js() {
        let found = EvalUsage.detect(&js("const r = eval(input);\nx.evaluate(y);")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, Some(1));
        assert_eq!(found[0].severity, Severity::Critical);
    }

    #[test]
    fn test_eval_python() {
        let src = SourceUnit::new(
            "t.py",
            "result = eval(expr)\nexec(code)\nmodel.eval()\ncursor.execute(q)\n# eval(x)",
            Language::Python,
        );
        let found = EvalUsage.detect(&src).unwrap();
        let lines: Vec<_> = found.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![Some(1), Some(2)]);
        assert!(found[1].message.contains("exec()"));
        assert!(found[0].suggestion.as_deref().unwrap().contains("literal_eval"));
    }

    #[test]
    fn test_innerhtml_dynamic_value() {
        let found = InnerHtmlXss
            .detect(&js(r#"element.innerHTML = "Welcome, " + userInput;"#))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, "innerhtml-xss");
        assert_eq!(found[0].severity, Severity::Critical);
    }

    #[test]
    fn test_innerhtml_literal_and_comparison_are_ignored() {
        let text = "el.innerHTML = \"<b>static</b>\";\nif (el.innerHTML == old) {}\nel.innerHTML = '';";
        assert!(InnerHtmlXss.detect(&js(text)).unwrap().is_empty());
    }

    #[test]
    fn test_outerhtml_append() {
        let found = InnerHtmlXss.detect(&js("node.outerHTML += `<li>${item}</li>`;")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("outerHTML"));
    }
}
