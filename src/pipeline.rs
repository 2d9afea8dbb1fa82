//! Analysis pipeline: run the registered detectors over a source unit and
//! aggregate their findings into a [`Report`].
//!
//! `analyze` is total. Detector errors and panics are downgraded to
//! `detector-failed` findings so one broken rule never hides the others.

use log::warn;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

use crate::detect::{filter_suppressed, parse_suppressions, Finding, Registration, Registry};
use crate::report::{Report, SeverityCounts, Stats, Structure};
use crate::source::SourceUnit;

/// Analyze one source unit with the given registry.
pub fn analyze(source: &SourceUnit, registry: &Registry) -> Report {
    let detectors = registry.for_language(source.language());

    if detectors.is_empty() {
        return Report {
            source_id: source.id().to_string(),
            language: source.language(),
            findings: Vec::new(),
            suppressed: Vec::new(),
            stats: Stats {
                line_count: source.line_count(),
                ..Default::default()
            },
        };
    }

    // Each finding is tagged with its detector's registration position.
    let mut tagged: Vec<(usize, Finding)> = Vec::new();
    for (order, registration) in detectors.iter().enumerate() {
        for finding in run_detector(registration, source) {
            tagged.push((order, finding));
        }
    }

    let suppressions = parse_suppressions(source);
    let (mut active, suppressed) = filter_suppressed(tagged, &suppressions);

    // Stable: equal keys keep emission order.
    active.sort_by_key(|(order, f)| (f.line.is_none(), f.line, *order));

    let findings: Vec<Finding> = active.into_iter().map(|(_, f)| f).collect();
    let stats = Stats {
        line_count: source.line_count(),
        detector_count_run: detectors.len(),
        finding_count_by_severity: SeverityCounts::tally(&findings),
        suppressed_count: suppressed.len(),
        structure: Structure::measure(source),
    };

    Report {
        source_id: source.id().to_string(),
        language: source.language(),
        findings,
        suppressed,
        stats,
    }
}

/// Analyze many source units in parallel. Reports come back in input order.
pub fn analyze_batch(sources: &[SourceUnit], registry: &Registry) -> Vec<Report> {
    sources.par_iter().map(|s| analyze(s, registry)).collect()
}

/// Run one detector, converting failures into a single finding and applying
/// the configured severity override.
fn run_detector(registration: &Registration, source: &SourceUnit) -> Vec<Finding> {
    let rule = registration.rule();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| registration.detector().detect(source)));

    let mut findings = match outcome {
        Ok(Ok(findings)) => findings,
        Ok(Err(e)) => {
            warn!("detector {} failed on {}: {:#}", rule.id, source.id(), e);
            return vec![Finding::detector_failed(rule.id, &e.to_string())];
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            warn!("detector {} panicked on {}: {}", rule.id, source.id(), reason);
            return vec![Finding::detector_failed(rule.id, &reason)];
        }
    };

    if let Some(severity) = registration.severity_override() {
        for f in findings.iter_mut().filter(|f| f.category == rule.id) {
            f.severity = severity;
        }
    }
    findings
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{
        default_registry, Detector, LongFile, RuleMeta, Severity, TodoComment, VarUsage,
        DETECTOR_FAILED,
    };
    use crate::source::Language;

    const FLAKY: RuleMeta = RuleMeta {
        id: "flaky-rule",
        name: "FlakyRule",
        description: "Fails on purpose",
        languages: &Language::ALL,
        default_severity: Severity::Warning,
        suggestion: "",
    };

    struct Failing;

    impl Detector for Failing {
        fn rule(&self) -> &'static RuleMeta {
            &FLAKY
        }

        fn detect(&self, _source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
            anyhow::bail!("regex budget exceeded")
        }
    }

    struct Panicking;

    impl Detector for Panicking {
        fn rule(&self) -> &'static RuleMeta {
            &FLAKY
        }

        fn detect(&self, _source: &SourceUnit) -> anyhow::Result<Vec<Finding>> {
            panic!("index out of range")
        }
    }

    fn js(text: &str) -> SourceUnit {
        SourceUnit::new("test.js", text, Language::JavaScript)
    }

    #[test]
    fn test_var_usage_reported_once() {
        let report = analyze(&js("var x = 1;\nlet y = 2;"), default_registry());
        let vars: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.category == "var-usage")
            .collect();
        assert_eq!(vars.len(), 1);
        assert_eq!(vars[0].line, Some(1));
        assert_eq!(report.stats.line_count, 2);
    }

    #[test]
    fn test_ordering_line_then_registration() {
        let text = "// TODO: drop once the API is stable\nvar a = b == c;\n";
        let report = analyze(&js(text), default_registry());
        let order: Vec<_> = report
            .findings
            .iter()
            .map(|f| (f.line, f.category.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Some(1), "todo-comment"),
                (Some(2), "var-usage"),
                (Some(2), "loose-equality"),
            ]
        );
    }

    #[test]
    fn test_lineless_findings_sort_last() {
        let mut registry = Registry::new();
        registry.register(LongFile::new(1)).register(VarUsage);
        let report = analyze(&js("let a = 1;\nvar b = 2;"), &registry);

        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].category, "var-usage");
        assert_eq!(report.findings[1].category, "long-file");
        assert_eq!(report.findings[1].line, None);
    }

    #[test]
    fn test_failing_detector_becomes_finding() {
        let mut registry = Registry::new();
        registry.register(Failing).register(VarUsage);
        let report = analyze(&js("var a = 1;"), &registry);

        assert_eq!(report.stats.detector_count_run, 2);
        assert_eq!(report.findings[0].category, "var-usage");
        let failed = &report.findings[1];
        assert_eq!(failed.category, DETECTOR_FAILED);
        assert_eq!(failed.severity, Severity::Info);
        assert!(failed.message.contains("flaky-rule"));
        assert!(failed.message.contains("regex budget exceeded"));
    }

    #[test]
    fn test_panicking_detector_is_contained() {
        let mut registry = Registry::new();
        registry.register(Panicking).register(TodoComment);
        let report = analyze(&js("// TODO: wire up retries"), &registry);

        let categories: Vec<_> = report.findings.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["todo-comment", DETECTOR_FAILED]);
        assert!(report.findings[1].message.contains("index out of range"));
    }

    #[test]
    fn test_severity_override_applies() {
        let mut registry = Registry::new();
        registry.register_with_severity(VarUsage, Severity::Critical);
        let report = analyze(&js("var a = 1;"), &registry);

        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert_eq!(report.stats.finding_count_by_severity.critical, 1);
    }

    #[test]
    fn test_override_skips_failure_findings() {
        let mut registry = Registry::new();
        registry.register_with_severity(Failing, Severity::Critical);
        let report = analyze(&js("x"), &registry);
        assert_eq!(report.findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_suppressed_findings_are_moved() {
        let text = "var a = 1; // smellcheck:ignore var-usage - legacy bundle\nvar b = 2;\n";
        let report = analyze(&js(text), default_registry());

        let vars: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.category == "var-usage")
            .map(|f| f.line)
            .collect();
        assert_eq!(vars, vec![Some(2)]);
        assert_eq!(report.stats.suppressed_count, 1);
        assert_eq!(report.suppressed[0].suppression.reason, "legacy bundle");
    }

    #[test]
    fn test_empty_registry_gives_degenerate_report() {
        let report = analyze(&js("var a = b == c;"), &Registry::new());
        assert!(report.findings.is_empty());
        assert_eq!(report.stats.detector_count_run, 0);
        assert_eq!(report.stats.line_count, 1);
    }

    #[test]
    fn test_empty_input() {
        for language in Language::ALL {
            let source = SourceUnit::new("empty", "", language);
            let report = analyze(&source, default_registry());
            assert!(report.findings.is_empty());
            assert_eq!(report.stats.line_count, 0);
            assert!(report.stats.detector_count_run > 0);
        }
    }

    #[test]
    fn test_batch_preserves_input_order() {
        let sources: Vec<_> = (0..32)
            .map(|i| {
                let text = if i % 2 == 0 { "var a = 1;" } else { "let a = 1;" };
                SourceUnit::new(format!("f{}.js", i), text, Language::JavaScript)
            })
            .collect();

        let reports = analyze_batch(&sources, default_registry());
        assert_eq!(reports.len(), sources.len());
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.source_id, format!("f{}.js", i));
            assert_eq!(report, &analyze(&sources[i], default_registry()));
        }
    }
}
