//! Behavioral properties of `analyze` that hold for any input.

use smellcheck::detect::{Registry, DETECTOR_FAILED};
use smellcheck::{analyze, analyze_batch, default_registry, Language, Report, Severity, SourceUnit};

fn run(text: &str, language: Language) -> Report {
    analyze(&SourceUnit::new("input", text, language), default_registry())
}

fn count(report: &Report, rule: &str) -> usize {
    report.findings.iter().filter(|f| f.category == rule).count()
}

/// Inputs that stress the line splitter and the comment/string lexer.
const AWKWARD_INPUTS: &[&str] = &[
    "",
    "\n",
    "\n\n\n",
    "   \t  ",
    "\r\n\r\n",
    "'unterminated",
    "\"escaped \\\" quote == 1",
    "\"\"\"",
    "'''\nstill docstring\n",
    "/* never closed\nvar x = 1;",
    "*/ var y == z;",
    "// only a comment",
    "# only a comment",
    "\\",
    "\"\\é\" == x",
    "var ünïcødé = 'ß' == \"ẞ\";",
    "eval(\0binary)",
    "def f(:\n    pass",
    "def g(a, b=(1,\n",
    "catch(e){}",
    "`${a == b}`",
    "el.innerHTML = ",
    "TODO",
];

fn assert_well_ordered(report: &Report) {
    let lines: Vec<_> = report.findings.iter().map(|f| f.line).collect();
    let first_lineless = lines.iter().position(Option::is_none).unwrap_or(lines.len());
    assert!(
        lines[first_lineless..].iter().all(Option::is_none),
        "line-less findings must come last: {:?}",
        lines
    );
    let lined: Vec<_> = lines[..first_lineless].iter().flatten().collect();
    assert!(lined.windows(2).all(|w| w[0] <= w[1]), "lines out of order: {:?}", lines);
}

#[test]
fn test_awkward_inputs_never_fail() {
    for text in AWKWARD_INPUTS {
        for language in Language::ALL {
            let report = run(text, language);
            assert!(
                report.findings.iter().all(|f| f.category != DETECTOR_FAILED),
                "detector failed on {:?} ({}): {:?}",
                text,
                language,
                report.findings
            );
            assert_well_ordered(&report);
            for f in &report.findings {
                if let Some(line) = f.line {
                    assert!(line >= 1 && line <= report.stats.line_count);
                }
            }
        }
    }
}

#[test]
fn test_analysis_is_deterministic() {
    let text = "var a = 1;\nif (a == 2) { eval(s); }\n// TODO: remove\nel.innerHTML = s;\n";
    for language in Language::ALL {
        assert_eq!(run(text, language), run(text, language));
    }
}

#[test]
fn test_long_input_is_well_ordered() {
    let mut text = String::new();
    for i in 0..150 {
        text.push_str(&format!("var v{} = a == b; // TODO: item {}\n", i, i));
    }
    let report = run(&text, Language::JavaScript);
    assert_well_ordered(&report);
    assert_eq!(report.stats.line_count, 150);
    assert_eq!(count(&report, "var-usage"), 150);
    assert_eq!(count(&report, "long-file"), 1);
    assert_eq!(report.findings.last().map(|f| f.category.as_str()), Some("long-file"));
}

#[test]
fn test_var_declaration() {
    let report = run("var x = 1;\nlet y = 2;", Language::JavaScript);
    assert_eq!(count(&report, "var-usage"), 1);
    assert_eq!(report.findings[0].line, Some(1));
}

#[test]
fn test_loose_equality() {
    let report = run("if (a == b) { return true; }", Language::JavaScript);
    assert_eq!(count(&report, "loose-equality"), 1);

    let report = run("if (a === b) { return true; }", Language::JavaScript);
    assert_eq!(count(&report, "loose-equality"), 0);
}

#[test]
fn test_inner_html_with_dynamic_value() {
    let report = run("element.innerHTML = \"Welcome, \" + userInput;", Language::JavaScript);
    let xss: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == "innerhtml-xss")
        .collect();
    assert_eq!(xss.len(), 1);
    assert_eq!(xss[0].severity, Severity::Critical);
}

#[test]
fn test_any_annotation() {
    let report = run("function f(data: any): any { return data; }", Language::TypeScript);
    assert!(count(&report, "any-type") >= 1);
}

#[test]
fn test_todo_line_number() {
    let report = run("let a = 1;\nlet b = 2;\n// TODO: fix this\n", Language::JavaScript);
    let todos: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.category == "todo-comment")
        .collect();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].line, Some(3));
}

#[test]
fn test_empty_input_for_every_language() {
    for language in Language::ALL {
        let report = run("", language);
        assert!(report.findings.is_empty());
        assert_eq!(report.stats.line_count, 0);
    }
}

#[test]
fn test_language_without_detectors() {
    let mut registry = Registry::new();
    registry.register(smellcheck::detect::AnyType);

    let source = SourceUnit::new("a.py", "eval(x)\nprint(y)", Language::Python);
    let report = analyze(&source, &registry);
    assert_eq!(report.stats.detector_count_run, 0);
    assert!(report.findings.is_empty());
}

#[test]
fn test_binary_content_yields_nothing() {
    let report = run("var a\0 = b == c;\neval(x);", Language::JavaScript);
    assert!(report.findings.is_empty());
    assert_eq!(report.stats.line_count, 2);
}

#[test]
fn test_batch_matches_individual_analysis() {
    let sources: Vec<_> = AWKWARD_INPUTS
        .iter()
        .enumerate()
        .map(|(i, text)| SourceUnit::new(format!("s{}", i), *text, Language::ALL[i % 3]))
        .collect();

    let batch = analyze_batch(&sources, default_registry());
    let single: Vec<_> = sources.iter().map(|s| analyze(s, default_registry())).collect();
    assert_eq!(batch, single);
}
