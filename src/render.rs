//! Output formatting for smellcheck reports.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output grouped by severity
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration
//!
//! Renderers only read reports and write to any `io::Write`.

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::detect::{find_rule, Finding, Severity, SuppressionType, DETECTOR_FAILED};
use crate::report::{summarize, Report, SeverityCounts};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Json,
    Sarif,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Format::Pretty),
            "json" => Ok(Format::Json),
            "sarif" => Ok(Format::Sarif),
            _ => Err(format!(
                "invalid format {:?}, must be 'pretty', 'json', or 'sarif'",
                s
            )),
        }
    }
}

/// Severity totals across all reports in a run.
pub fn totals(reports: &[Report]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for r in reports {
        counts.merge(&r.stats.finding_count_by_severity);
    }
    counts
}

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON document.
#[derive(Serialize, Deserialize)]
pub struct JsonOutput {
    pub version: String,
    pub files_scanned: usize,
    pub summary: String,
    pub totals: JsonTotals,
    pub reports: Vec<Report>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonTotals {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub suppressed: usize,
}

/// Write reports in JSON format.
pub fn write_json<W: Write>(out: &mut W, reports: &[Report]) -> anyhow::Result<()> {
    let counts = totals(reports);
    let output = JsonOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        files_scanned: reports.len(),
        summary: summarize(&counts),
        totals: JsonTotals {
            critical: counts.critical,
            warning: counts.warning,
            info: counts.info,
            suppressed: reports.iter().map(|r| r.stats.suppressed_count).sum(),
        },
        reports: reports.to_vec(),
    };

    serde_json::to_writer_pretty(&mut *out, &output)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "smellcheck";

/// Repository URL from the package manifest, if one is set.
fn information_uri() -> Option<String> {
    option_env!("CARGO_PKG_REPOSITORY")
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
}

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri", default, skip_serializing_if = "Option::is_none")]
    information_uri: Option<String>,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "help", skip_serializing_if = "Option::is_none")]
    help: Option<SarifMessage>,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
}

fn map_severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn make_relative_path(file_path: &str, base_path: &Path) -> String {
    if base_path.as_os_str().is_empty() {
        return file_path.to_string();
    }

    let file = Path::new(file_path);

    // Single file scan: report just the file name
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

fn sarif_rule(rule_id: &str) -> SarifRule {
    match find_rule(rule_id) {
        Some(rule) => SarifRule {
            id: rule.id.to_string(),
            name: rule.name.to_string(),
            short_description: SarifMessage {
                text: rule.description.to_string(),
            },
            help: (!rule.suggestion.is_empty()).then(|| SarifMessage {
                text: rule.suggestion.to_string(),
            }),
            default_config: SarifRuleConfig {
                level: map_severity_to_level(rule.default_severity).to_string(),
            },
        },
        None => SarifRule {
            id: rule_id.to_string(),
            name: if rule_id == DETECTOR_FAILED {
                "DetectorFailed".to_string()
            } else {
                "Unknown".to_string()
            },
            short_description: SarifMessage {
                text: "A detector could not complete its scan".to_string(),
            },
            help: None,
            default_config: SarifRuleConfig {
                level: "note".to_string(),
            },
        },
    }
}

/// Write reports in SARIF format. File URIs are made relative to `base_path`.
pub fn write_sarif<W: Write>(
    out: &mut W,
    reports: &[Report],
    base_path: &Path,
) -> anyhow::Result<()> {
    // Sorted for stable output
    let rule_ids: BTreeSet<&str> = reports
        .iter()
        .flat_map(|r| r.findings.iter().map(|f| f.category.as_str()))
        .collect();
    let rules: Vec<SarifRule> = rule_ids.into_iter().map(sarif_rule).collect();

    let results: Vec<SarifResult> = reports
        .iter()
        .flat_map(|r| {
            let uri = make_relative_path(&r.source_id, base_path);
            r.findings.iter().map(move |f| SarifResult {
                rule_id: f.category.clone(),
                level: map_severity_to_level(f.severity).to_string(),
                message: SarifMessage {
                    text: f.message.clone(),
                },
                locations: vec![SarifLocation {
                    physical_location: SarifPhysicalLocation {
                        artifact_location: SarifArtifact { uri: uri.clone() },
                        region: SarifRegion {
                            start_line: f.line.unwrap_or(1),
                        },
                    },
                }],
            })
        })
        .collect();

    let report = SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: information_uri(),
                    rules,
                },
            },
            results,
        }],
    };

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write reports in pretty (human-readable) format.
pub fn write_pretty<W: Write>(
    out: &mut W,
    reports: &[Report],
    show_suppressed: bool,
) -> anyhow::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        TOOL_NAME.cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;

    for report in reports {
        write_report(out, report, show_suppressed)?;
    }

    if reports.len() > 1 {
        let counts = totals(reports);
        write!(out, "  {} ", format!("{} files:", reports.len()).dimmed())?;
        write_summary_line(out, &counts)?;
        writeln!(out)?;
    }

    Ok(())
}

fn write_report<W: Write>(out: &mut W, report: &Report, show_suppressed: bool) -> anyhow::Result<()> {
    writeln!(
        out,
        "  {} {}",
        report.source_id.blue().bold(),
        format!("({}, {} lines)", report.language, report.stats.line_count).dimmed()
    )?;

    if report.findings.is_empty() {
        writeln!(out, "    No issues found.")?;
    }

    for severity in Severity::DESCENDING {
        let group: Vec<&Finding> = report.findings_with(severity).collect();
        if group.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "    {} ({}):", group_title(severity).bold(), group.len())?;
        for f in group {
            write_finding(out, f)?;
        }
    }

    if !report.suppressed.is_empty() {
        writeln!(out)?;
        write_suppressed(out, report, show_suppressed)?;
    }

    writeln!(out)?;
    write!(out, "  ")?;
    write_summary_line(out, &report.stats.finding_count_by_severity)?;
    if report.stats.suppressed_count > 0 {
        write!(
            out,
            "  {}",
            format!("({} suppressed)", report.stats.suppressed_count).dimmed()
        )?;
    }
    writeln!(out)?;
    writeln!(out)?;
    Ok(())
}

fn group_title(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "Critical",
        Severity::Warning => "Warnings",
        Severity::Info => "Suggestions",
    }
}

fn write_finding<W: Write>(out: &mut W, f: &Finding) -> anyhow::Result<()> {
    write_severity_tag(out, f.severity)?;
    let location = match f.line {
        Some(line) => format!("line {}", line),
        None => "file".to_string(),
    };
    writeln!(out, "{:<10} {:<24} {}", location.dimmed(), f.category.dimmed(), f.message)?;
    if let Some(suggestion) = &f.suggestion {
        writeln!(out, "                 {} {}", "→".cyan(), suggestion)?;
    }
    Ok(())
}

fn write_severity_tag<W: Write>(out: &mut W, severity: Severity) -> anyhow::Result<()> {
    match severity {
        Severity::Critical => write!(out, "      {} ", "CRIT".red().bold())?,
        Severity::Warning => write!(out, "      {} ", "WARN".yellow())?,
        Severity::Info => write!(out, "      {} ", "INFO".blue())?,
    }
    Ok(())
}

fn write_summary_line<W: Write>(out: &mut W, counts: &SeverityCounts) -> anyhow::Result<()> {
    let summary = summarize(counts);
    if counts.critical > 0 {
        write!(out, "{}", summary.red())?;
    } else if counts.warning > 0 {
        write!(out, "{}", summary.yellow())?;
    } else {
        write!(out, "{}", summary.green())?;
    }
    Ok(())
}

fn write_suppressed<W: Write>(out: &mut W, report: &Report, show_details: bool) -> anyhow::Result<()> {
    writeln!(out, "    {} ({}):", "Suppressed".dimmed(), report.suppressed.len())?;

    if !show_details {
        writeln!(out, "      {}", "(use --show-suppressed to see details)".dimmed())?;
        return Ok(());
    }

    for sf in &report.suppressed {
        let f = &sf.finding;
        let s = &sf.suppression;

        let location = match (s.suppression_type, f.line) {
            (SuppressionType::File, _) => "* (file)".to_string(),
            (_, Some(line)) => format!("line {}", line),
            (_, None) => "file".to_string(),
        };
        writeln!(out, "      {:<10} {:<24} {}", location.dimmed(), f.category.dimmed(), f.message)?;
        if !s.reason.is_empty() {
            writeln!(out, "                 {}", format!("reason: {:?}", s.reason).dimmed())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::default_registry;
    use crate::pipeline::analyze;
    use crate::source::{Language, SourceUnit};

    fn sample_report() -> Report {
        let src = SourceUnit::new(
            "/work/app/main.js",
            "var a = 1;\nel.innerHTML = name;\nconsole.log(a);\n",
            Language::JavaScript,
        );
        analyze(&src, default_registry())
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("sarif".parse::<Format>(), Ok(Format::Sarif));
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_make_relative_path() {
        let base = Path::new("/work/app");
        assert_eq!(make_relative_path("/work/app/src/a.py", base), "src/a.py");
        assert_eq!(make_relative_path("/work/app", base), "app");
        assert_eq!(make_relative_path("/elsewhere/b.js", base), "/elsewhere/b.js");
    }

    #[test]
    fn test_json_totals() {
        let reports = vec![sample_report(), sample_report()];
        let mut buf = Vec::new();
        write_json(&mut buf, &reports).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["files_scanned"], 2);
        assert_eq!(value["totals"]["critical"], 2);
        assert_eq!(value["totals"]["warning"], 2);
        assert_eq!(value["totals"]["info"], 2);
        assert_eq!(value["reports"][0]["findings"][0]["category"], "var-usage");
        assert_eq!(value["summary"], "Found 4 issue(s), 2 improvement suggestion(s)");
    }

    #[test]
    fn test_sarif_locations_and_rules() {
        let mut report = sample_report();
        report.findings.push(Finding::detector_failed("var-usage", "boom"));

        let mut buf = Vec::new();
        write_sarif(&mut buf, &[report], Path::new("/work/app")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["version"], "2.1.0");
        let run = &value["runs"][0];
        let driver = &run["tool"]["driver"];
        assert_eq!(driver.get("informationUri").is_some(), information_uri().is_some());
        let rules = run["tool"]["driver"]["rules"].as_array().unwrap();
        let ids: Vec<_> = rules.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(
            ids,
            vec!["console-log", "detector-failed", "innerhtml-xss", "var-usage"]
        );

        let results = run["results"].as_array().unwrap();
        let first = &results[0]["locations"][0]["physicalLocation"];
        assert_eq!(first["artifactLocation"]["uri"], "main.js");
        assert_eq!(first["region"]["startLine"], 1);
        let last = results.last().unwrap();
        assert_eq!(last["ruleId"], "detector-failed");
        assert_eq!(last["locations"][0]["physicalLocation"]["region"]["startLine"], 1);
        assert_eq!(results[1]["level"], "error");
    }

    #[test]
    fn test_pretty_groups_by_severity() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty(&mut buf, &[sample_report()], false).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let critical = text.find("Critical (1):").unwrap();
        let warnings = text.find("Warnings (1):").unwrap();
        let suggestions = text.find("Suggestions (1):").unwrap();
        assert!(critical < warnings && warnings < suggestions);
        assert!(text.contains("line 2"));
        assert!(text.contains("Found 2 issue(s), 1 improvement suggestion(s)"));
    }

    #[test]
    fn test_pretty_clean_report() {
        colored::control::set_override(false);
        let src = SourceUnit::new("ok.py", "x: int = 1\n", Language::Python);
        let mut buf = Vec::new();
        write_pretty(&mut buf, &[analyze(&src, default_registry())], false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("No issues found."));
        assert!(text.contains("Code looks clean! No major issues found."));
    }
}
