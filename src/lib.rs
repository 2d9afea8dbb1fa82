//! Smellcheck - heuristic code smell detection for Python, JavaScript and
//! TypeScript.
//!
//! Smellcheck scans a single source file at a time for a fixed catalogue of
//! surface-level issues and reports them with a severity and a suggestion.
//! Detection is line- and pattern-based; there is no parsing.
//!
//! # Architecture
//!
//! - `source`: `SourceUnit` and the file loader
//! - `detect`: the `Detector` trait, built-in rules, registry, suppressions
//! - `pipeline`: runs a registry over a source unit and builds a `Report`
//! - `report`: report model, statistics and summary wording
//! - `render`: pretty, JSON and SARIF output
//! - `narrate`: step-by-step narration around a single analysis
//! - `config`: YAML configuration
//!
//! # Example
//!
//! ```
//! use smellcheck::{analyze, default_registry, Language, SourceUnit};
//!
//! let source = SourceUnit::new("app.js", "var x = 1;\nlet y = 2;", Language::JavaScript);
//! let report = analyze(&source, default_registry());
//! assert_eq!(report.findings[0].category, "var-usage");
//! assert_eq!(report.findings[0].line, Some(1));
//! ```

pub mod cli;
pub mod config;
pub mod detect;
pub mod narrate;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod source;

pub use config::{Config, ConfigError};
pub use detect::{default_registry, Detector, Finding, Registry, RuleMeta, Severity};
pub use pipeline::{analyze, analyze_batch};
pub use report::{Report, SeverityCounts, Stats, Structure};
pub use source::{InputError, Language, SourceUnit};
