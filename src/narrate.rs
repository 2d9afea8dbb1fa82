//! Step-by-step narration around a single-file analysis.
//!
//! Narration is presentation only: it labels the phases of loading,
//! analyzing and summarizing, and never changes the resulting report.

use colored::*;
use std::io::Write;
use std::path::Path;

use crate::detect::Registry;
use crate::pipeline::analyze;
use crate::report::Report;
use crate::source::{Language, SourceUnit};

/// Fixed phases of a narrated analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ReadFile,
    DetectIssues,
    Summarize,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::ReadFile, Step::DetectIssues, Step::Summarize];

    pub fn label(&self) -> &'static str {
        match self {
            Step::ReadFile => "Read file",
            Step::DetectIssues => "Detect issues",
            Step::Summarize => "Summarize",
        }
    }

    /// 1-based position in the plan.
    pub fn number(&self) -> usize {
        match self {
            Step::ReadFile => 1,
            Step::DetectIssues => 2,
            Step::Summarize => 3,
        }
    }
}

/// Writes step progress to an output stream (stderr in the CLI).
pub struct Narrator<W: Write> {
    out: W,
}

impl<W: Write> Narrator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Announce the task and list its steps.
    pub fn plan(&mut self, target: &str) -> std::io::Result<()> {
        writeln!(self.out, "{} {}", "Analyzing".bold(), target)?;
        for step in Step::ALL {
            writeln!(self.out, "  {} {}. {}", "→".blue(), step.number(), step.label())?;
        }
        Ok(())
    }

    /// Run one step, printing its start and completion around `f`.
    pub fn step<T>(&mut self, step: Step, f: impl FnOnce() -> T) -> std::io::Result<T> {
        writeln!(
            self.out,
            "{}",
            format!("Step {}: {}", step.number(), step.label()).blue()
        )?;
        let value = f();
        writeln!(self.out, "{}", format!("Step {} complete", step.number()).green())?;
        Ok(value)
    }

    /// Load, analyze and summarize one file, narrating each step.
    pub fn analyze_file(
        &mut self,
        path: &Path,
        language: Option<Language>,
        registry: &Registry,
    ) -> anyhow::Result<Report> {
        self.plan(&path.display().to_string())?;

        let source = self.step(Step::ReadFile, || match language {
            Some(lang) => SourceUnit::load_as(path, lang),
            None => SourceUnit::load(path),
        })??;
        let report = self.step(Step::DetectIssues, || analyze(&source, registry))?;
        let summary = self.step(Step::Summarize, || report.summary())?;

        writeln!(self.out, "  {}", summary)?;
        Ok(report)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
