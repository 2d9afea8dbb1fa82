//! Ordered, language-scoped collection of detectors.
//!
//! A registry is built once (usually from configuration) and then shared
//! read-only. Registration order is the tie-break for report ordering, so
//! entries live in a `Vec` and are never reordered.

use log::debug;
use once_cell::sync::Lazy;

use super::{
    AnyType, AwaitOutsideAsync, BadErrorHandling, ConsoleLog, Detector, EvalUsage, GlobalUsage,
    InnerHtmlXss, LongFile, LooseEquality, MissingErrorHandling, MissingTypeHint, RuleMeta,
    Severity, TodoComment, VarUsage,
};
use crate::config::Config;
use crate::source::Language;

/// A registered detector plus its configured severity override.
pub struct Registration {
    detector: Box<dyn Detector>,
    severity: Option<Severity>,
}

impl Registration {
    pub fn detector(&self) -> &dyn Detector {
        self.detector.as_ref()
    }

    pub fn rule(&self) -> &'static RuleMeta {
        self.detector.rule()
    }

    /// Severity forced by configuration, if any.
    pub fn severity_override(&self) -> Option<Severity> {
        self.severity
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("rule", &self.rule().id)
            .field("severity", &self.severity)
            .finish()
    }
}

/// Detectors in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Registration>,
}

/// Built-in registry with default settings, created on first use.
static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::builtin);

/// Shared registry with the built-in catalogue and default settings.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full built-in catalogue with default settings.
    pub fn builtin() -> Self {
        Self::from_config(&Config::default())
    }

    /// The built-in catalogue minus disabled rules, with severity overrides applied.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        let candidates: Vec<Box<dyn Detector>> = vec![
            Box::new(EvalUsage),
            Box::new(InnerHtmlXss),
            Box::new(VarUsage),
            Box::new(LooseEquality),
            Box::new(AnyType),
            Box::new(BadErrorHandling),
            Box::new(MissingErrorHandling),
            Box::new(AwaitOutsideAsync),
            Box::new(ConsoleLog),
            Box::new(MissingTypeHint),
            Box::new(GlobalUsage),
            Box::new(TodoComment),
            Box::new(LongFile::new(config.max_file_lines())),
        ];

        for detector in candidates {
            let id = detector.rule().id;
            if !config.is_rule_enabled(id) {
                debug!("rule {} disabled by configuration", id);
                continue;
            }
            let severity = config.severity_override(id);
            registry.register_boxed(detector, severity);
        }

        debug!("registry built with {} detectors", registry.len());
        registry
    }

    /// Append a detector using its default severity.
    pub fn register<D: Detector + 'static>(&mut self, detector: D) -> &mut Self {
        self.register_boxed(Box::new(detector), None)
    }

    /// Append a detector whose findings are forced to `severity`.
    pub fn register_with_severity<D: Detector + 'static>(
        &mut self,
        detector: D,
        severity: Severity,
    ) -> &mut Self {
        self.register_boxed(Box::new(detector), Some(severity))
    }

    fn register_boxed(&mut self, detector: Box<dyn Detector>, severity: Option<Severity>) -> &mut Self {
        self.entries.push(Registration { detector, severity });
        self
    }

    /// Detectors applicable to a language, in registration order.
    pub fn for_language(&self, language: Language) -> Vec<&Registration> {
        self.entries
            .iter()
            .filter(|e| e.rule().applies_to(language))
            .collect()
    }

    /// Rules of all registered detectors, in registration order.
    pub fn rules(&self) -> impl Iterator<Item = &'static RuleMeta> + '_ {
        self.entries.iter().map(|e| e.rule())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
