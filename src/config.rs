//! Configuration file schema for smellcheck.
//!
//! Configuration is optional. Without a file every built-in rule runs with
//! its default severity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detect::{self, Severity, DEFAULT_MAX_FILE_LINES};

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["smellcheck.yaml", ".smellcheck.yaml", "smellcheck.yml"];

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config syntax: {0}")]
    Syntax(#[from] serde_yaml::Error),
    #[error("unknown rule {0:?}")]
    UnknownRule(String),
    #[error("invalid excluded_paths pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("max_file_lines must be greater than zero")]
    InvalidLineLimit,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Rule ids that should not run.
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    /// Per-rule severity replacing the rule's default.
    #[serde(default)]
    pub severity_overrides: BTreeMap<String, Severity>,
    /// Line limit for the long-file rule (default: 100).
    #[serde(default)]
    pub max_file_lines: Option<usize>,
    /// Glob patterns for paths to skip when scanning directories (e.g. "**/dist/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Lowest severity that makes `check` exit non-zero (default: critical).
    #[serde(default)]
    pub fail_on: Option<Severity>,
}

impl Config {
    /// Parse configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content)
    }

    /// Parse configuration from YAML text. An empty document is the default config.
    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Find a configuration file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }

    pub fn max_file_lines(&self) -> usize {
        self.max_file_lines.unwrap_or(DEFAULT_MAX_FILE_LINES)
    }

    pub fn fail_on(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Critical)
    }

    pub fn is_rule_enabled(&self, id: &str) -> bool {
        !self.disabled_rules.iter().any(|r| r == id)
    }

    pub fn severity_override(&self, id: &str) -> Option<Severity> {
        self.severity_overrides.get(id).copied()
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy().replace('\\', "/");
        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|g| g.compile_matcher().is_match(path_str.as_str()))
                .unwrap_or(false)
        })
    }

    /// Validate rule ids, glob patterns and limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let known = |id: &str| detect::find_rule(id).is_some();

        for id in self
            .disabled_rules
            .iter()
            .chain(self.severity_overrides.keys())
        {
            if !known(id) {
                return Err(ConfigError::UnknownRule(id.clone()));
            }
        }

        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
        }

        if self.max_file_lines == Some(0) {
            return Err(ConfigError::InvalidLineLimit);
        }

        Ok(())
    }
}
