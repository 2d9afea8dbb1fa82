//! Source units and the file loader that produces them.
//!
//! A [`SourceUnit`] is the immutable, in-memory view of one file that every
//! detector scans. Loading (path -> text + language) happens here, before the
//! pipeline runs, so that I/O problems surface as [`InputError`] and never
//! from inside analysis.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Languages understood by the detector catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

/// File extension to language mapping.
static EXTENSIONS: phf::Map<&'static str, Language> = phf_map! {
    "py" => Language::Python,
    "pyw" => Language::Python,
    "js" => Language::JavaScript,
    "jsx" => Language::JavaScript,
    "mjs" => Language::JavaScript,
    "cjs" => Language::JavaScript,
    "ts" => Language::TypeScript,
    "tsx" => Language::TypeScript,
    "mts" => Language::TypeScript,
    "cts" => Language::TypeScript,
};

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::TypeScript];

    /// JavaScript and TypeScript share most rules.
    pub const JS_FAMILY: &'static [Language] = &[Language::JavaScript, Language::TypeScript];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    /// Determine the language from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS.get(ext.to_ascii_lowercase().as_str()).copied()
    }

    /// Determine the language from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the language uses `//` and `/* */` comments.
    pub fn is_js_family(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            _ => Err(format!("unknown language: {}", s)),
        }
    }
}

/// Errors raised while turning a path into a [`SourceUnit`].
#[derive(Error, Debug)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type: {0} (expected .py, .js, .jsx, .ts or .tsx)")]
    UnsupportedExtension(PathBuf),
    #[error("{0} is not valid UTF-8 text")]
    NotUtf8(PathBuf),
}

/// One file's text plus its declared language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    id: String,
    text: String,
    language: Language,
    /// Byte ranges of each line within `text`.
    line_spans: Vec<(usize, usize)>,
    binary: bool,
}

impl SourceUnit {
    /// Build a source unit from raw text. Line splitting follows `str::lines`.
    pub fn new(id: impl Into<String>, text: impl Into<String>, language: Language) -> Self {
        let text = text.into();
        let base = text.as_ptr() as usize;
        let line_spans = text
            .lines()
            .map(|l| {
                let start = l.as_ptr() as usize - base;
                (start, start + l.len())
            })
            .collect();
        let binary = text.contains('\0');

        Self {
            id: id.into(),
            text,
            language,
            line_spans,
            binary,
        }
    }

    /// Load a file, deriving the language from its extension.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let language = Language::from_path(path)
            .ok_or_else(|| InputError::UnsupportedExtension(path.to_path_buf()))?;
        Self::load_as(path, language)
    }

    /// Load a file with an explicitly chosen language.
    pub fn load_as(path: &Path, language: Language) -> Result<Self, InputError> {
        let bytes = std::fs::read(path).map_err(|source| InputError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| InputError::NotUtf8(path.to_path_buf()))?;
        Ok(Self::new(path.to_string_lossy(), text, language))
    }

    /// Label used in reports (usually the file path).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn line_count(&self) -> usize {
        self.line_spans.len()
    }

    /// Get a line by its 1-based number.
    pub fn line(&self, number: usize) -> Option<&str> {
        let (start, end) = *self.line_spans.get(number.checked_sub(1)?)?;
        Some(&self.text[start..end])
    }

    /// All lines, in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.line_spans.iter().map(move |&(s, e)| &self.text[s..e])
    }

    /// Content containing NUL bytes is treated as binary.
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    /// Lines paired with their 1-based numbers, empty for binary content.
    pub fn scan_lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        let take = if self.binary { 0 } else { self.line_spans.len() };
        self.lines().take(take).enumerate().map(|(i, l)| (i + 1, l))
    }

    /// Full text for whole-text scans, `None` for binary content.
    pub fn scan_text(&self) -> Option<&str> {
        if self.binary {
            None
        } else {
            Some(&self.text)
        }
    }
}
