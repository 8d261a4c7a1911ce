//! In-band parse diagnostics.
//!
//! Per-line problems in manifests and `fetch.txt` do not abort parsing; they
//! are collected next to the valid entries and surfaced by the caller.

use crate::algorithm::AlgorithmId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A line that does not split into the expected fields.
    MalformedLine {
        file: String,
        line: usize,
        content: String,
    },
    /// The same algorithm lists the same path twice; the later digest wins.
    DuplicateEntry { algorithm: AlgorithmId, path: String },
    /// A `manifest-<alg>.txt` whose algorithm is not supported.
    UnknownAlgorithm { file: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLine {
                file,
                line,
                content,
            } => write!(f, "{}:{}: invalid entry: {}", file, line, content),
            Self::DuplicateEntry { algorithm, path } => {
                write!(f, "duplicate {} manifest entry: {}", algorithm, path)
            }
            Self::UnknownAlgorithm { file } => {
                write!(f, "{}: unsupported checksum algorithm, ignored", file)
            }
        }
    }
}

/// Valid records plus the diagnostics produced while parsing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub entries: Vec<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}
