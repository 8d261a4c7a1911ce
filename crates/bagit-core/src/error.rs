//! Error taxonomy for bag parsing, creation, and validation.

use crate::algorithm::AlgorithmId;
use crate::oxum::PayloadOxum;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for bag operations.
pub type BagResult<T> = Result<T, BagError>;

/// Coarse classification of a [`BagError`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorClass {
    Format,
    Structure,
    Declaration,
    Contents,
    Io,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A required part of the bag layout that is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StructuralError {
    MissingPayloadDirectory,
    MissingManifest,
    MissingDeclaration,
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPayloadDirectory => write!(f, "missing data directory"),
            Self::MissingManifest => write!(f, "missing manifest file"),
            Self::MissingDeclaration => write!(f, "missing bagit.txt"),
        }
    }
}

/// One payload entry that failed full fixity validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// Listed in a manifest, absent from `data/`.
    MissingFromFilesystem { path: String },
    /// Present in `data/`, listed in no manifest.
    UntrackedOnFilesystem { path: String },
    ChecksumMismatch {
        path: String,
        algorithm: AlgorithmId,
        expected: String,
        actual: String,
    },
}

impl Discrepancy {
    pub fn path(&self) -> &str {
        match self {
            Self::MissingFromFilesystem { path }
            | Self::UntrackedOnFilesystem { path }
            | Self::ChecksumMismatch { path, .. } => path,
        }
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFromFilesystem { path } => {
                write!(f, "{}: exists in manifest but not in filesystem", path)
            }
            Self::UntrackedOnFilesystem { path } => {
                write!(f, "{}: exists in filesystem but not in manifests", path)
            }
            Self::ChecksumMismatch {
                path,
                algorithm,
                expected,
                actual,
            } => write!(
                f,
                "{} ({}): stored hash {} doesn't match calculated hash {}",
                path, algorithm, expected, actual
            ),
        }
    }
}

/// Errors raised while reading, writing, or validating a bag.
#[derive(Debug, Error)]
pub enum BagError {
    /// Tag or manifest text that cannot be decoded.
    #[error("format error in {context}: {message}")]
    Format { context: String, message: String },

    #[error("invalid bag structure: {0}")]
    Structural(StructuralError),

    #[error("required file not found: {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("missing required tag in bagit.txt: {tag}")]
    MissingTag { tag: String },

    #[error("unsupported bag version: {version}")]
    UnsupportedVersion { version: String },

    #[error("unsupported encoding: {encoding}")]
    UnsupportedEncoding { encoding: String },

    #[error("bagit.txt must not contain a byte-order mark")]
    ByteOrderMark,

    #[error("invalid Payload-Oxum: {value}")]
    InvalidOxum { value: String },

    /// Fast validation was requested but no Payload-Oxum was ever recorded.
    #[error("cannot validate in fast mode: bag lacks a Payload-Oxum")]
    ModeUnavailable,

    #[error(
        "Payload-Oxum mismatch: found {} files and {} bytes on disk; expected {} files and {} bytes",
        .observed.files, .observed.bytes, .declared.files, .declared.bytes
    )]
    OxumMismatch {
        declared: PayloadOxum,
        observed: PayloadOxum,
    },

    /// Every discrepancy found by full validation, never just the first.
    #[error(
        "{} payload entries failed validation: {}",
        .discrepancies.len(),
        join_display(.discrepancies)
    )]
    Fixity { discrepancies: Vec<Discrepancy> },

    #[error("no supported checksum algorithm requested")]
    NoSupportedAlgorithm,

    #[error("no such bag directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("read permission required for: {}", join_paths(.paths))]
    Unreadable { paths: Vec<PathBuf> },

    #[error("write permission required for: {}", join_paths(.paths))]
    Unwritable { paths: Vec<PathBuf> },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BagError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Format { .. } | Self::InvalidOxum { .. } => ErrorClass::Format,
            Self::Structural(_)
            | Self::MissingFile { .. }
            | Self::NotADirectory { .. }
            | Self::Unreadable { .. }
            | Self::Unwritable { .. } => ErrorClass::Structure,
            Self::MissingTag { .. }
            | Self::UnsupportedVersion { .. }
            | Self::UnsupportedEncoding { .. }
            | Self::ByteOrderMark => ErrorClass::Declaration,
            Self::ModeUnavailable
            | Self::OxumMismatch { .. }
            | Self::Fixity { .. }
            | Self::NoSupportedAlgorithm => ErrorClass::Contents,
            Self::Io { .. } => ErrorClass::Io,
        }
    }

    /// Discrepancies carried by a fixity failure; empty for every other error.
    pub fn discrepancies(&self) -> &[Discrepancy] {
        match self {
            Self::Fixity { discrepancies } => discrepancies,
            _ => &[],
        }
    }

    pub(crate) fn format(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Adapter for `map_err` that records which path the I/O error came from.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn join_display(items: &[Discrepancy]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixity_message_enumerates_every_discrepancy() {
        let err = BagError::Fixity {
            discrepancies: vec![
                Discrepancy::MissingFromFilesystem {
                    path: "data/a.txt".into(),
                },
                Discrepancy::ChecksumMismatch {
                    path: "data/b.txt".into(),
                    algorithm: AlgorithmId::Md5,
                    expected: "00".into(),
                    actual: "11".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 payload entries failed validation"));
        assert!(msg.contains("data/a.txt: exists in manifest but not in filesystem"));
        assert!(msg.contains("data/b.txt (md5)"));
        assert_eq!(err.class(), ErrorClass::Contents);
        assert_eq!(err.discrepancies().len(), 2);
    }

    #[test]
    fn oxum_message_reports_both_sides() {
        let err = BagError::OxumMismatch {
            declared: PayloadOxum { bytes: 10, files: 2 },
            observed: PayloadOxum { bytes: 12, files: 2 },
        };
        assert_eq!(
            err.to_string(),
            "Payload-Oxum mismatch: found 2 files and 12 bytes on disk; expected 2 files and 10 bytes"
        );
    }

    #[test]
    fn structural_errors_are_distinct() {
        let a = BagError::Structural(StructuralError::MissingManifest);
        let b = BagError::Structural(StructuralError::MissingPayloadDirectory);
        assert_ne!(a.to_string(), b.to_string());
        assert_eq!(a.class(), ErrorClass::Structure);
    }
}
