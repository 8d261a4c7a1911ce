//! Checksum manifest codec (`manifest-<alg>.txt`, `tagmanifest-<alg>.txt`).
//!
//! Line format: `<hex-digest> <whitespace> [*]<path>`. Blank lines and lines
//! starting with `#` are ignored.

use crate::algorithm::AlgorithmId;
use crate::diagnostic::{Diagnostic, Parsed};
use crate::error::{BagError, BagResult};
use crate::paths;
use std::collections::BTreeMap;
use std::io::Read;

/// Payload path → algorithm → stored hex digest, merged across manifests.
pub type Entries = BTreeMap<String, BTreeMap<AlgorithmId, String>>;

/// One `digest  path` line with the path already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLine {
    pub digest: String,
    pub path: String,
}

/// Parse one manifest. `label` names the source in diagnostics.
pub fn parse_manifest<R: Read>(mut reader: R, label: &str) -> BagResult<Parsed<ManifestLine>> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .map_err(|e| BagError::format(label, e.to_string()))?;
    let text = std::str::from_utf8(&raw)
        .map_err(|e| BagError::format(label, format!("invalid UTF-8: {}", e)))?;

    let mut parsed = Parsed::default();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once(char::is_whitespace) {
            Some((digest, rest)) => {
                let raw_path = rest.trim_start();
                let raw_path = raw_path.strip_prefix('*').unwrap_or(raw_path);
                parsed.entries.push(ManifestLine {
                    digest: digest.to_string(),
                    path: paths::normalize(raw_path),
                });
            }
            None => {
                tracing::warn!(file = label, line = idx + 1, "invalid manifest entry");
                parsed.diagnostics.push(Diagnostic::MalformedLine {
                    file: label.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
        }
    }
    Ok(parsed)
}

/// Fold one algorithm's lines into `entries`.
///
/// A path seen twice for the same algorithm is reported and the later digest
/// wins. The same path under different algorithms is the normal case.
pub fn merge_into(
    entries: &mut Entries,
    algorithm: AlgorithmId,
    lines: Vec<ManifestLine>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for ManifestLine { digest, path } in lines {
        let by_alg = entries.entry(path.clone()).or_default();
        if by_alg.insert(algorithm, digest).is_some() {
            tracing::warn!(%algorithm, path = %path, "duplicate manifest entry");
            diagnostics.push(Diagnostic::DuplicateEntry { algorithm, path });
        }
    }
}

/// Serialize `path → digest` as `digest  path\n`, sorted by path.
pub fn serialize_manifest(digests: &BTreeMap<String, String>) -> Vec<u8> {
    let mut out = Vec::new();
    for (path, digest) in digests {
        out.extend_from_slice(digest.as_bytes());
        out.extend_from_slice(b"  ");
        out.extend_from_slice(path.as_bytes());
        out.push(b'\n');
    }
    out
}
