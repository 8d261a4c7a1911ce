//! `fetch.txt` parsing. Entries are only ever compared with the local payload;
//! nothing is downloaded.

use crate::diagnostic::{Diagnostic, Parsed};
use crate::error::{BagError, BagResult};
use crate::paths;
use serde::Serialize;
use std::io::Read;

pub const FETCH_FILE: &str = "fetch.txt";

/// `<url> <size-or-dash> <path>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchEntry {
    pub url: String,
    /// `None` when the line declares `-`.
    pub size: Option<u64>,
    pub path: String,
}

pub fn parse_fetch<R: Read>(mut reader: R) -> BagResult<Parsed<FetchEntry>> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .map_err(|e| BagError::format(FETCH_FILE, e.to_string()))?;
    let text = std::str::from_utf8(&raw)
        .map_err(|e| BagError::format(FETCH_FILE, format!("invalid UTF-8: {}", e)))?;

    let mut parsed = Parsed::default();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Some(entry) => parsed.entries.push(entry),
            None => {
                tracing::warn!(line = idx + 1, "invalid fetch entry");
                parsed.diagnostics.push(Diagnostic::MalformedLine {
                    file: FETCH_FILE.to_string(),
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
        }
    }
    Ok(parsed)
}

fn parse_line(line: &str) -> Option<FetchEntry> {
    let (url, rest) = line.split_once(char::is_whitespace)?;
    let (size, path) = rest.trim_start().split_once(char::is_whitespace)?;
    let path = path.trim_start();
    if path.is_empty() {
        return None;
    }
    let size = match size {
        "-" => None,
        digits => Some(digits.parse::<u64>().ok()?),
    };
    Some(FetchEntry {
        url: url.to_string(),
        size,
        path: paths::normalize(path),
    })
}
