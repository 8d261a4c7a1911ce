//! Tag file codec (`bagit.txt`, `bag-info.txt`).
//!
//! Reading follows RFC 2822 folding: a line that starts with whitespace
//! continues the previous value. Writing emits one `Name: value` line per tag,
//! sorted by name, without folding.

use crate::error::{BagError, BagResult};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub(crate) const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parse a tag stream into `(name, value)` pairs in file order.
///
/// Duplicate names are kept here; [`into_map`] applies last-wins.
pub fn parse_tags<R: Read>(mut reader: R) -> BagResult<Vec<(String, String)>> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .map_err(|e| BagError::format("tag file", e.to_string()))?;
    parse_tag_bytes(&raw, "tag file")
}

fn parse_tag_bytes(raw: &[u8], context: &str) -> BagResult<Vec<(String, String)>> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let text = std::str::from_utf8(raw)
        .map_err(|e| BagError::format(context, format!("invalid UTF-8: {}", e)))?;

    let mut tags = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(line.trim());
            }
            continue;
        }

        if let Some(done) = current.take() {
            tags.push(done);
        }
        let (name, value) = line.split_once(':').unwrap_or((line, ""));
        current = Some((name.trim().to_string(), value.trim().to_string()));
    }

    if let Some(done) = current {
        tags.push(done);
    }
    Ok(tags)
}

/// Collapse parsed tags into a map; a repeated name keeps its last value.
pub fn into_map(tags: Vec<(String, String)>) -> BTreeMap<String, String> {
    tags.into_iter().collect()
}

/// Read and parse a tag file from disk.
pub fn load_tag_file(path: &Path) -> BagResult<BTreeMap<String, String>> {
    let raw = std::fs::read(path).map_err(BagError::io(path))?;
    let context = path.display().to_string();
    Ok(into_map(parse_tag_bytes(&raw, &context)?))
}

/// Serialize tags as `Name: value\n`, sorted by name.
pub fn serialize_tags<'a, I>(tags: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut sorted: Vec<(&str, &str)> = tags.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = Vec::new();
    for (name, value) in sorted {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    }
    out
}

/// Reject tags that would not read back as the same single `Name: value`
/// line: empty names, names containing `:` or surrounding whitespace, and
/// values containing a line break.
pub fn check_writable<'a, I>(tags: I, context: &str) -> BagResult<()>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (name, value) in tags {
        if name.is_empty() || name.contains(':') || name.trim() != name {
            return Err(BagError::format(context, format!("invalid tag name {:?}", name)));
        }
        if value.contains(['\r', '\n']) {
            return Err(BagError::format(
                context,
                format!("value of tag {} contains a line break", name),
            ));
        }
    }
    Ok(())
}

pub fn write_tag_file(path: &Path, tags: &BTreeMap<String, String>) -> BagResult<()> {
    check_writable(
        tags.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        &path.display().to_string(),
    )?;
    let bytes = serialize_tags(tags.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    std::fs::write(path, bytes).map_err(BagError::io(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<(String, String)> {
        parse_tags(text.as_bytes()).unwrap()
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn parses_simple_tags() {
        let tags = parse("BagIt-Version: 0.96\nTag-File-Character-Encoding: UTF-8\n");
        assert_eq!(
            tags,
            vec![
                pair("BagIt-Version", "0.96"),
                pair("Tag-File-Character-Encoding", "UTF-8")
            ]
        );
    }

    #[test]
    fn contact_name_scenario() {
        let map = into_map(parse("Contact-Name: Jane Doe"));
        assert_eq!(map.len(), 1);
        assert_eq!(map["Contact-Name"], "Jane Doe");
    }

    #[test]
    fn folded_value_is_concatenated_without_separator() {
        let tags = parse(
            "External-Description: Sed ut perspiciatis\n   unde omnis iste\n\tnatus error\nContact-Name: Ed\n",
        );
        assert_eq!(
            tags,
            vec![
                pair(
                    "External-Description",
                    "Sed ut perspiciatisunde omnis istenatus error"
                ),
                pair("Contact-Name", "Ed"),
            ]
        );
    }

    #[test]
    fn blank_lines_do_not_end_folding() {
        let tags = parse("Name: first\n\n   \n  second\n");
        assert_eq!(tags, vec![pair("Name", "firstsecond")]);
    }

    #[test]
    fn value_keeps_colons_after_the_first() {
        let tags = parse("Source-URL: http://example.com:8080/x\n");
        assert_eq!(tags, vec![pair("Source-URL", "http://example.com:8080/x")]);
    }

    #[test]
    fn leading_bom_is_stripped() {
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice(b"BagIt-Version: 0.96\n");
        let tags = parse_tags(raw.as_slice()).unwrap();
        assert_eq!(tags, vec![pair("BagIt-Version", "0.96")]);
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let tags = parse("A: 1\r\nB: 2\r\n");
        assert_eq!(tags, vec![pair("A", "1"), pair("B", "2")]);
    }

    #[test]
    fn duplicate_names_last_wins_in_map() {
        let tags = parse("Contact-Name: first\nContact-Name: second\n");
        assert_eq!(tags.len(), 2);
        assert_eq!(into_map(tags)["Contact-Name"], "second");
    }

    #[test]
    fn continuation_before_any_tag_is_ignored() {
        let tags = parse("   orphan\nName: value");
        assert_eq!(tags, vec![pair("Name", "value")]);
    }

    #[test]
    fn line_without_colon_yields_empty_value() {
        let tags = parse("NoColonHere\n");
        assert_eq!(tags, vec![pair("NoColonHere", "")]);
    }

    #[test]
    fn invalid_utf8_is_a_format_error() {
        let err = parse_tags(&[b'A', b':', b' ', 0xFF, 0xFE][..]).unwrap_err();
        assert!(matches!(err, BagError::Format { .. }));
    }

    #[test]
    fn serialize_sorts_by_name() {
        let out = serialize_tags([("Payload-Oxum", "0.1"), ("Bagging-Date", "2024-01-01")]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Bagging-Date: 2024-01-01\nPayload-Oxum: 0.1\n"
        );
    }

    #[test]
    fn serialize_then_parse_preserves_mapping() {
        let mut original = BTreeMap::new();
        original.insert("Contact-Name".to_string(), "Jane Doe".to_string());
        original.insert("Source-Organization".to_string(), "Archive".to_string());
        original.insert("Payload-Oxum".to_string(), "279164409.1198".to_string());

        let bytes = serialize_tags(original.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let reparsed = into_map(parse_tags(bytes.as_slice()).unwrap());
        assert_eq!(reparsed, original);
    }

    #[test]
    fn multi_line_value_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bag-info.txt");
        let mut tags = BTreeMap::new();
        tags.insert(
            "Source-Organization".to_string(),
            "Archive\nPayload-Oxum: 999.9".to_string(),
        );

        let err = write_tag_file(&path, &tags).unwrap_err();
        assert!(matches!(err, BagError::Format { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn names_that_cannot_round_trip_are_rejected() {
        for name in ["", "Bad:Name", " Leading", "Trailing\t"] {
            assert!(
                check_writable([(name, "value")], "bag-info.txt").is_err(),
                "{:?} accepted",
                name
            );
        }
        assert!(check_writable([("Contact-Name", "Jane: Doe")], "bag-info.txt").is_ok());
        assert!(check_writable([("Note", "carriage\rreturn")], "bag-info.txt").is_err());
    }
}
