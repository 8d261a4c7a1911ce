//! Property tests for tag-file folding and round-tripping.

use bagit_core::tagfile::{into_map, parse_tags, serialize_tags};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn tag_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9-]{0,20}"
}

/// Values as a writer would emit them: no newlines, no surrounding space.
fn tag_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9<>@./:_-]([A-Za-z0-9 <>@./:_-]{0,40}[A-Za-z0-9<>@./:_-])?"
}

/// Fragments of a folded value; may carry their own leading/trailing spaces.
fn fragment() -> impl Strategy<Value = String> {
    "[ ]{0,3}[A-Za-z0-9.,;]{1,15}[ ]{0,3}"
}

proptest! {
    #[test]
    fn serialize_then_parse_is_identity_on_maps(
        tags in prop::collection::btree_map(tag_name(), tag_value(), 0..12)
    ) {
        let bytes = serialize_tags(tags.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let reparsed = into_map(parse_tags(bytes.as_slice()).unwrap());
        prop_assert_eq!(reparsed, tags);
    }

    #[test]
    fn folded_value_unfolds_to_trimmed_concatenation(
        name in tag_name(),
        first in fragment(),
        rest in prop::collection::vec(fragment(), 1..6),
        indent in prop::sample::select(vec![" ", "  ", "\t", " \t "]),
    ) {
        prop_assume!(name != "Next-Tag");
        let mut text = format!("{}: {}\n", name, first);
        for piece in &rest {
            text.push_str(indent);
            text.push_str(piece);
            text.push('\n');
        }
        text.push_str("Next-Tag: end");

        let expected: String = std::iter::once(&first)
            .chain(rest.iter())
            .map(|s| s.trim())
            .collect();

        let tags = parse_tags(text.as_bytes()).unwrap();
        let map: BTreeMap<_, _> = into_map(tags);
        prop_assert_eq!(map.get(&name), Some(&expected));
        prop_assert_eq!(map.get("Next-Tag").map(String::as_str), Some("end"));
    }
}
