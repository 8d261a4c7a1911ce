#![no_main]

use bagit_core::tagfile::{into_map, parse_tags, serialize_tags};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(tags) = parse_tags(data) else {
        return;
    };
    let map = into_map(tags);

    // Serialized output must parse back to the same map as long as no value
    // carries a line break of its own.
    if map.values().any(|v| v.contains(['\r', '\n'])) {
        return;
    }
    if map.keys().any(|k| k.starts_with('\u{FEFF}')) {
        return;
    }
    let bytes = serialize_tags(map.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let reparsed = into_map(parse_tags(bytes.as_slice()).expect("serialized tags are UTF-8"));
    assert_eq!(reparsed, map);
});
