#![no_main]

use bagit_core::manifest::parse_manifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(parsed) = parse_manifest(data, "manifest-md5.txt") else {
        return;
    };
    for line in &parsed.entries {
        assert!(!line.digest.is_empty());
        assert!(!line.path.contains("//"));
    }
});
