//! Supported checksum algorithms and their streaming accumulators.
//!
//! The set is closed: a manifest named after anything else is reported and
//! ignored rather than consulted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Checksum algorithm identifier, named as it appears in manifest file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmId {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

/// Name and accumulator constructor for every supported algorithm.
const ALGORITHMS: &[(AlgorithmId, &str, fn() -> Accumulator)] = &[
    (AlgorithmId::Md5, "md5", new_md5),
    (AlgorithmId::Sha1, "sha1", new_sha1),
    (AlgorithmId::Sha256, "sha256", new_sha256),
    (AlgorithmId::Sha512, "sha512", new_sha512),
];

fn new_md5() -> Accumulator {
    Accumulator::Md5(md5::Md5::default())
}

fn new_sha1() -> Accumulator {
    Accumulator::Sha1(sha1::Sha1::default())
}

fn new_sha256() -> Accumulator {
    Accumulator::Sha256(sha2::Sha256::default())
}

fn new_sha512() -> Accumulator {
    Accumulator::Sha512(sha2::Sha512::default())
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    pub fn name(self) -> &'static str {
        Self::entry(self).1
    }

    /// `manifest-<name>.txt`
    pub fn manifest_file_name(self) -> String {
        format!("manifest-{}.txt", self.name())
    }

    /// `tagmanifest-<name>.txt`
    pub fn tagmanifest_file_name(self) -> String {
        format!("tagmanifest-{}.txt", self.name())
    }

    pub(crate) fn accumulator(self) -> Accumulator {
        (Self::entry(self).2)()
    }

    fn entry(self) -> &'static (AlgorithmId, &'static str, fn() -> Accumulator) {
        ALGORITHMS
            .iter()
            .find(|(id, _, _)| *id == self)
            .unwrap_or_else(|| unreachable!("every AlgorithmId has a table entry"))
    }
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALGORITHMS
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(id, _, _)| *id)
            .ok_or_else(|| format!("unknown checksum algorithm '{}'", s))
    }
}

/// Result of matching a file name against `<prefix>-<alg>.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestName {
    Known(AlgorithmId),
    /// Matches the naming pattern but names an unsupported algorithm.
    Unknown(String),
}

/// Classify `file_name` as a manifest (`prefix = "manifest"`) or tag manifest
/// (`prefix = "tagmanifest"`). Returns `None` when the pattern does not match.
pub fn parse_manifest_name(file_name: &str, prefix: &str) -> Option<ManifestName> {
    let alg = file_name
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .strip_suffix(".txt")?;
    if alg.is_empty() {
        return None;
    }
    Some(match alg.parse::<AlgorithmId>() {
        Ok(id) => ManifestName::Known(id),
        Err(_) => ManifestName::Unknown(alg.to_string()),
    })
}

/// Parse a list of algorithm names, rejecting unknown ones.
pub fn parse_algorithm_set<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<BTreeSet<AlgorithmId>, String> {
    names.into_iter().map(str::parse).collect()
}

/// One running digest. Each worker owns its own instances.
pub(crate) enum Accumulator {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
}

impl Accumulator {
    pub(crate) fn update(&mut self, block: &[u8]) {
        match self {
            Self::Md5(h) => md5::Digest::update(h, block),
            Self::Sha1(h) => sha1::Digest::update(h, block),
            Self::Sha256(h) => sha2::Digest::update(h, block),
            Self::Sha512(h) => sha2::Digest::update(h, block),
        }
    }

    pub(crate) fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => hex::encode(md5::Digest::finalize(h)),
            Self::Sha1(h) => hex::encode(sha1::Digest::finalize(h)),
            Self::Sha256(h) => hex::encode(sha2::Digest::finalize(h)),
            Self::Sha512(h) => hex::encode(sha2::Digest::finalize(h)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_digest(id: AlgorithmId) -> String {
        id.accumulator().finalize_hex()
    }

    #[test]
    fn empty_input_digests_match_known_values() {
        assert_eq!(
            empty_digest(AlgorithmId::Md5),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            empty_digest(AlgorithmId::Sha1),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            empty_digest(AlgorithmId::Sha256),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(empty_digest(AlgorithmId::Sha512).len(), 128);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for id in AlgorithmId::ALL {
            assert_eq!(id.name().parse::<AlgorithmId>().unwrap(), id);
        }
        assert!("crc32".parse::<AlgorithmId>().is_err());
        assert!("MD5".parse::<AlgorithmId>().is_err());
    }

    #[test]
    fn manifest_names_are_classified() {
        assert_eq!(
            parse_manifest_name("manifest-md5.txt", "manifest"),
            Some(ManifestName::Known(AlgorithmId::Md5))
        );
        assert_eq!(
            parse_manifest_name("tagmanifest-sha256.txt", "tagmanifest"),
            Some(ManifestName::Known(AlgorithmId::Sha256))
        );
        assert_eq!(
            parse_manifest_name("manifest-whirlpool.txt", "manifest"),
            Some(ManifestName::Unknown("whirlpool".into()))
        );
        assert_eq!(parse_manifest_name("tagmanifest-md5.txt", "manifest"), None);
        assert_eq!(parse_manifest_name("manifest-.txt", "manifest"), None);
        assert_eq!(parse_manifest_name("bag-info.txt", "manifest"), None);
    }

    #[test]
    fn algorithm_set_rejects_unknown_names() {
        let set = parse_algorithm_set(["sha1", "md5", "md5"]).unwrap();
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec![AlgorithmId::Md5, AlgorithmId::Sha1]
        );
        assert!(parse_algorithm_set(["md5", "md4"]).is_err());
    }
}
