//! In-memory view of a bag loaded from disk.
//!
//! A [`Bag`] holds the parsed declaration, metadata tags, and merged manifest
//! entries. It never mutates the directory it was read from; validation
//! re-reads payload files only.

use crate::algorithm::{parse_manifest_name, AlgorithmId, ManifestName};
use crate::diagnostic::Diagnostic;
use crate::error::{BagError, BagResult};
use crate::fetch::{parse_fetch, FetchEntry, FETCH_FILE};
use crate::manifest::{merge_into, parse_manifest, Entries};
use crate::options::BagOptions;
use crate::oxum::PayloadOxum;
use crate::payload;
use crate::tagfile;
use crate::validate::{self, ValidationMode, ValidationReport};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DECLARATION_FILE: &str = "bagit.txt";
pub const VERSION_TAG: &str = "BagIt-Version";
pub const ENCODING_TAG: &str = "Tag-File-Character-Encoding";
pub const OXUM_TAG: &str = "Payload-Oxum";

/// BagIt versions this crate reads. Creation always writes 0.96.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BagItVersion {
    #[serde(rename = "0.95")]
    V0_95,
    #[serde(rename = "0.96")]
    V0_96,
}

impl BagItVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V0_95 => "0.95",
            Self::V0_96 => "0.96",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "0.95" => Some(Self::V0_95),
            "0.96" => Some(Self::V0_96),
            _ => None,
        }
    }

    /// Name of the metadata tag file for this version.
    pub fn info_file_name(self) -> &'static str {
        match self {
            Self::V0_95 => "package-info.txt",
            Self::V0_96 => "bag-info.txt",
        }
    }
}

impl std::fmt::Display for BagItVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `bagit.txt` after version and encoding checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BagDeclaration {
    pub version: BagItVersion,
    pub encoding: String,
}

/// Paths listed on only one side of a manifest/filesystem comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestComparison {
    pub only_in_manifest: Vec<String>,
    pub only_on_filesystem: Vec<String>,
}

impl ManifestComparison {
    pub fn is_empty(&self) -> bool {
        self.only_in_manifest.is_empty() && self.only_on_filesystem.is_empty()
    }
}

/// A bag loaded from a directory.
#[derive(Debug, Clone)]
pub struct Bag {
    path: PathBuf,
    declaration: BagDeclaration,
    tags: BTreeMap<String, String>,
    info: BTreeMap<String, String>,
    algorithms: BTreeSet<AlgorithmId>,
    manifest_files: Vec<PathBuf>,
    tagmanifest_files: Vec<PathBuf>,
    entries: Entries,
    fetch: Vec<FetchEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl Bag {
    /// Load the bag rooted at `path`.
    ///
    /// # Errors
    ///
    /// - `MissingFile` when `bagit.txt` is absent
    /// - `MissingTag` when a required declaration tag is absent
    /// - `UnsupportedVersion` / `UnsupportedEncoding` for the declaration
    /// - `Format` / `Io` while reading tag, manifest, or fetch files
    pub fn open(path: impl AsRef<Path>) -> BagResult<Self> {
        let path = path.as_ref().to_path_buf();
        let declaration_path = path.join(DECLARATION_FILE);
        if !declaration_path.is_file() {
            return Err(BagError::MissingFile {
                path: declaration_path,
            });
        }

        let tags = tagfile::load_tag_file(&declaration_path)?;
        let declaration = parse_declaration(&tags)?;
        debug!(bag = %path.display(), version = %declaration.version, "opened bag declaration");

        let info_path = path.join(declaration.version.info_file_name());
        let info = if info_path.is_file() {
            tagfile::load_tag_file(&info_path)?
        } else {
            BTreeMap::new()
        };

        let mut diagnostics = Vec::new();
        let (manifests, unknown) = discover(&path, "manifest")?;
        for file in unknown {
            warn!(bag = %path.display(), file = %file, "unsupported manifest algorithm");
            diagnostics.push(Diagnostic::UnknownAlgorithm { file });
        }
        let (tagmanifests, _) = discover(&path, "tagmanifest")?;

        let mut entries = Entries::new();
        let mut algorithms = BTreeSet::new();
        let mut manifest_files = Vec::new();
        for (algorithm, file) in manifests {
            let label = algorithm.manifest_file_name();
            let reader = fs::File::open(&file).map_err(BagError::io(&file))?;
            let parsed = parse_manifest(reader, &label)?;
            diagnostics.extend(parsed.diagnostics);
            merge_into(&mut entries, algorithm, parsed.entries, &mut diagnostics);
            algorithms.insert(algorithm);
            manifest_files.push(file);
        }

        let fetch_path = path.join(FETCH_FILE);
        let fetch = if fetch_path.is_file() {
            let reader = fs::File::open(&fetch_path).map_err(BagError::io(&fetch_path))?;
            let parsed = parse_fetch(reader)?;
            diagnostics.extend(parsed.diagnostics);
            parsed.entries
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            declaration,
            tags,
            info,
            algorithms,
            manifest_files,
            tagmanifest_files: tagmanifests.into_iter().map(|(_, p)| p).collect(),
            entries,
            fetch,
            diagnostics,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn declaration(&self) -> &BagDeclaration {
        &self.declaration
    }

    pub fn version(&self) -> BagItVersion {
        self.declaration.version
    }

    pub fn encoding(&self) -> &str {
        &self.declaration.encoding
    }

    /// Tags from `bagit.txt`.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Tags from the metadata file (`bag-info.txt` or `package-info.txt`).
    pub fn info(&self) -> &BTreeMap<String, String> {
        &self.info
    }

    /// Algorithms with a manifest file present.
    pub fn algorithms(&self) -> &BTreeSet<AlgorithmId> {
        &self.algorithms
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn manifest_files(&self) -> &[PathBuf] {
        &self.manifest_files
    }

    pub fn tagmanifest_files(&self) -> &[PathBuf] {
        &self.tagmanifest_files
    }

    pub fn fetch_entries(&self) -> &[FetchEntry] {
        &self.fetch
    }

    /// Parse-time diagnostics (malformed lines, duplicates, unknown algorithms).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_oxum(&self) -> bool {
        self.info.contains_key(OXUM_TAG)
    }

    /// The declared Payload-Oxum, if any.
    pub fn payload_oxum(&self) -> BagResult<Option<PayloadOxum>> {
        self.info
            .get(OXUM_TAG)
            .map(|v| v.parse::<PayloadOxum>())
            .transpose()
    }

    /// Manifest keys of every file under `data/`.
    pub fn payload_files(&self) -> BagResult<Vec<String>> {
        Ok(payload::payload_files(&self.path)?
            .into_iter()
            .map(|f| f.rel_path)
            .collect())
    }

    /// Paths listed in `fetch.txt`.
    pub fn files_to_be_fetched(&self) -> Vec<String> {
        self.fetch.iter().map(|e| e.path.clone()).collect()
    }

    /// Set-compare manifest paths with the payload directory.
    pub fn compare_manifests_with_fs(&self) -> BagResult<ManifestComparison> {
        let on_fs: BTreeSet<String> = self.payload_files()?.into_iter().collect();
        let in_manifest: BTreeSet<&String> = self.entries.keys().collect();

        Ok(ManifestComparison {
            only_in_manifest: in_manifest
                .iter()
                .filter(|p| !on_fs.contains(p.as_str()))
                .map(|p| p.to_string())
                .collect(),
            only_on_filesystem: on_fs
                .iter()
                .filter(|p| !in_manifest.contains(p))
                .cloned()
                .collect(),
        })
    }

    /// Fetch paths that are not yet present in the payload directory.
    pub fn compare_fetch_with_fs(&self) -> BagResult<Vec<String>> {
        let on_fs: BTreeSet<String> = self.payload_files()?.into_iter().collect();
        let pending: BTreeSet<String> = self
            .files_to_be_fetched()
            .into_iter()
            .filter(|p| !on_fs.contains(p))
            .collect();
        Ok(pending.into_iter().collect())
    }

    /// Validate with default options.
    pub fn validate(&self, mode: ValidationMode) -> BagResult<ValidationReport> {
        validate::validate_bag(self, mode, &BagOptions::default())
    }

    pub fn validate_with(
        &self,
        mode: ValidationMode,
        options: &BagOptions,
    ) -> BagResult<ValidationReport> {
        validate::validate_bag(self, mode, options)
    }

    pub fn is_valid(&self, mode: ValidationMode) -> bool {
        self.validate(mode).is_ok()
    }
}

impl std::fmt::Display for Bag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn parse_declaration(tags: &BTreeMap<String, String>) -> BagResult<BagDeclaration> {
    let required = |tag: &str| {
        tags.get(tag).cloned().ok_or_else(|| BagError::MissingTag {
            tag: tag.to_string(),
        })
    };
    let version = required(VERSION_TAG)?;
    let encoding = required(ENCODING_TAG)?;

    let Some(version) = BagItVersion::parse(&version) else {
        return Err(BagError::UnsupportedVersion { version });
    };
    if !encoding.eq_ignore_ascii_case("utf-8") {
        return Err(BagError::UnsupportedEncoding { encoding });
    }
    Ok(BagDeclaration { version, encoding })
}

/// Find `<prefix>-<alg>.txt` files in the bag root, sorted by algorithm.
/// Unknown algorithm names are returned separately by file name.
fn discover(root: &Path, prefix: &str) -> BagResult<(Vec<(AlgorithmId, PathBuf)>, Vec<String>)> {
    let mut known = Vec::new();
    let mut unknown = Vec::new();
    for entry in fs::read_dir(root).map_err(BagError::io(root))? {
        let entry = entry.map_err(BagError::io(root))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        match parse_manifest_name(&name, prefix) {
            Some(ManifestName::Known(id)) => known.push((id, path)),
            Some(ManifestName::Unknown(_)) => unknown.push(name),
            None => {}
        }
    }
    known.sort();
    unknown.sort();
    Ok((known, unknown))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn minimal_bag(version: &str, encoding: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            DECLARATION_FILE,
            &format!("BagIt-Version: {}\nTag-File-Character-Encoding: {}\n", version, encoding),
        );
        write(dir.path(), "data/empty.txt", "");
        write(
            dir.path(),
            "manifest-md5.txt",
            "d41d8cd98f00b204e9800998ecf8427e  data/empty.txt\n",
        );
        dir
    }

    #[test]
    fn missing_declaration_is_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Bag::open(dir.path()), Err(BagError::MissingFile { .. })));
    }

    #[test]
    fn unsupported_version_and_encoding() {
        let dir = minimal_bag("0.97", "UTF-8");
        assert!(matches!(
            Bag::open(dir.path()),
            Err(BagError::UnsupportedVersion { version }) if version == "0.97"
        ));

        let dir = minimal_bag("0.96", "latin-1");
        assert!(matches!(
            Bag::open(dir.path()),
            Err(BagError::UnsupportedEncoding { .. })
        ));

        let dir = minimal_bag("0.96", "utf-8");
        assert!(Bag::open(dir.path()).is_ok());
    }

    #[test]
    fn missing_required_tag() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), DECLARATION_FILE, "BagIt-Version: 0.96\n");
        assert!(matches!(
            Bag::open(dir.path()),
            Err(BagError::MissingTag { tag }) if tag == ENCODING_TAG
        ));
    }

    #[test]
    fn legacy_version_reads_package_info() {
        let dir = minimal_bag("0.95", "UTF-8");
        write(dir.path(), "package-info.txt", "Contact-Name: Ed\n");
        write(dir.path(), "bag-info.txt", "Contact-Name: Ignored\n");
        let bag = Bag::open(dir.path()).unwrap();
        assert_eq!(bag.version(), BagItVersion::V0_95);
        assert_eq!(bag.info()["Contact-Name"], "Ed");
    }

    #[test]
    fn absent_info_file_is_empty_metadata() {
        let dir = minimal_bag("0.96", "UTF-8");
        let bag = Bag::open(dir.path()).unwrap();
        assert!(bag.info().is_empty());
        assert!(!bag.has_oxum());
        assert_eq!(bag.payload_oxum().unwrap(), None);
    }

    #[test]
    fn algorithms_follow_manifest_files() {
        let dir = minimal_bag("0.96", "UTF-8");
        write(
            dir.path(),
            "manifest-sha1.txt",
            "da39a3ee5e6b4b0d3255bfef95601890afd80709  data/empty.txt\n",
        );
        write(dir.path(), "manifest-whirlpool.txt", "abc  data/empty.txt\n");
        write(dir.path(), "tagmanifest-md5.txt", "abc  bagit.txt\n");

        let bag = Bag::open(dir.path()).unwrap();
        assert_eq!(
            bag.algorithms().iter().copied().collect::<Vec<_>>(),
            vec![AlgorithmId::Md5, AlgorithmId::Sha1]
        );
        assert_eq!(bag.manifest_files().len(), 2);
        assert_eq!(bag.tagmanifest_files().len(), 1);
        assert_eq!(bag.entries()["data/empty.txt"].len(), 2);
        assert_eq!(
            bag.diagnostics(),
            &[Diagnostic::UnknownAlgorithm {
                file: "manifest-whirlpool.txt".into()
            }]
        );
    }

    #[test]
    fn compare_manifests_reports_both_sides() {
        let dir = minimal_bag("0.96", "UTF-8");
        write(
            dir.path(),
            "manifest-md5.txt",
            "d41d8cd98f00b204e9800998ecf8427e  data/empty.txt\nabc  data/gone.txt\n",
        );
        write(dir.path(), "data/extra.txt", "x");

        let bag = Bag::open(dir.path()).unwrap();
        let cmp = bag.compare_manifests_with_fs().unwrap();
        assert_eq!(cmp.only_in_manifest, vec!["data/gone.txt"]);
        assert_eq!(cmp.only_on_filesystem, vec!["data/extra.txt"]);
    }

    #[test]
    fn fetch_entries_diff_against_payload() {
        let dir = minimal_bag("0.96", "UTF-8");
        write(
            dir.path(),
            FETCH_FILE,
            "http://example.org/empty - data/empty.txt\nhttp://example.org/big 1024 data/big.bin\n",
        );
        let bag = Bag::open(dir.path()).unwrap();
        assert_eq!(bag.fetch_entries().len(), 2);
        assert_eq!(bag.compare_fetch_with_fs().unwrap(), vec!["data/big.bin"]);
    }
}
