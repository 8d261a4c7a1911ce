//! Bag creation.
//!
//! [`make_bag`] converts a plain directory in place: its contents move under
//! `data/`, then [`build_fresh`] writes manifests, `bag-info.txt`, and finally
//! `bagit.txt`.

use crate::algorithm::AlgorithmId;
use crate::bag::{Bag, BagItVersion, DECLARATION_FILE, ENCODING_TAG, OXUM_TAG, VERSION_TAG};
use crate::error::{BagError, BagResult, StructuralError};
use crate::hasher::{digest_jobs, DigestJob};
use crate::manifest::serialize_manifest;
use crate::options::BagOptions;
use crate::oxum::PayloadOxum;
use crate::payload::{self, PAYLOAD_DIR};
use crate::tagfile::{check_writable, serialize_tags, write_tag_file};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BAGGING_DATE_TAG: &str = "Bagging-Date";
pub const SOFTWARE_AGENT_TAG: &str = "Bag-Software-Agent";
pub const SOFTWARE_AGENT: &str = concat!("bagit-rs/", env!("CARGO_PKG_VERSION"));

/// Bag-info headers a caller may supply. `Bagging-Date`, `Payload-Oxum`, and
/// `Bag-Software-Agent` are generated.
pub const STANDARD_BAG_INFO_HEADERS: &[&str] = &[
    "Source-Organization",
    "Organization-Address",
    "Contact-Name",
    "Contact-Phone",
    "Contact-Email",
    "External-Description",
    "External-Identifier",
    "Bag-Size",
    "Bag-Group-Identifier",
    "Bag-Count",
    "Internal-Sender-Identifier",
    "Internal-Sender-Description",
    "BagIt-Profile-Identifier",
];

/// Convert `dir` into a bag in place and return the loaded result.
///
/// # Errors
///
/// - `NotADirectory` if `dir` is not a directory
/// - `Format` if a metadata name or value cannot be written as one tag line
/// - `Unwritable` if a top-level entry cannot be moved
/// - `Unreadable` if any file or directory cannot be read for hashing
pub fn make_bag(
    dir: impl AsRef<Path>,
    metadata: BTreeMap<String, String>,
    options: &BagOptions,
) -> BagResult<Bag> {
    let dir = dir.as_ref();
    info!(bag = %dir.display(), "creating bag for directory");
    if !dir.is_dir() {
        return Err(BagError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    if options.algorithms.is_empty() {
        return Err(BagError::NoSupportedAlgorithm);
    }
    check_metadata(&metadata)?;

    let top_level = list_dir(dir)?;
    let unwritable: Vec<PathBuf> = top_level
        .iter()
        .filter(|p| {
            fs::symlink_metadata(p)
                .map(|m| m.permissions().readonly())
                .unwrap_or(true)
        })
        .cloned()
        .collect();
    if !unwritable.is_empty() {
        return Err(BagError::Unwritable { paths: unwritable });
    }

    let mut unreadable = Vec::new();
    find_unreadable(dir, &mut unreadable);
    if !unreadable.is_empty() {
        return Err(BagError::Unreadable { paths: unreadable });
    }

    move_into_payload(dir, &top_level)?;
    build_fresh(dir, metadata, options)
}

/// Write manifests and tag files for a bag whose payload already sits in
/// `<root>/data`.
pub fn build_fresh(
    root: impl AsRef<Path>,
    mut metadata: BTreeMap<String, String>,
    options: &BagOptions,
) -> BagResult<Bag> {
    let root = root.as_ref();
    if !root.join(PAYLOAD_DIR).is_dir() {
        return Err(BagError::Structural(StructuralError::MissingPayloadDirectory));
    }
    if options.algorithms.is_empty() {
        return Err(BagError::NoSupportedAlgorithm);
    }
    check_metadata(&metadata)?;

    let files = payload::payload_files(root)?;
    info!(
        bag = %root.display(),
        files = files.len(),
        workers = options.workers,
        "computing payload checksums"
    );
    let jobs = files
        .into_iter()
        .map(|f| DigestJob {
            key: f.rel_path,
            path: f.full_path,
            algorithms: options.algorithms.clone(),
        })
        .collect();
    let results = digest_jobs(jobs, options.workers, options.effective_block_size())?;

    let mut oxum = PayloadOxum::default();
    let mut per_algorithm: BTreeMap<AlgorithmId, BTreeMap<String, String>> = BTreeMap::new();
    for (path, digest) in results {
        oxum.add_file(digest.bytes);
        for (algorithm, hex) in digest.digests {
            per_algorithm
                .entry(algorithm)
                .or_default()
                .insert(path.clone(), hex);
        }
    }

    for &algorithm in &options.algorithms {
        let name = algorithm.manifest_file_name();
        info!(bag = %root.display(), manifest = %name, "writing manifest");
        let digests = per_algorithm.remove(&algorithm).unwrap_or_default();
        let path = root.join(&name);
        fs::write(&path, serialize_manifest(&digests)).map_err(BagError::io(&path))?;
    }

    metadata.insert(
        BAGGING_DATE_TAG.to_string(),
        chrono::Local::now().format("%Y-%m-%d").to_string(),
    );
    metadata.insert(OXUM_TAG.to_string(), oxum.to_string());
    metadata.insert(SOFTWARE_AGENT_TAG.to_string(), SOFTWARE_AGENT.to_string());
    let info_path = root.join(BagItVersion::V0_96.info_file_name());
    info!(bag = %root.display(), oxum = %oxum, "writing bag-info.txt");
    write_tag_file(&info_path, &metadata)?;

    let declaration = serialize_tags([
        (VERSION_TAG, BagItVersion::V0_96.as_str()),
        (ENCODING_TAG, "UTF-8"),
    ]);
    let declaration_path = root.join(DECLARATION_FILE);
    info!(bag = %root.display(), "writing bagit.txt");
    fs::write(&declaration_path, declaration).map_err(BagError::io(&declaration_path))?;

    Bag::open(root)
}

fn check_metadata(metadata: &BTreeMap<String, String>) -> BagResult<()> {
    check_writable(
        metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        BagItVersion::V0_96.info_file_name(),
    )
}

fn list_dir(dir: &Path) -> BagResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(BagError::io(dir))?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(BagError::io(dir))?;
    entries.sort();
    Ok(entries)
}

/// Collect every directory that cannot be listed and every file that cannot
/// be opened for reading.
fn find_unreadable(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        out.push(dir.to_path_buf());
        return;
    };
    let mut children = Vec::new();
    for entry in read_dir {
        match entry {
            Ok(entry) => children.push(entry.path()),
            Err(_) => {
                out.push(dir.to_path_buf());
                return;
            }
        }
    }
    children.sort();
    for child in children {
        let is_dir = fs::symlink_metadata(&child)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if is_dir {
            find_unreadable(&child, out);
        } else if child.is_file() && fs::File::open(&child).is_err() {
            out.push(child);
        }
    }
}

/// Move every top-level entry into a fresh `data/` directory. Entries go
/// through a staging directory so an existing `data` entry moves too.
fn move_into_payload(dir: &Path, top_level: &[PathBuf]) -> BagResult<()> {
    let staging = dir.join(format!(".bagit-staging-{}", std::process::id()));
    info!(bag = %dir.display(), "creating data dir");
    fs::create_dir(&staging).map_err(BagError::io(&staging))?;

    for entry in top_level {
        let Some(name) = entry.file_name() else {
            continue;
        };
        let target = staging.join(name);
        info!(from = %entry.display(), to = %target.display(), "moving payload entry");
        fs::rename(entry, &target).map_err(BagError::io(entry))?;
    }

    let data = dir.join(PAYLOAD_DIR);
    fs::rename(&staging, &data).map_err(BagError::io(&data))
}
