//! Bag validation: structure, declaration, then contents.
//!
//! Phases run in order and the first failing phase ends validation. Inside
//! full mode every payload entry is checked and all discrepancies are
//! returned together in one [`BagError::Fixity`].

use crate::bag::{Bag, DECLARATION_FILE};
use crate::error::{BagError, BagResult, Discrepancy, StructuralError};
use crate::hasher::{digest_jobs, DigestJob};
use crate::options::BagOptions;
use crate::oxum::PayloadOxum;
use crate::paths;
use crate::payload::{self, PAYLOAD_DIR};
use crate::tagfile::UTF8_BOM;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use tracing::{debug, info, warn};

/// Which contents check to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Compare the declared Payload-Oxum with a stat-only walk of `data/`.
    Fast,
    /// Recompute every recorded checksum.
    #[default]
    Full,
}

/// Summary of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub mode: ValidationMode,
    /// Payload totals observed on disk (fast mode only).
    pub observed_oxum: Option<PayloadOxum>,
    /// Files re-hashed (full mode only).
    pub files_hashed: usize,
}

/// Run every phase against `bag`.
pub fn validate_bag(
    bag: &Bag,
    mode: ValidationMode,
    options: &BagOptions,
) -> BagResult<ValidationReport> {
    validate_structure(bag)?;
    validate_declaration(bag)?;

    let report = match mode {
        ValidationMode::Fast => {
            if !bag.has_oxum() {
                return Err(BagError::ModeUnavailable);
            }
            let observed = validate_oxum(bag)?;
            ValidationReport {
                mode,
                observed_oxum: Some(observed),
                files_hashed: 0,
            }
        }
        ValidationMode::Full => ValidationReport {
            mode,
            observed_oxum: None,
            files_hashed: validate_entries(bag, options)?,
        },
    };
    info!(bag = %bag, ?mode, "bag is valid");
    Ok(report)
}

/// Payload directory, at least one manifest, and `bagit.txt` must exist.
pub fn validate_structure(bag: &Bag) -> BagResult<()> {
    if !bag.path().join(PAYLOAD_DIR).is_dir() {
        return Err(BagError::Structural(StructuralError::MissingPayloadDirectory));
    }
    if !bag.manifest_files().iter().any(|p| p.is_file()) {
        return Err(BagError::Structural(StructuralError::MissingManifest));
    }
    if !bag.path().join(DECLARATION_FILE).is_file() {
        return Err(BagError::Structural(StructuralError::MissingDeclaration));
    }
    Ok(())
}

/// A conformant `bagit.txt` starts without a byte-order mark, even though
/// the tag parser tolerates one.
pub fn validate_declaration(bag: &Bag) -> BagResult<()> {
    let path = bag.path().join(DECLARATION_FILE);
    let file = std::fs::File::open(&path).map_err(BagError::io(&path))?;
    let mut first_line = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut first_line)
        .map_err(BagError::io(&path))?;
    if first_line.starts_with(UTF8_BOM) {
        return Err(BagError::ByteOrderMark);
    }
    Ok(())
}

/// Compare the declared Payload-Oxum with the payload on disk.
///
/// Returns the observed totals. A bag without an oxum has nothing to compare
/// and yields the observed totals unchecked.
pub fn validate_oxum(bag: &Bag) -> BagResult<PayloadOxum> {
    let observed = payload::payload_totals(bag.path())?;
    let Some(declared) = bag.payload_oxum()? else {
        return Ok(observed);
    };
    if declared != observed {
        return Err(BagError::OxumMismatch { declared, observed });
    }
    debug!(bag = %bag, oxum = %observed, "Payload-Oxum matches");
    Ok(observed)
}

/// Full fixity: manifest/filesystem set comparison plus checksum recomputation.
///
/// Returns the number of files hashed.
pub fn validate_entries(bag: &Bag, options: &BagOptions) -> BagResult<usize> {
    let mut discrepancies = Vec::new();

    let comparison = bag.compare_manifests_with_fs()?;
    for path in &comparison.only_in_manifest {
        warn!(bag = %bag, path = %path, "exists in manifest but not in filesystem");
        discrepancies.push(Discrepancy::MissingFromFilesystem { path: path.clone() });
    }
    for path in &comparison.only_on_filesystem {
        warn!(bag = %bag, path = %path, "exists in filesystem but not in manifests");
        discrepancies.push(Discrepancy::UntrackedOnFilesystem { path: path.clone() });
    }

    let missing: BTreeSet<&str> = comparison
        .only_in_manifest
        .iter()
        .map(String::as_str)
        .collect();
    let jobs: Vec<DigestJob<String>> = bag
        .entries()
        .iter()
        .filter(|(path, _)| !missing.contains(path.as_str()))
        .map(|(path, stored)| DigestJob {
            key: path.clone(),
            path: paths::to_native(bag.path(), path),
            algorithms: stored
                .keys()
                .filter(|alg| bag.algorithms().contains(*alg))
                .copied()
                .collect(),
        })
        .collect();
    let files_hashed = jobs.len();

    let mut results = digest_jobs(jobs, options.workers, options.effective_block_size())?;
    results.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, computed) in results {
        let stored = &bag.entries()[&path];
        for (algorithm, actual) in computed.digests {
            let expected = &stored[&algorithm];
            if *expected != actual {
                warn!(
                    bag = %bag,
                    path = %path,
                    %algorithm,
                    stored = %expected,
                    calculated = %actual,
                    "checksum mismatch"
                );
                discrepancies.push(Discrepancy::ChecksumMismatch {
                    path: path.clone(),
                    algorithm,
                    expected: expected.clone(),
                    actual,
                });
            }
        }
    }

    if discrepancies.is_empty() {
        Ok(files_hashed)
    } else {
        Err(BagError::Fixity { discrepancies })
    }
}
