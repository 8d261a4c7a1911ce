//! Tunables for bag creation and validation.

use crate::algorithm::AlgorithmId;
use crate::error::{BagError, BagResult};
use crate::hasher::{DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Options shared by creation and full validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagOptions {
    /// Hashing worker threads; `<= 1` hashes sequentially.
    pub workers: usize,
    /// Read block size, clamped to [`MIN_BLOCK_SIZE`]..=[`MAX_BLOCK_SIZE`].
    pub block_size: usize,
    /// Algorithms used when creating a bag. Validation uses whatever the bag
    /// declares.
    pub algorithms: BTreeSet<AlgorithmId>,
}

impl Default for BagOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            block_size: DEFAULT_BLOCK_SIZE,
            algorithms: BTreeSet::from([AlgorithmId::Md5]),
        }
    }
}

/// Partial overrides for `BagOptions`. Used for CLI/config JSON parsing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BagOptionsOverrides {
    pub workers: Option<usize>,
    pub block_size: Option<usize>,
    pub algorithms: Option<Vec<AlgorithmId>>,
}

impl BagOptionsOverrides {
    /// Read overrides from a JSON config file.
    pub fn from_json_file(path: &Path) -> BagResult<Self> {
        let raw = std::fs::read(path).map_err(BagError::io(path))?;
        serde_json::from_slice(&raw)
            .map_err(|e| BagError::format(path.display().to_string(), e.to_string()))
    }
}

impl BagOptions {
    /// Apply overrides onto these values. Only `Some` values override; an
    /// empty algorithm list is ignored.
    pub fn apply(self, overrides: BagOptionsOverrides) -> Self {
        Self {
            workers: overrides.workers.unwrap_or(self.workers),
            block_size: overrides.block_size.unwrap_or(self.block_size),
            algorithms: match overrides.algorithms {
                Some(list) if !list.is_empty() => list.into_iter().collect(),
                _ => self.algorithms,
            },
        }
    }

    pub fn effective_block_size(&self) -> usize {
        self.block_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE)
    }
}
