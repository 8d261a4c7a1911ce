//! Single-pass multi-digest hashing and the hashing worker pool.
//!
//! Each file is opened once and read in fixed-size blocks; every block is fed
//! to all requested accumulators before the next read. Across files, work is
//! distributed over a fixed number of scoped threads pulling from a bounded
//! queue. Results are only aggregated after every worker has joined.

use crate::algorithm::{Accumulator, AlgorithmId};
use crate::error::{BagError, BagResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use tracing::debug;

pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;
pub const MIN_BLOCK_SIZE: usize = 16 * 1024;
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Digests of one file and the number of bytes actually read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub digests: BTreeMap<AlgorithmId, String>,
    pub bytes: u64,
}

/// One file to hash, tagged with a caller-chosen key.
#[derive(Debug, Clone)]
pub struct DigestJob<K> {
    pub key: K,
    pub path: PathBuf,
    pub algorithms: BTreeSet<AlgorithmId>,
}

/// Hash `path` once with every algorithm in `algorithms`.
pub fn digest_all(path: &Path, algorithms: &BTreeSet<AlgorithmId>) -> BagResult<FileDigest> {
    digest_file(path, algorithms, DEFAULT_BLOCK_SIZE)
}

pub fn digest_file(
    path: &Path,
    algorithms: &BTreeSet<AlgorithmId>,
    block_size: usize,
) -> BagResult<FileDigest> {
    let file = File::open(path).map_err(BagError::io(path))?;
    digest_reader(file, algorithms, block_size).map_err(BagError::io(path))
}

/// Stream `reader` to EOF through one accumulator per algorithm.
pub fn digest_reader<R: Read>(
    mut reader: R,
    algorithms: &BTreeSet<AlgorithmId>,
    block_size: usize,
) -> std::io::Result<FileDigest> {
    let mut accumulators: Vec<(AlgorithmId, Accumulator)> = algorithms
        .iter()
        .map(|&id| (id, id.accumulator()))
        .collect();

    let mut block = vec![0u8; block_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE)];
    let mut bytes = 0u64;
    loop {
        let n = match reader.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        bytes += n as u64;
        for (_, acc) in accumulators.iter_mut() {
            acc.update(&block[..n]);
        }
    }

    Ok(FileDigest {
        digests: accumulators
            .into_iter()
            .map(|(id, acc)| (id, acc.finalize_hex()))
            .collect(),
        bytes,
    })
}

/// Hash every path with the same algorithm set.
///
/// With `workers <= 1` results come back in input order; otherwise order is
/// unspecified and callers sort.
pub fn digest_many(
    paths: &[PathBuf],
    algorithms: &BTreeSet<AlgorithmId>,
    workers: usize,
) -> BagResult<Vec<(PathBuf, FileDigest)>> {
    let jobs = paths
        .iter()
        .map(|p| DigestJob {
            key: p.clone(),
            path: p.clone(),
            algorithms: algorithms.clone(),
        })
        .collect();
    digest_jobs(jobs, workers, DEFAULT_BLOCK_SIZE)
}

/// Run `jobs` sequentially or on a pool of `workers` threads.
///
/// Every job runs even if an earlier one failed; the first error (in
/// completion order) is returned after all workers have joined.
pub fn digest_jobs<K: Send>(
    jobs: Vec<DigestJob<K>>,
    workers: usize,
    block_size: usize,
) -> BagResult<Vec<(K, FileDigest)>> {
    if workers <= 1 || jobs.len() <= 1 {
        debug!(files = jobs.len(), "hashing sequentially");
        return jobs
            .into_iter()
            .map(|job| {
                let digest = digest_file(&job.path, &job.algorithms, block_size)?;
                Ok((job.key, digest))
            })
            .collect();
    }

    let workers = workers.min(jobs.len());
    debug!(files = jobs.len(), workers, "hashing with worker pool");

    let (job_tx, job_rx) = mpsc::sync_channel::<DigestJob<K>>(workers * 2);
    let job_rx = Mutex::new(job_rx);
    let (result_tx, result_rx) = mpsc::channel::<(K, BagResult<FileDigest>)>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = &job_rx;
            let result_tx = result_tx.clone();
            scope.spawn(move || loop {
                let next = match job_rx.lock() {
                    Ok(rx) => rx.recv(),
                    Err(_) => break,
                };
                let Ok(job) = next else { break };
                let outcome = digest_file(&job.path, &job.algorithms, block_size);
                if result_tx.send((job.key, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(result_tx);

        for job in jobs {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);
    });

    let mut results = Vec::new();
    let mut first_error = None;
    for (key, outcome) in result_rx {
        match outcome {
            Ok(digest) => results.push((key, digest)),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}
