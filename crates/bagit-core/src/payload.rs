//! Payload directory enumeration.
//!
//! Every file under `data/` at any depth is payload. Symlinks to files count
//! as files; symlinks to directories are not descended.

use crate::error::{BagError, BagResult};
use crate::oxum::PayloadOxum;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};

pub const PAYLOAD_DIR: &str = "data";

/// A payload file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFile {
    /// Manifest key: path relative to the bag root, `/`-separated.
    pub rel_path: String,
    pub full_path: PathBuf,
}

/// Walk `<bag_root>/data` in sorted order.
pub fn payload_files(bag_root: &Path) -> BagResult<Vec<PayloadFile>> {
    let mut files = Vec::new();
    walk(bag_root, &bag_root.join(PAYLOAD_DIR), &mut files)?;
    Ok(files)
}

fn walk(bag_root: &Path, dir: &Path, out: &mut Vec<PayloadFile>) -> BagResult<()> {
    let mut children = fs::read_dir(dir)
        .map_err(BagError::io(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(BagError::io(dir))?;
    children.sort_by_key(|e| e.file_name());

    for child in children {
        let path = child.path();
        let file_type = child.file_type().map_err(BagError::io(&path))?;
        let is_dir = if file_type.is_symlink() {
            // Linked directories are not descended.
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => continue,
                _ => false,
            }
        } else {
            file_type.is_dir()
        };

        if is_dir {
            walk(bag_root, &path, out)?;
        } else if let Some(rel_path) = paths::relative_posix(bag_root, &path) {
            out.push(PayloadFile {
                rel_path,
                full_path: path,
            });
        }
    }
    Ok(())
}

/// Stat every payload file (no hashing) and total the sizes.
pub fn payload_totals(bag_root: &Path) -> BagResult<PayloadOxum> {
    let mut oxum = PayloadOxum::default();
    for file in payload_files(bag_root)? {
        let meta = fs::metadata(&file.full_path).map_err(BagError::io(&file.full_path))?;
        oxum.add_file(meta.len());
    }
    Ok(oxum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_nested_payload_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join(PAYLOAD_DIR);
        fs::create_dir_all(data.join("sub").join("deeper")).unwrap();
        fs::write(data.join("b.txt"), b"bb").unwrap();
        fs::write(data.join("a.txt"), b"a").unwrap();
        fs::write(data.join("sub").join("deeper").join("c.bin"), b"ccc").unwrap();

        let rel: Vec<_> = payload_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|f| f.rel_path)
            .collect();
        assert_eq!(rel, vec!["data/a.txt", "data/b.txt", "data/sub/deeper/c.bin"]);

        let totals = payload_totals(dir.path()).unwrap();
        assert_eq!(totals, PayloadOxum { bytes: 6, files: 3 });
    }

    #[test]
    fn missing_payload_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            payload_files(dir.path()),
            Err(BagError::Io { .. })
        ));
    }

    #[test]
    fn empty_payload_has_zero_totals() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(PAYLOAD_DIR)).unwrap();
        assert_eq!(payload_totals(dir.path()).unwrap(), PayloadOxum::default());
    }
}
