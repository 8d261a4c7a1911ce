//! BagIt packaging and verification.
//!
//! A bag is a directory with a `data/` payload, one or more checksum
//! manifests, a `bagit.txt` declaration, and optional `bag-info.txt` metadata.
//!
//! ```no_run
//! use bagit_core::{make_bag, Bag, BagOptions, ValidationMode};
//! use std::collections::BTreeMap;
//!
//! let mut info = BTreeMap::new();
//! info.insert("Contact-Name".to_string(), "Jane Doe".to_string());
//! make_bag("example-directory", info, &BagOptions::default()).unwrap();
//!
//! let bag = Bag::open("example-directory").unwrap();
//! bag.validate(ValidationMode::Full).unwrap();
//! ```

pub mod algorithm;
pub mod bag;
pub mod diagnostic;
pub mod error;
pub mod fetch;
pub mod hasher;
pub mod make;
pub mod manifest;
pub mod options;
pub mod oxum;
pub mod paths;
pub mod payload;
pub mod tagfile;
pub mod validate;

// Convenience re-exports
pub use algorithm::AlgorithmId;
pub use bag::{Bag, BagDeclaration, BagItVersion, ManifestComparison};
pub use diagnostic::{Diagnostic, Parsed};
pub use error::{BagError, BagResult, Discrepancy, ErrorClass, StructuralError};
pub use fetch::FetchEntry;
pub use hasher::{digest_all, digest_many, FileDigest};
pub use make::{build_fresh, make_bag, STANDARD_BAG_INFO_HEADERS};
pub use options::{BagOptions, BagOptionsOverrides};
pub use oxum::PayloadOxum;
pub use validate::{ValidationMode, ValidationReport};
