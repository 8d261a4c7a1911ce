use bagit_core::{AlgorithmId, BagOptionsOverrides};
use clap::{Args, Parser};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bagit",
    version,
    about = "Create BagIt bags in place, or validate existing ones",
    after_help = "Without --validate each DIR is converted into a bag in place: its \
contents move under data/ and manifests plus bag-info.txt are written next to it."
)]
pub struct Cli {
    /// Hashing worker threads
    #[arg(long, env = "BAGIT_PROCESSES", value_parser = clap::value_parser!(u32).range(1..))]
    pub processes: Option<u32>,

    /// Write log output to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Only log errors
    #[arg(long)]
    pub quiet: bool,

    /// Validate existing bags instead of creating them
    #[arg(long)]
    pub validate: bool,

    /// Compare Payload-Oxum totals only; skip checksum recomputation
    #[arg(long, requires = "validate")]
    pub fast: bool,

    /// JSON file with option overrides (workers, block_size, algorithms)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Checksum algorithm for new manifests (repeatable; default md5)
    #[arg(long = "algorithm", value_name = "ALG")]
    pub algorithms: Vec<AlgorithmId>,

    /// Print one JSON result per bag on stdout
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub info: BagInfoArgs,

    /// Directories to bag or validate
    #[arg(value_name = "DIR", required = true)]
    pub directories: Vec<PathBuf>,
}

impl Cli {
    /// Flag-level overrides, applied after any `--config` file.
    pub fn overrides(&self) -> BagOptionsOverrides {
        BagOptionsOverrides {
            workers: self.processes.map(|n| n as usize),
            block_size: None,
            algorithms: Some(self.algorithms.clone()),
        }
    }
}

/// One optional flag per standard bag-info header.
#[derive(Args, Debug, Clone, Default)]
#[command(next_help_heading = "Bag-info metadata")]
pub struct BagInfoArgs {
    #[arg(long)]
    pub source_organization: Option<String>,
    #[arg(long)]
    pub organization_address: Option<String>,
    #[arg(long)]
    pub contact_name: Option<String>,
    #[arg(long)]
    pub contact_phone: Option<String>,
    #[arg(long)]
    pub contact_email: Option<String>,
    #[arg(long)]
    pub external_description: Option<String>,
    #[arg(long)]
    pub external_identifier: Option<String>,
    #[arg(long)]
    pub bag_size: Option<String>,
    #[arg(long)]
    pub bag_group_identifier: Option<String>,
    #[arg(long)]
    pub bag_count: Option<String>,
    #[arg(long)]
    pub internal_sender_identifier: Option<String>,
    #[arg(long)]
    pub internal_sender_description: Option<String>,
    #[arg(long)]
    pub bagit_profile_identifier: Option<String>,
}

impl BagInfoArgs {
    /// Supplied headers keyed by their bag-info tag name.
    pub fn to_metadata(&self) -> BTreeMap<String, String> {
        let pairs = [
            ("Source-Organization", &self.source_organization),
            ("Organization-Address", &self.organization_address),
            ("Contact-Name", &self.contact_name),
            ("Contact-Phone", &self.contact_phone),
            ("Contact-Email", &self.contact_email),
            ("External-Description", &self.external_description),
            ("External-Identifier", &self.external_identifier),
            ("Bag-Size", &self.bag_size),
            ("Bag-Group-Identifier", &self.bag_group_identifier),
            ("Bag-Count", &self.bag_count),
            ("Internal-Sender-Identifier", &self.internal_sender_identifier),
            ("Internal-Sender-Description", &self.internal_sender_description),
            ("BagIt-Profile-Identifier", &self.bagit_profile_identifier),
        ];
        pairs
            .into_iter()
            .filter_map(|(tag, value)| value.as_ref().map(|v| (tag.to_string(), v.clone())))
            .collect()
    }
}
