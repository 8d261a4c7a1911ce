use super::super::args::Cli;
use crate::exit_codes;
use bagit_core::{make_bag, BagOptions};
use serde_json::json;

/// Convert every directory into a bag. A failure on one directory is logged
/// and does not stop the others.
pub fn run(cli: &Cli, options: &BagOptions) -> anyhow::Result<i32> {
    let metadata = cli.info.to_metadata();
    let mut code = exit_codes::EXIT_SUCCESS;

    for dir in &cli.directories {
        match make_bag(dir, metadata.clone(), options) {
            Ok(bag) => {
                tracing::info!(bag = %bag, algorithms = ?bag.algorithms(), "created bag");
                if cli.json {
                    println!(
                        "{}",
                        json!({
                            "bag": dir,
                            "created": true,
                            "info": bag.info(),
                        })
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    bag = %dir.display(),
                    class = ?e.class(),
                    "failed to create bag: {}",
                    e
                );
                if cli.json {
                    println!(
                        "{}",
                        json!({
                            "bag": dir,
                            "created": false,
                            "class": e.class(),
                            "error": e.to_string(),
                        })
                    );
                }
                code = exit_codes::EXIT_BAG_FAILED;
            }
        }
    }
    Ok(code)
}
