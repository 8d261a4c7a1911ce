use super::super::args::Cli;
use crate::exit_codes;
use bagit_core::{Bag, BagError, BagOptions, ValidationMode, ValidationReport};
use serde_json::json;
use std::path::Path;

pub fn run(cli: &Cli, options: &BagOptions) -> anyhow::Result<i32> {
    let mode = if cli.fast {
        ValidationMode::Fast
    } else {
        ValidationMode::Full
    };
    let mut code = exit_codes::EXIT_SUCCESS;

    for dir in &cli.directories {
        match open_and_validate(dir, mode, options) {
            Ok((bag, report, pending)) => {
                match mode {
                    ValidationMode::Fast => {
                        tracing::info!("{} valid according to Payload-Oxum", dir.display())
                    }
                    ValidationMode::Full => tracing::info!("{} is valid", dir.display()),
                }
                if cli.json {
                    println!(
                        "{}",
                        json!({
                            "bag": dir,
                            "valid": true,
                            "report": report,
                            "diagnostics": bag.diagnostics(),
                            "pending_fetch": pending,
                        })
                    );
                }
            }
            Err(e) => {
                tracing::error!("{} is invalid: {}", dir.display(), e);
                for discrepancy in e.discrepancies() {
                    tracing::error!(bag = %dir.display(), "{}", discrepancy);
                }
                if cli.json {
                    println!(
                        "{}",
                        json!({
                            "bag": dir,
                            "valid": false,
                            "class": e.class(),
                            "error": e.to_string(),
                            "discrepancies": e.discrepancies(),
                        })
                    );
                }
                code = exit_codes::EXIT_BAG_FAILED;
            }
        }
    }
    Ok(code)
}

fn open_and_validate(
    dir: &Path,
    mode: ValidationMode,
    options: &BagOptions,
) -> Result<(Bag, ValidationReport, Vec<String>), BagError> {
    let bag = Bag::open(dir)?;
    for diagnostic in bag.diagnostics() {
        tracing::warn!(bag = %bag, "{}", diagnostic);
    }

    let report = bag.validate_with(mode, options)?;

    let pending = bag.compare_fetch_with_fs()?;
    for path in &pending {
        tracing::info!(bag = %bag, path = %path, "listed in fetch.txt, not yet in payload");
    }
    Ok((bag, report, pending))
}
