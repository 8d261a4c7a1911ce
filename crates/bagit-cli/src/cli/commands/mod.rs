use super::args::Cli;
use anyhow::Context;
use bagit_core::{BagOptions, BagOptionsOverrides};

pub mod make;
pub mod validate;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let options = resolve_options(&cli)?;
    tracing::debug!(
        workers = options.workers,
        block_size = options.effective_block_size(),
        algorithms = ?options.algorithms,
        "resolved options"
    );
    if cli.validate {
        validate::run(&cli, &options)
    } else {
        make::run(&cli, &options)
    }
}

/// Defaults, then `--config`, then flags.
fn resolve_options(cli: &Cli) -> anyhow::Result<BagOptions> {
    let mut options = BagOptions::default();
    if let Some(path) = &cli.config {
        let overrides = BagOptionsOverrides::from_json_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?;
        options = options.apply(overrides);
    }
    Ok(options.apply(cli.overrides()))
}
