use clap::Parser;

mod cli;
pub mod exit_codes;
mod logging;

use cli::args::Cli;
use cli::commands::dispatch;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.quiet, cli.log.as_deref()) {
        eprintln!("fatal: {e:?}");
        std::process::exit(exit_codes::EXIT_CONFIG_ERROR);
    }
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::EXIT_CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
