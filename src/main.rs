mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use cli::{Cli, Commands};

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Build(args) => commands::build(&cli, args),
        Commands::Locate(args) => commands::locate(&cli, args),
    }
}
