mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    match Cli::parse().command {
        Commands::Build {
            source,
            target,
            max_passes,
            dry_run,
        } => commands::build::run(source, target, max_passes, dry_run),
        Commands::Check { source } => commands::check::run(source),
    }
}
