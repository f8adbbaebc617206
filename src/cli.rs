use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slypress",
    about = "Build-time HTL template expander driven by sidecar mock data",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand a source tree of templates into a target tree
    Build {
        /// Source directory containing templates with mock data
        source: String,

        /// Target directory that receives compiled output
        target: String,

        /// Cap on how many times a single file may be recompiled
        #[arg(long, value_name = "N")]
        max_passes: Option<u32>,

        /// List eligible templates without staging or compiling
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a source tree without writing anything
    Check {
        /// Path to the source tree to check (default: current directory)
        #[arg(default_value = ".")]
        source: String,
    },
}
