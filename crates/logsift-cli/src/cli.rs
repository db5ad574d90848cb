use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(
    author,
    version,
    about = "Multi-strategy log message classification engine"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a CSV of (source, log_message) pairs
    Classify {
        /// Input CSV with `source` and `log_message` columns
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Engine configuration file
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Override the configured worker-pool width
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Validate an engine configuration without classifying anything
    CheckConfig {
        /// Engine configuration file
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,
    },

    /// Run the bundled sample batch through the shipped configuration
    Demo {
        /// Engine configuration file; the bundled default when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
