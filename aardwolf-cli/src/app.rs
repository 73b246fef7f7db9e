use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// aard - viewer for aardwolf analysis artifacts
#[derive(Debug, Parser)]
#[command(name = "aard", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dump the statement records of a static artifact.
    Statements {
        /// Path to the static artifact (`<module>.aard`).
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Dump the events of an execution trace.
    Trace {
        /// Path to the trace artifact (`!execution-trace.aard`).
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Fail on corrupted records instead of skipping them.
        #[arg(long)]
        strict: bool,
    },
}
