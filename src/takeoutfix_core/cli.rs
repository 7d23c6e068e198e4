use clap::{Parser, Subcommand};
use simplelog::LevelFilter;
use std::path::PathBuf;

use crate::takeoutfix_core::walk::{DEFAULT_OUTPUT, DEFAULT_ROOT};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Restore capture timestamps on photos and videos from a takeout export"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable file logging to takeoutfix.log
    #[arg(long = "log", global = true)]
    pub log: bool,

    /// Log level for file logging (debug, info, warn, error)
    #[arg(long, default_value_t = LevelFilter::Debug, global = true)]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stamp photos and videos with their capture time and move them to the output.
    ///
    /// Files whose capture time is found go to <OUTPUT>/all, the rest to
    /// <OUTPUT>/unknown. Existing output files are never overwritten.
    /// Before anything is moved, "name-edited.ext" copies that sit next to
    /// "name.ext" are DELETED (use --keep-edited to prevent this). If any
    /// file of an unhandled type is found, nothing is moved.
    Fix {
        /// Directory containing the export
        #[arg(long, default_value = DEFAULT_ROOT)]
        root: PathBuf,

        /// Output directory (receives all/ and unknown/)
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Do not delete "-edited" copies
        #[arg(long)]
        keep_edited: bool,
    },

    /// List undated and unhandled files without changing anything
    Check {
        /// Directory containing the export
        #[arg(long, default_value = DEFAULT_ROOT)]
        root: PathBuf,

        /// Output directory, skipped when it lies inside the root
        #[arg(long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}
