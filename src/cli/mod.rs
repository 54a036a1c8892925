//! Command line interface for lrustore.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lrustore - key/value store with an LRU cache in front of durable storage.
#[derive(Parser, Debug)]
#[command(name = "lrustore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "lrustore.toml")]
    pub config: PathBuf,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Writes a default configuration in the target directory.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Stores a value. The value is parsed as JSON, or kept as a string.
    Put {
        /// Key to write.
        key: String,

        /// Value to store.
        value: String,
    },

    /// Prints the value stored under a key as JSON.
    Get {
        /// Key to read.
        key: String,
    },

    /// Replays the reference LRU scenario on an in-memory store.
    Demo {
        /// Cache capacity.
        #[arg(long, default_value_t = 3)]
        capacity: usize,
    },

    /// Shows the version.
    Version,
}
