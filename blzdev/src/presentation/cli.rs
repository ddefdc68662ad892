use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "blzdev CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a persisted array of zeros, ones, or a repeated fill value
    Create {
        out: PathBuf,
        #[arg(long, default_value = "float64")]
        dtype: String,
        #[arg(long)]
        len: usize,
        /// "zeros", "ones", or a numeric fill value
        #[arg(long, default_value = "zeros")]
        fill: String,
        #[arg(long, default_value_t = 5)]
        clevel: u8,
        #[arg(long, default_value = "zstd")]
        cname: String,
        #[arg(long, default_value_t = true)]
        shuffle: bool,
    },

    /// Print metadata for a persisted array or table
    Info { rootdir: PathBuf },

    /// Print elements (array) or rows (table) from a persisted entry
    Dump {
        rootdir: PathBuf,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Evaluate a where-expression over a persisted table and print the
    /// matching rows
    Query { rootdir: PathBuf, expr: String },

    /// Recursively list persisted arrays/tables under a directory
    Walk { rootdir: PathBuf },
}
