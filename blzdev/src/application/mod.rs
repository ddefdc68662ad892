pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use blz_core::Result;
use clap::Parser;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Create {
            out,
            dtype,
            len,
            fill,
            clevel,
            cname,
            shuffle,
        } => handlers::handle_create(out, dtype, len, fill, clevel, cname, shuffle),
        Commands::Info { rootdir } => handlers::handle_info(rootdir),
        Commands::Dump {
            rootdir,
            skip,
            limit,
        } => handlers::handle_dump(rootdir, skip, limit),
        Commands::Query { rootdir, expr } => handlers::handle_query(rootdir, expr),
        Commands::Walk { rootdir } => handlers::handle_walk(rootdir),
    }
}
