use clap::{Parser, Subcommand};

use crate::cli::download::DownloadArg;
use crate::cli::worker::WorkerArg;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "grab",
    version = env!("CARGO_PKG_VERSION"),
    about = "Fetch files over HTTP(S) in parallel byte ranges",
    long_about = None,
    propagate_version = true
)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "d", name = "download", about = "Download a file into a directory")]
    Download(DownloadArg),
    #[command(alias = "w", name = "worker", about = "Run sleeping tasks through the worker pool")]
    Worker(WorkerArg),
    #[command(alias = "v", name = "version", about = "Print the version")]
    Version,
}

/// Parse a strictly positive count.
pub fn parse_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
