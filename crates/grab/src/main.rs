use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::app::{App, Commands};

mod cli;
mod utils;

const DEFAULT_FILTER: &str = "grab=info,grab_fetch=warn,grab_pool=warn";

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let app = App::parse();

    let result = match app.cmd {
        Commands::Download(arg) => cli::download::run(arg).await,
        Commands::Worker(arg) => cli::worker::run(arg).await,
        Commands::Version => {
            cli::version::run();
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
