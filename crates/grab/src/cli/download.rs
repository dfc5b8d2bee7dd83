use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use grab_fetch::core::parse_rate_limit;
use grab_fetch::{Downloader, Progress, ReqwestClient, TransferConfig, TransferMode};
use reqwest::Url;
use tracing::info;

use crate::cli::app::parse_count;
use crate::utils::dirs::downloads_dir;
use crate::utils::ui::tracker::{ProgressTracker, ProgressTrackerConfig, Tracker, TrackerUnit};

#[derive(Args, Clone, Debug)]
pub struct DownloadArg {
    #[arg(help = "http(s) URL of the file", value_parser = parse_url)]
    pub url: Url,

    #[arg(
        short = 'c',
        long = "chunk-size",
        default_value_t = 8,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Size of each range request in MB"
    )]
    pub chunk_size: u64,

    #[arg(
        short,
        long,
        help = "Directory to save into, defaults to the Downloads folder in your home"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short,
        long = "rate-limit",
        value_parser = parse_rate,
        help = "Throughput cap such as 512k or 30m (KiB/MiB/GiB per second)"
    )]
    pub rate_limit: Option<u64>,

    #[arg(
        short,
        long,
        default_value_t = 4,
        value_parser = parse_count,
        help = "Number of ranges fetched at the same time"
    )]
    pub workers: usize,

    #[arg(long, help = "Accept a full 200 response to a range request")]
    pub allow_full_response: bool,
}

/// Accept `http`/`https` URLs with a host. A leading `blob:` is ignored.
pub fn parse_url(s: &str) -> Result<Url, String> {
    let raw = s.trim();
    let raw = raw.strip_prefix("blob:").unwrap_or(raw);
    let url = Url::parse(raw).map_err(|e| format!("invalid URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("URL has no host".to_string());
    }
    Ok(url)
}

fn parse_rate(s: &str) -> Result<u64, String> {
    parse_rate_limit(s).map_err(|e| e.to_string())
}

pub async fn run(arg: DownloadArg) -> Result<()> {
    let output = match arg.output {
        Some(dir) => dir,
        None => downloads_dir()?,
    };

    let tracker = Arc::new(ProgressTracker::new(ProgressTrackerConfig {
        len: None,
        unit: TrackerUnit::Bytes,
    }));
    let bar = Arc::clone(&tracker);

    let config = TransferConfig::new(&output)
        .chunk_size_mb(arg.chunk_size)
        .concurrency(arg.workers)
        .rate_limit(arg.rate_limit)
        .require_partial_content(!arg.allow_full_response)
        .on_progress(Arc::new(move |p: &Progress| bar.update(p)));

    let client = ReqwestClient::new().context("Failed to build HTTP client")?;
    let result = Downloader::new(client, config)
        .download(arg.url.as_str())
        .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracker.abandon();
            return Err(e).with_context(|| format!("Failed to download {}", arg.url));
        }
    };

    let how = match report.mode {
        TransferMode::Chunked { chunks } => format!("{chunks} chunks"),
        TransferMode::Streamed => "single stream".to_string(),
    };
    tracker.finish(Some(format!("done ({how})")));
    info!(path = %report.path.display(), bytes = report.bytes_written, "saved");
    println!("{}", report.path.display());

    Ok(())
}
