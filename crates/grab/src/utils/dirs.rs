use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use home::home_dir;

/// Checked in order under the home directory.
pub const DOWNLOAD_DIR_NAMES: [&str; 4] = ["Downloads", "downloads", "download", "Pobrane"];

/// The user's downloads folder, or the home directory when none exists.
pub fn downloads_dir() -> Result<PathBuf> {
    let home = home_dir().context("Failed to get home directory")?;
    Ok(pick_downloads_dir(&home))
}

pub fn pick_downloads_dir(home: &Path) -> PathBuf {
    DOWNLOAD_DIR_NAMES
        .iter()
        .map(|name| home.join(name))
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| home.to_path_buf())
}
