use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::data::{Chunk, TransferDescriptor};
use crate::error::{Error, Result};

/// The destination file of a transfer.
///
/// Every write names its absolute offset, so chunks may arrive in any order.
/// The handle sits behind a mutex because seeking and writing must happen as
/// one step.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Create `output_dir/name.extension`, truncating any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when `output_dir` is missing or not a
    /// directory, and [`Error::Io`] when the file cannot be created.
    pub async fn create(output_dir: &Path, descriptor: &TransferDescriptor) -> Result<Self> {
        let meta = fs::metadata(output_dir).await.map_err(|e| {
            Error::InvalidConfig(format!(
                "output directory {} is not accessible: {e}",
                output_dir.display()
            ))
        })?;
        if !meta.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "{} is not a directory",
                output_dir.display()
            )));
        }

        let path = output_dir.join(descriptor.file_name());
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;

        debug!(path = %path.display(), "destination file created");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` starting at `offset`.
    pub async fn write_at(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    /// Write a fetched chunk at its range start and check the file still exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyChunk`] for a chunk without payload.
    pub async fn write_chunk(&self, chunk: Chunk) -> Result<()> {
        let Chunk { range, payload } = chunk;
        let payload = match payload {
            Some(payload) if !payload.is_empty() => payload,
            _ => return Err(Error::EmptyChunk { index: range.index }),
        };

        self.write_at(range.start, &payload).await?;
        self.verify().await?;

        debug!(
            index = range.index,
            offset = range.start,
            len = payload.len(),
            "chunk written"
        );
        Ok(())
    }

    /// Fail when the file has disappeared from its path.
    pub async fn verify(&self) -> Result<()> {
        fs::metadata(&self.path).await?;
        Ok(())
    }

    /// Drop everything written so far and rewind to offset 0.
    pub async fn reset(&self) -> Result<()> {
        let mut file = self.file.lock().await;
        file.set_len(0).await?;
        file.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }

    /// Flush to stable storage and return the final file length.
    pub async fn finish(&self) -> Result<u64> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_all().await?;
        Ok(file.metadata().await?.len())
    }
}
