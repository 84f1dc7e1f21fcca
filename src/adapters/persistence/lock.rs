//! Run Lock - Single-instance Guard
//!
//! A lock file holding the owner's PID is created exclusively at
//! startup. A second bot pointed at the same data directory fails to
//! start instead of placing a duplicate accumulator. The file is
//! removed on `release` or when the guard drops.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Held lock file. Dropping the guard removes the file.
#[derive(Debug)]
pub struct RunLock {
    /// Lock file path.
    path: PathBuf,
    /// Whether the file is still ours to remove.
    held: bool,
}

impl RunLock {
    /// Create `data_dir/file_name` exclusively and write our PID into it.
    ///
    /// # Errors
    /// Fails if the file already exists (another run holds it) or the
    /// directory is not writable.
    pub async fn acquire(data_dir: &str, file_name: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;
        let path = dir.join(file_name);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let owner = fs::read_to_string(&path).await.unwrap_or_default();
                bail!(
                    "Another run holds {} (pid {})",
                    path.display(),
                    owner.trim()
                );
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create lock file {}", path.display()));
            }
        };

        file.write_all(std::process::id().to_string().as_bytes())
            .await
            .context("Failed to write lock file")?;
        file.flush().await.context("Failed to flush lock file")?;

        info!(path = %path.display(), pid = std::process::id(), "Run lock acquired");
        Ok(Self { path, held: true })
    }

    /// Lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file.
    pub async fn release(mut self) -> Result<()> {
        self.held = false;
        fs::remove_file(&self.path)
            .await
            .with_context(|| format!("Failed to remove lock file {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Run lock released");
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove lock file");
            }
        }
    }
}
