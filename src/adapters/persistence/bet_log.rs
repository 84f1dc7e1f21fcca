//! Bet Log - Append-only JSONL Record of Confirmed Bets
//!
//! Every confirmed accumulator becomes one line in
//! `<data_dir>/<bets_file>`. Lines are self-contained JSON objects, so
//! the log can be streamed, grepped, and survives partial writes of a
//! later line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::ports::repository::{BetRecord, BetRepository};

/// JSONL bet log.
pub struct BetLog {
    /// Full path of the log file.
    path: PathBuf,
}

impl BetLog {
    /// Open (creating the directory if needed) the log at
    /// `data_dir/file_name`.
    pub async fn new(data_dir: &str, file_name: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        Ok(Self {
            path: dir.join(file_name),
        })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BetRepository for BetLog {
    #[instrument(skip(self, record), fields(bet_id = %record.bet_id))]
    async fn append(&self, record: &BetRecord) -> Result<()> {
        let mut json = serde_json::to_string(record).context("Failed to serialize bet record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .context("Failed to open bet log file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write bet record")?;

        file.flush().await.context("Failed to flush bet log")?;

        info!(path = %self.path.display(), "Bet recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_all(&self) -> Result<Vec<BetRecord>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .context("Failed to read bet log")?;

        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BetRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        file = %self.path.display(),
                        error = %e,
                        "Skipping malformed bet record"
                    );
                }
            }
        }

        info!(count = records.len(), "Loaded bet records");
        Ok(records)
    }
}
