//! Purges old transcripts from the synced directory. The local mirror keeps
//! everything and is never looked at here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::store::is_transcript_file;

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    synced_dir: PathBuf,
    retention: chrono::Duration,
}

impl RetentionSweeper {
    pub fn new(synced_dir: &Path, retention: chrono::Duration) -> Self {
        Self {
            synced_dir: synced_dir.to_path_buf(),
            retention,
        }
    }

    /// Deletes transcripts modified before `now - retention` and returns them.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        if !self.synced_dir.is_dir() {
            debug!(dir = %self.synced_dir.display(), "synced directory missing, nothing to sweep");
            return Ok(removed);
        }

        let Some(limit) = now.checked_sub_signed(self.retention) else {
            debug!(days = self.retention.num_days(), "retention reaches past the calendar, nothing to sweep");
            return Ok(removed);
        };
        for entry in WalkDir::new(&self.synced_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
        {
            if !is_transcript_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            let modified = entry
                .metadata()
                .with_context(|| format!("reading metadata of {}", path.display()))?
                .modified()
                .with_context(|| format!("reading mtime of {}", path.display()))?;
            if DateTime::<Utc>::from(modified) < limit {
                fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
                info!(path = %path.display(), "old transcript removed");
                removed.push(path.to_path_buf());
            }
        }

        Ok(removed)
    }
}
