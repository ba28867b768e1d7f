//! Keeps the local mirror up to date with the synced directory.
//!
//! The synced directory is what the repository delivers (and what the
//! retention sweep trims); the mirror is the long-term archive on this
//! machine, so files only ever flow synced → local.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::store::is_transcript_file;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub copied: Vec<PathBuf>,
    pub source_missing: bool,
}

/// Copies every transcript from `synced` whose mirror copy is missing or
/// older. The copy keeps the source's modification time.
pub fn sync_comments(synced: &Path, local: &Path) -> Result<MirrorReport> {
    let mut report = MirrorReport::default();
    if !synced.is_dir() {
        warn!(dir = %synced.display(), "synced comment directory not found");
        report.source_missing = true;
        return Ok(report);
    }

    fs::create_dir_all(local).with_context(|| format!("creating {}", local.display()))?;

    for entry in WalkDir::new(synced)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
    {
        let name = entry.file_name();
        if !is_transcript_file(&name.to_string_lossy()) {
            continue;
        }

        let source = entry.path();
        let target = local.join(name);
        let source_mtime = entry
            .metadata()
            .with_context(|| format!("reading metadata of {}", source.display()))?
            .modified()?;

        let stale = match fs::metadata(&target) {
            Ok(existing) => source_mtime > existing.modified()?,
            Err(_) => true,
        };
        if !stale {
            continue;
        }

        fs::copy(source, &target)
            .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
        File::options()
            .write(true)
            .open(&target)
            .and_then(|file| file.set_modified(source_mtime))
            .with_context(|| format!("preserving mtime of {}", target.display()))?;
        info!(file = %name.to_string_lossy(), "copied into local mirror");
        report.copied.push(target);
    }

    if report.copied.is_empty() {
        info!("no new comment files");
    } else {
        info!(count = report.copied.len(), "comment files copied");
    }
    Ok(report)
}

/// Runs `git -C <repo> pull origin <branch> --rebase`.
pub fn pull_repository(repo: &Path, branch: &str) -> Result<()> {
    info!(repo = %repo.display(), branch, "pulling latest comments");
    let status = Command::new("git")
        .arg("-C")
        .arg(repo)
        .arg("pull")
        .arg("origin")
        .arg(branch)
        .arg("--rebase")
        .stdin(Stdio::null())
        .status()
        .context("running git pull")?;

    if !status.success() {
        bail!("git pull exited with status {status}");
    }
    info!("repository updated");
    Ok(())
}
