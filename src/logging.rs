use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the stderr subscriber used by the binaries. `RUST_LOG` wins over
/// `level` when set.
pub fn init(level: &str) {
    let _ = subscriber(level, None).try_init();
}

/// Like [`init`], and also appends every line to `log_file`, creating it and
/// its parent directory when missing.
pub fn init_with_file(level: &str, log_file: &Path) -> Result<()> {
    let file = open_log_file(log_file)?;
    let _ = subscriber(level, Some(file)).try_init();
    Ok(())
}

fn subscriber(level: &str, log_file: Option<File>) -> impl Subscriber + Send + Sync + 'static {
    // Binaries log under their own crate name.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "kick_archiver={level},archive_channel={level},mirror_comments={level},warn"
        ))
    });

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
