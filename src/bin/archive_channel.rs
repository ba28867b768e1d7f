#![forbid(unsafe_code)]

//! Runs one archive pass for the configured Kick channel: new VODs get their
//! chat transcript saved and are added to the catalog, then old transcripts
//! are swept from the synced directory. Meant to run on a schedule.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use kick_archiver::archiver::Archiver;
use kick_archiver::config::{
    ArchiverConfig, ConfigOverrides, DEFAULT_ENV_PATH, build_config_with_overrides, read_env_file,
};
use kick_archiver::kick::KickClient;
use kick_archiver::logging;
use kick_archiver::pacing::ThreadSleeper;
use kick_archiver::store::{CommentDirResolver, PreferLocal, SyncedOnly};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "archive_channel", about = "Archive new Kick VODs and their chat")]
struct ArchiveArgs {
    /// Env file holding the channel settings.
    #[arg(long, default_value = DEFAULT_ENV_PATH)]
    env_file: PathBuf,

    /// Base directory for the catalog and comment folders.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Only VODs that started at or after this RFC 3339 time are archived.
    #[arg(long)]
    start: Option<String>,

    /// Stop each chat walk after this many page requests.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Always write transcripts to the synced directory.
    #[arg(long)]
    synced_only: bool,

    /// Save the catalog once at the end of the run only.
    #[arg(long)]
    persist_at_end: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = ArchiveArgs::parse();
    logging::init(&args.log_level);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %format!("{err:#}"), "archive_channel failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(
    args: &ArchiveArgs,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ArchiverConfig> {
    let file_vars = read_env_file(&args.env_file)?;
    build_config_with_overrides(
        &file_vars,
        env_lookup,
        ConfigOverrides {
            root: args.root.clone(),
            start_boundary: args.start.clone(),
            max_pages: args.max_pages,
            env_path: Some(args.env_file.clone()),
        },
    )
    .context("loading configuration")
}

fn run(args: ArchiveArgs) -> Result<bool> {
    let config = load_config(&args, |key| {
        std::env::var(key).ok().filter(|value| !value.trim().is_empty())
    })?;

    info!(
        channel = %config.channel_name,
        start = %config.start_boundary.to_rfc3339(),
        catalog = %config.catalog_file.display(),
        "archiving channel"
    );

    let client = KickClient::new(&config);
    let sleeper = ThreadSleeper;
    let prefer_local = PreferLocal {
        local: config.local_dir.clone(),
        synced: config.synced_dir.clone(),
    };
    let synced_only = SyncedOnly {
        synced: config.synced_dir.clone(),
    };
    let resolver: &dyn CommentDirResolver = if args.synced_only {
        &synced_only
    } else {
        &prefer_local
    };

    let report = Archiver::new(&config, &client, &client, resolver, &sleeper)
        .persist_each_vod(!args.persist_at_end)
        .run();

    Ok(report.succeeded())
}
