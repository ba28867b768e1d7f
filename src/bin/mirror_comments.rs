#![forbid(unsafe_code)]

//! Copies freshly synced transcripts into the local mirror, optionally pulling
//! the repository first. The mirror is never swept, so it ends up holding the
//! complete history.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use kick_archiver::config::{DEFAULT_ENV_PATH, StoragePaths, resolve_storage_paths};
use kick_archiver::logging;
use kick_archiver::mirror::{pull_repository, sync_comments};
use tracing::{error, info, warn};

/// Log file kept under the root when `--log-file` is not given.
const DEFAULT_LOG_FILE: &str = "auto_pull_log.txt";

#[derive(Debug, Parser)]
#[command(name = "mirror_comments", about = "Copy synced Kick transcripts into the local mirror")]
struct MirrorArgs {
    #[arg(long, default_value = DEFAULT_ENV_PATH)]
    env_file: PathBuf,

    #[arg(long)]
    root: Option<PathBuf>,

    /// Run `git pull --rebase` in the root before copying.
    #[arg(long)]
    pull: bool,

    #[arg(long, default_value = "main")]
    branch: String,

    /// File every log line is appended to, in addition to stderr.
    /// Defaults to `auto_pull_log.txt` under the root.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = MirrorArgs::parse();

    let paths = match resolve_storage_paths(Some(&args.env_file), args.root.clone())
        .context("loading configuration")
    {
        Ok(paths) => paths,
        Err(err) => {
            logging::init(&args.log_level);
            error!(error = %format!("{err:#}"), "mirror_comments failed");
            return ExitCode::FAILURE;
        }
    };

    let log_file = log_path(&args, &paths);
    if let Err(err) = logging::init_with_file(&args.log_level, &log_file) {
        logging::init(&args.log_level);
        warn!(error = %format!("{err:#}"), "logging to stderr only");
    }

    match run(&args, &paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "mirror_comments failed");
            ExitCode::FAILURE
        }
    }
}

fn log_path(args: &MirrorArgs, paths: &StoragePaths) -> PathBuf {
    args.log_file
        .clone()
        .unwrap_or_else(|| paths.root.join(DEFAULT_LOG_FILE))
}

fn run(args: &MirrorArgs, paths: &StoragePaths) -> Result<()> {
    info!(
        synced = %paths.synced_dir.display(),
        local = %paths.local_dir.display(),
        "mirroring comments"
    );

    if args.pull {
        pull_repository(&paths.root, &args.branch)?;
    }
    let report = sync_comments(&paths.synced_dir, &paths.local_dir)?;
    info!(copied = report.copied.len(), "mirror complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn cli_definition_is_valid() {
        MirrorArgs::command().debug_assert();
    }

    fn parse(dir: &std::path::Path, extra: &[&str]) -> MirrorArgs {
        let root = dir.to_str().unwrap().to_string();
        let env_file = dir.join(".env").to_str().unwrap().to_string();
        let mut argv = vec![
            "mirror_comments".to_string(),
            "--root".to_string(),
            root,
            "--env-file".to_string(),
            env_file,
        ];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        MirrorArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn run_copies_into_mirror() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("comments_github"))?;
        fs::write(dir.path().join("comments_github").join("8_comments.json"), "{}")?;

        let args = parse(dir.path(), &[]);
        assert!(!args.pull);
        assert_eq!(args.branch, "main");
        let paths = resolve_storage_paths(Some(&args.env_file), args.root.clone())?;

        run(&args, &paths)?;
        assert!(dir.path().join("comments_local").join("8_comments.json").exists());
        Ok(())
    }

    #[test]
    fn log_file_defaults_under_root() -> Result<()> {
        let dir = tempdir()?;
        let args = parse(dir.path(), &[]);
        let paths = resolve_storage_paths(Some(&args.env_file), args.root.clone())?;
        assert_eq!(log_path(&args, &paths), dir.path().join("auto_pull_log.txt"));

        let custom = dir.path().join("logs").join("mirror.log");
        let args = parse(dir.path(), &["--log-file", custom.to_str().unwrap()]);
        assert_eq!(log_path(&args, &paths), custom);
        Ok(())
    }

    #[test]
    fn logged_run_writes_the_log_file() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("comments_github"))?;
        fs::write(dir.path().join("comments_github").join("9_comments.json"), "{}")?;
        let args = parse(dir.path(), &[]);
        let paths = resolve_storage_paths(Some(&args.env_file), args.root.clone())?;
        let log_file = log_path(&args, &paths);

        logging::init_with_file("info", &log_file)?;
        run(&args, &paths)?;

        assert!(log_file.exists());
        Ok(())
    }
}
