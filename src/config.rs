#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, FixedOffset};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_API_BASE: &str = "https://kick.com/api/v2";
pub const DEFAULT_SITE_BASE: &str = "https://kick.com";
pub const DEFAULT_CATALOG_FILE: &str = "kick_archives.json";
pub const DEFAULT_SYNCED_DIR: &str = "comments_github";
pub const DEFAULT_LOCAL_DIR: &str = "comments_local";
pub const DEFAULT_RETENTION_DAYS: u32 = 7;
pub const MAX_RETENTION_DAYS: u32 = 36_500;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Everything a single archive run needs. Built once and handed to each
/// component, nothing reads the environment after this point.
#[derive(Debug, Clone)]
pub struct ArchiverConfig {
    pub channel_id: String,
    pub channel_name: String,
    pub api_base: String,
    pub site_base: String,
    pub start_boundary: DateTime<FixedOffset>,
    pub root: PathBuf,
    pub catalog_file: PathBuf,
    pub synced_dir: PathBuf,
    pub local_dir: PathBuf,
    pub retention_days: u32,
    pub http_timeout: Duration,
    pub max_pages: Option<usize>,
}

impl ArchiverConfig {
    pub fn videos_url(&self) -> String {
        format!("{}/channels/{}/videos", self.api_base, self.channel_name)
    }

    pub fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base, self.channel_id)
    }

    /// Public page of a VOD, keyed by the video's uuid.
    pub fn vod_url(&self, uuid: &str) -> String {
        format!("{}/{}/videos/{}", self.site_base, self.channel_name, uuid)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }
}

/// Where the catalog and transcripts live. Needed by every tool, including
/// the ones that never talk to Kick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub root: PathBuf,
    pub catalog_file: PathBuf,
    pub synced_dir: PathBuf,
    pub local_dir: PathBuf,
}

pub fn resolve_storage_paths(env_path: Option<&Path>, root: Option<PathBuf>) -> Result<StoragePaths> {
    let env_path = env_path.unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    Ok(build_storage_paths(
        |key| lookup_value(key, &file_vars, &env_var_string),
        root,
    ))
}

fn build_storage_paths(lookup: impl Fn(&str) -> Option<String>, root: Option<PathBuf>) -> StoragePaths {
    let root = root
        .or_else(|| lookup("ARCHIVE_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let under_root = |key: &str, default: &str| {
        let value = lookup(key).unwrap_or_else(|| default.to_string());
        root.join(value)
    };
    StoragePaths {
        catalog_file: under_root("CATALOG_FILE", DEFAULT_CATALOG_FILE),
        synced_dir: under_root("COMMENTS_SYNCED_DIR", DEFAULT_SYNCED_DIR),
        local_dir: under_root("COMMENTS_LOCAL_DIR", DEFAULT_LOCAL_DIR),
        root,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub start_boundary: Option<String>,
    pub max_pages: Option<usize>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_config(overrides: ConfigOverrides) -> Result<ArchiverConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_config_with_overrides(&file_vars, env_var_string, overrides)
}

#[cfg(test)]
fn build_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ArchiverConfig> {
    build_config_with_overrides(file_vars, env_lookup, ConfigOverrides::default())
}

/// Builds the configuration from already-read file values and an environment
/// lookup. [`resolve_config`] wires this to the real process environment.
pub fn build_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
) -> Result<ArchiverConfig> {
    let lookup = |key: &str| lookup_value(key, file_vars, &env_lookup);

    let channel_id = lookup("KICK_CHANNEL_ID").ok_or_else(|| anyhow!("KICK_CHANNEL_ID not set"))?;
    let channel_name =
        lookup("KICK_CHANNEL_NAME").ok_or_else(|| anyhow!("KICK_CHANNEL_NAME not set"))?;
    let api_base = lookup("KICK_API_BASE")
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string();
    let site_base = lookup("KICK_SITE_BASE")
        .unwrap_or_else(|| DEFAULT_SITE_BASE.to_string())
        .trim_end_matches('/')
        .to_string();

    let start_raw = overrides
        .start_boundary
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| lookup("ARCHIVE_START"))
        .ok_or_else(|| anyhow!("ARCHIVE_START not set"))?;
    let start_boundary = DateTime::parse_from_rfc3339(&start_raw)
        .with_context(|| format!("parsing ARCHIVE_START {start_raw:?}"))?;

    let StoragePaths {
        root,
        catalog_file,
        synced_dir,
        local_dir,
    } = build_storage_paths(&lookup, overrides.root);

    let retention_days = lookup("RETENTION_DAYS")
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|days| *days <= MAX_RETENTION_DAYS)
        .unwrap_or(DEFAULT_RETENTION_DAYS);
    let http_timeout = lookup("HTTP_TIMEOUT_SECS")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    let max_pages = overrides.max_pages.or_else(|| {
        lookup("MAX_PAGES")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|pages| *pages > 0)
    });

    Ok(ArchiverConfig {
        channel_id,
        channel_name,
        api_base,
        site_base,
        start_boundary,
        root,
        catalog_file,
        synced_dir,
        local_dir,
        retention_days,
        http_timeout,
        max_pages,
    })
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .or_else(|| file_vars.get(key).cloned())
        .filter(|value| !value.trim().is_empty())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
