//! Fixtures shared by the unit tests.

use std::path::Path;
use std::time::Duration;

use chrono::DateTime;

use crate::config::ArchiverConfig;

/// Config rooted at `root` that never reaches a real host.
pub fn test_config(root: &Path, start: &str) -> ArchiverConfig {
    ArchiverConfig {
        channel_id: "56495977".into(),
        channel_name: "chan".into(),
        api_base: "http://127.0.0.1:9/api/v2".into(),
        site_base: "https://kick.com".into(),
        start_boundary: DateTime::parse_from_rfc3339(start).unwrap(),
        root: root.to_path_buf(),
        catalog_file: root.join("kick_archives.json"),
        synced_dir: root.join("comments_github"),
        local_dir: root.join("comments_local"),
        retention_days: 7,
        http_timeout: Duration::from_secs(15),
        max_pages: None,
    }
}
