#![forbid(unsafe_code)]

//! Prints the per-minute comment rate of a saved transcript as JSON.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use kick_archiver::stats::{MinuteBucket, comments_per_minute};
use kick_archiver::store::TranscriptStore;
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "comment_stats", about = "Comment rate of a Kick VOD transcript")]
struct StatsArgs {
    /// Path to a `<id>_comments.json` document.
    transcript: PathBuf,
}

#[derive(Debug, Serialize)]
struct RateReport {
    video_id: u64,
    number_of_comments: usize,
    per_minute: Vec<MinuteBucket>,
}

fn main() -> Result<()> {
    let args = StatsArgs::parse();
    let report = rate_report(&args.transcript)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn rate_report(path: &Path) -> Result<RateReport> {
    let document = TranscriptStore::load(path)?;
    Ok(RateReport {
        video_id: document.video_id,
        number_of_comments: document.number_of_comments,
        per_minute: comments_per_minute(&document.comments),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn report_buckets_a_saved_transcript() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("12_comments.json");
        fs::write(
            &path,
            r#"{
  "video_id": 12,
  "start_time": "2025-11-07T12:00:00+00:00",
  "video_length": "00:05:00",
  "number_of_comments": 3,
  "comments": [
    {"id": 1, "timestamp": "2025-11-07T12:00:05+00:00", "text": "hi"},
    {"id": 2, "timestamp": "2025-11-07T12:00:40+00:00", "text": "gg"},
    {"id": 3, "timestamp": "2025-11-07T12:02:10+00:00", "text": "bye"}
  ]
}
"#,
        )?;

        let report = rate_report(&path)?;
        assert_eq!(report.video_id, 12);
        assert_eq!(report.number_of_comments, 3);
        let counts: Vec<usize> = report.per_minute.iter().map(|bucket| bucket.count).collect();
        assert_eq!(counts, vec![2, 0, 1]);

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["per_minute"].as_array().map(Vec::len), Some(3));
        Ok(())
    }

    #[test]
    fn missing_transcript_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(rate_report(&dir.path().join("absent_comments.json")).is_err());
    }
}
