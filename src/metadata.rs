//! Records persisted by the archiver.
//!
//! All structs in this module mirror how archive metadata is serialized to
//! disk: the catalog is a JSON array of [`VodRecord`], each transcript is a
//! [`TranscriptDocument`].

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timefmt::parse_timestamp;

/// One finished broadcast as stored in the catalog.
///
/// `number_of_comments` is the only field written after the record is first
/// built; it stays absent until the transcript has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VodRecord {
    pub id: u64,
    #[serde(default)]
    pub video_id: Option<u64>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub title: String,
    pub start_time: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub video_length: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_comments: Option<usize>,
}

impl VodRecord {
    /// Start and end of the broadcast. Fails when `start_time` is not a
    /// timestamp the archiver can read.
    pub fn time_window(&self) -> Result<TimeWindow> {
        let start = parse_timestamp(&self.start_time)
            .ok_or_else(|| anyhow!("unreadable start_time {:?}", self.start_time))
            .with_context(|| format!("computing time window for VOD {}", self.id))?;
        let end = chrono::Duration::try_milliseconds(self.duration.max(0))
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| anyhow!("duration {} ms of VOD {} is out of range", self.duration, self.id))?;
        Ok(TimeWindow {
            start,
            start_label: self.start_time.clone(),
            end,
        })
    }
}

/// The span of chat history that belongs to a VOD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    /// The start exactly as the catalog stores it; used verbatim as the first
    /// chat cursor.
    pub start_label: String,
    pub end: DateTime<Utc>,
}

/// Chat line kept in a transcript. Field names follow the transcript format:
/// `id` is the sender's user id and `timestamp` is the raw `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// Transcript of a single VOD, stored as `<id>_comments.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptDocument {
    pub video_id: u64,
    pub start_time: String,
    pub video_length: String,
    pub number_of_comments: usize,
    #[serde(default)]
    pub comments: Vec<ChatMessage>,
}

impl TranscriptDocument {
    pub fn new(vod: &VodRecord, comments: Vec<ChatMessage>) -> Self {
        Self {
            video_id: vod.id,
            start_time: vod.start_time.clone(),
            video_length: vod.video_length.clone(),
            number_of_comments: comments.len(),
            comments,
        }
    }
}
