//! Fetches the channel's finished VODs and shapes them into catalog records.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::ArchiverConfig;
use crate::kick::{ArchiveSource, RawVideo};
use crate::metadata::VodRecord;
use crate::pacing::{Pacing, Sleeper};
use crate::timefmt::{format_duration_ms, format_timestamp, parse_timestamp};

/// Longest broadcast the lister accepts; anything above is treated as garbage.
pub const MAX_DURATION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

pub struct ArchiveLister<'a> {
    config: &'a ArchiverConfig,
    source: &'a dyn ArchiveSource,
    sleeper: &'a dyn Sleeper,
    pacing: Pacing,
    start_boundary: DateTime<Utc>,
}

impl<'a> ArchiveLister<'a> {
    pub fn new(
        config: &'a ArchiverConfig,
        source: &'a dyn ArchiveSource,
        sleeper: &'a dyn Sleeper,
        pacing: Pacing,
    ) -> Self {
        Self {
            config,
            source,
            sleeper,
            pacing,
            start_boundary: config.start_boundary.with_timezone(&Utc),
        }
    }

    /// Finished VODs that started at or after the configured boundary, in the
    /// order Kick lists them.
    ///
    /// Never fails: once every attempt is used up the result is empty, which
    /// callers cannot tell apart from "nothing new".
    pub fn fetch(&self) -> Vec<VodRecord> {
        let attempts = self.pacing.list_attempts.max(1);
        for attempt in 1..=attempts {
            match self.source.list_videos() {
                Ok(videos) => {
                    let records = self.select(videos);
                    info!(count = records.len(), "VOD list fetched");
                    return records;
                }
                Err(err) => {
                    warn!(attempt, attempts, error = %err, "VOD list request failed");
                    if attempt < attempts {
                        self.sleeper.sleep(self.pacing.list_backoff);
                    }
                }
            }
        }

        warn!(attempts, "giving up on the VOD list");
        Vec::new()
    }

    fn select(&self, videos: Vec<RawVideo>) -> Vec<VodRecord> {
        videos
            .into_iter()
            .filter(|video| !video.is_live.unwrap_or(false))
            .filter_map(|video| self.to_record(video))
            .collect()
    }

    fn to_record(&self, video: RawVideo) -> Option<VodRecord> {
        let Some(id) = video.id else {
            warn!("skipping VOD without an id");
            return None;
        };
        let Some(started) = video.start_time.as_deref().and_then(parse_timestamp) else {
            warn!(id, start_time = ?video.start_time, "skipping VOD with unreadable start_time");
            return None;
        };
        if started < self.start_boundary {
            return None;
        }
        let Some(duration) = video.duration else {
            warn!(id, "skipping VOD without a duration");
            return None;
        };
        if !(0..=MAX_DURATION_MS).contains(&duration) {
            warn!(id, duration, "skipping VOD with an implausible duration");
            return None;
        }

        let (video_id, uuid) = match video.video {
            Some(inner) => (inner.id, inner.uuid),
            None => (None, None),
        };
        let url = uuid.as_deref().map(|uuid| self.config.vod_url(uuid));

        Some(VodRecord {
            id,
            video_id,
            uuid,
            title: video.session_title.unwrap_or_default(),
            start_time: format_timestamp(started),
            url,
            duration,
            video_length: format_duration_ms(duration),
            number_of_comments: None,
        })
    }
}
