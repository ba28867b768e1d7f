//! Comment rate over the course of a VOD.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metadata::ChatMessage;
use crate::timefmt::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteBucket {
    pub minute: DateTime<Utc>,
    pub count: usize,
}

/// Messages per minute, measured from the first message. Minutes without
/// chat are present with a zero count; messages without a readable timestamp
/// are ignored.
pub fn comments_per_minute(comments: &[ChatMessage]) -> Vec<MinuteBucket> {
    let mut timestamps: Vec<DateTime<Utc>> = comments
        .iter()
        .filter_map(|comment| comment.timestamp.as_deref().and_then(parse_timestamp))
        .collect();
    timestamps.sort();

    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Vec::new();
    };

    let mut bins: BTreeMap<i64, usize> = BTreeMap::new();
    for timestamp in &timestamps {
        *bins.entry((*timestamp - first).num_minutes()).or_default() += 1;
    }

    let span = (last - first).num_minutes();
    (0..=span)
        .map(|offset| MinuteBucket {
            minute: first + chrono::Duration::minutes(offset),
            count: bins.get(&offset).copied().unwrap_or(0),
        })
        .collect()
}
