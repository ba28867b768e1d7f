//! Blocking client for the two Kick endpoints the archiver reads.
//!
//! The lister and the transcript fetcher only see the [`ArchiveSource`] and
//! [`ChatSource`] traits, so tests can feed them canned pages.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ArchiverConfig;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
const ACCEPT: &str = "application/json, text/plain, */*";
const REFERER: &str = "https://kick.com/";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Failure talking to Kick. All of these count as transient for the callers.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(Box<ureq::Transport>),

    #[error("could not decode response: {0}")]
    Decode(#[from] std::io::Error),

    #[error("expected a JSON array, got {kind}")]
    UnexpectedBody { kind: &'static str },
}

impl From<ureq::Error> for FetchError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::Status(status, response) => FetchError::Status {
                status,
                url: response.get_url().to_string(),
            },
            ureq::Error::Transport(transport) => FetchError::Transport(Box::new(transport)),
        }
    }
}

/// Entry of the channel's VOD list, every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub video: Option<RawVideoRef>,
    #[serde(default)]
    pub session_title: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideoRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub uuid: Option<String>,
}

/// Chat line as returned by the history endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

pub trait ArchiveSource {
    /// Every VOD the channel currently lists, live ones included.
    fn list_videos(&self) -> Result<Vec<RawVideo>, FetchError>;
}

pub trait ChatSource {
    /// One page of chat history starting at `start_time` (RFC 3339).
    fn messages_since(&self, start_time: &str) -> Result<Vec<RawMessage>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    data: Option<MessagesData>,
}

#[derive(Debug, Deserialize)]
struct MessagesData {
    #[serde(default)]
    messages: Option<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub struct KickClient {
    agent: ureq::Agent,
    videos_url: String,
    messages_url: String,
}

impl KickClient {
    pub fn new(config: &ArchiverConfig) -> Self {
        Self::with_urls(config.videos_url(), config.messages_url(), config.http_timeout)
    }

    pub fn with_urls(videos_url: String, messages_url: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            videos_url,
            messages_url,
        }
    }

    fn get(&self, url: &str) -> ureq::Request {
        self.agent
            .get(url)
            .set("Accept", ACCEPT)
            .set("Referer", REFERER)
            .set("Accept-Language", ACCEPT_LANGUAGE)
    }
}

impl ArchiveSource for KickClient {
    fn list_videos(&self) -> Result<Vec<RawVideo>, FetchError> {
        let body: Value = self.get(&self.videos_url).call()?.into_json()?;
        Ok(decode_entries(video_entries(body)?, "VOD"))
    }
}

/// Kick answers errors with a JSON object and status 200 at times, so
/// anything but an array is a failed request.
fn video_entries(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(entries) => Ok(entries),
        other => Err(FetchError::UnexpectedBody {
            kind: value_kind(&other),
        }),
    }
}

impl ChatSource for KickClient {
    fn messages_since(&self, start_time: &str) -> Result<Vec<RawMessage>, FetchError> {
        let envelope: MessagesEnvelope = self
            .get(&self.messages_url)
            .query("start_time", start_time)
            .call()?
            .into_json()?;
        let messages = envelope
            .data
            .and_then(|data| data.messages)
            .unwrap_or_default();
        debug!(start_time, count = messages.len(), "chat page received");
        Ok(decode_entries(messages, "chat message"))
    }
}

/// Decodes each entry on its own so one odd record never sinks the batch.
pub(crate) fn decode_entries<T: DeserializeOwned>(entries: Vec<Value>, label: &str) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<T>(entry) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(error = %err, "skipping undecodable {label}");
                None
            }
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
