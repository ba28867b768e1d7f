//! Rebuilds the full chat transcript of a VOD from Kick's time-windowed chat
//! history endpoint.
//!
//! The endpoint only answers "messages from `start_time` onward", one page at
//! a time. The fetcher walks a [`Cursor`] across the VOD's window:
//!
//! * a page with messages moves the cursor one second past the last message,
//!   so the next page never repeats it;
//! * an empty page (or a failed request) nudges the cursor forward by a fixed
//!   step, so silent stretches of the stream do not stall the walk;
//! * a page whose last message has no readable `created_at` ends the walk.
//!
//! The walk stops once the cursor reaches the end of the window. Messages
//! inside a silent gap shorter than the empty-page step can be skipped.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::kick::{ChatSource, RawMessage};
use crate::metadata::{ChatMessage, TimeWindow};
use crate::pacing::{Pacing, Sleeper};
use crate::timefmt::{format_timestamp, parse_timestamp};

/// Position of the next chat history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    position: DateTime<Utc>,
    query: String,
}

impl Cursor {
    /// The first request reuses the VOD's stored start string verbatim.
    pub fn start(window: &TimeWindow) -> Self {
        Self {
            position: window.start,
            query: window.start_label.clone(),
        }
    }

    pub fn at(position: DateTime<Utc>) -> Self {
        Self {
            position,
            query: format_timestamp(position),
        }
    }

    pub fn position(&self) -> DateTime<Utc> {
        self.position
    }

    /// Value sent as the `start_time` query parameter.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn reached(&self, end: DateTime<Utc>) -> bool {
        self.position >= end
    }

    fn advanced_by(&self, step: chrono::Duration) -> Self {
        Self::at(self.position + step)
    }
}

/// What a single page means for the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Empty,
    /// Timestamp of the page's last message.
    Through(DateTime<Utc>),
    /// The last message carries no usable timestamp.
    Malformed,
}

pub fn classify_page(page: &[RawMessage]) -> PageOutcome {
    match page.last() {
        None => PageOutcome::Empty,
        Some(last) => match last.created_at.as_deref().and_then(parse_timestamp) {
            Some(timestamp) => PageOutcome::Through(timestamp),
            None => PageOutcome::Malformed,
        },
    }
}

/// Where the walk goes after `outcome`, or `None` when it must stop.
pub fn next_cursor(cursor: &Cursor, outcome: &PageOutcome, pacing: &Pacing) -> Option<Cursor> {
    let empty_step = to_chrono(pacing.empty_page_advance);
    match outcome {
        PageOutcome::Empty => Some(cursor.advanced_by(empty_step)),
        PageOutcome::Through(last) => {
            let next = *last + chrono::Duration::seconds(1);
            if next > cursor.position {
                Some(Cursor::at(next))
            } else {
                // A page that ends before the cursor would be served again forever.
                Some(cursor.advanced_by(empty_step))
            }
        }
        PageOutcome::Malformed => None,
    }
}

impl From<RawMessage> for ChatMessage {
    fn from(raw: RawMessage) -> Self {
        ChatMessage {
            id: raw.user_id,
            timestamp: raw.created_at,
            text: raw.content.unwrap_or_default(),
        }
    }
}

pub struct TranscriptFetcher<'a> {
    source: &'a dyn ChatSource,
    sleeper: &'a dyn Sleeper,
    pacing: Pacing,
    max_pages: Option<usize>,
}

impl<'a> TranscriptFetcher<'a> {
    pub fn new(source: &'a dyn ChatSource, sleeper: &'a dyn Sleeper, pacing: Pacing) -> Self {
        Self {
            source,
            sleeper,
            pacing,
            max_pages: None,
        }
    }

    /// Stops the walk after `max_pages` requests. Unbounded when `None`.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Every message of the window in the order Kick returned them.
    pub fn fetch(&self, window: &TimeWindow) -> Vec<ChatMessage> {
        let mut transcript = Vec::new();
        let mut cursor = Cursor::start(window);
        let mut pages = 0usize;

        while !cursor.reached(window.end) {
            if let Some(limit) = self.max_pages
                && pages >= limit
            {
                warn!(limit, cursor = cursor.query(), "chat page limit reached, transcript truncated");
                break;
            }
            pages += 1;

            debug!(cursor = cursor.query(), end = %window.end, "requesting chat page");
            let page = match self.source.messages_since(cursor.query()) {
                Ok(page) => page,
                Err(err) => {
                    warn!(cursor = cursor.query(), error = %err, "chat page request failed");
                    Vec::new()
                }
            };

            let outcome = classify_page(&page);
            transcript.extend(page.into_iter().map(ChatMessage::from));

            match next_cursor(&cursor, &outcome, &self.pacing) {
                Some(next) => cursor = next,
                None => {
                    warn!(cursor = cursor.query(), "last chat message has no timestamp, stopping");
                    break;
                }
            }
            self.sleeper.sleep(self.pacing.page_pause);
        }

        info!(messages = transcript.len(), pages, "chat transcript collected");
        transcript
    }
}

fn to_chrono(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kick::FetchError;
    use crate::pacing::testing::RecordingSleeper;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 7, 12, 0, 0).unwrap()
    }

    fn window(seconds: i64) -> TimeWindow {
        TimeWindow {
            start: t0(),
            start_label: format_timestamp(t0()),
            end: t0() + chrono::Duration::seconds(seconds),
        }
    }

    fn message(user: u64, at: DateTime<Utc>, text: &str) -> RawMessage {
        RawMessage {
            user_id: Some(user),
            created_at: Some(format_timestamp(at)),
            content: Some(text.to_string()),
        }
    }

    fn secs(n: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::seconds(n)
    }

    /// Plays back prepared pages and remembers every cursor it was asked for.
    #[derive(Default)]
    struct ScriptedChat {
        pages: RefCell<VecDeque<Result<Vec<RawMessage>, FetchError>>>,
        queries: RefCell<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(pages: Vec<Result<Vec<RawMessage>, FetchError>>) -> Self {
            Self {
                pages: RefCell::new(pages.into()),
                queries: RefCell::default(),
            }
        }
    }

    impl ChatSource for ScriptedChat {
        fn messages_since(&self, start_time: &str) -> Result<Vec<RawMessage>, FetchError> {
            self.queries.borrow_mut().push(start_time.to_string());
            self.pages.borrow_mut().pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Serves a fixed history the way Kick does: up to `page_size` messages at
    /// or after the requested time.
    struct HistoryChat {
        history: Vec<RawMessage>,
        page_size: usize,
        requests: RefCell<usize>,
    }

    impl ChatSource for HistoryChat {
        fn messages_since(&self, start_time: &str) -> Result<Vec<RawMessage>, FetchError> {
            *self.requests.borrow_mut() += 1;
            let from = parse_timestamp(start_time).expect("cursor must stay parseable");
            Ok(self
                .history
                .iter()
                .filter(|msg| {
                    parse_timestamp(msg.created_at.as_deref().unwrap()).unwrap() >= from
                })
                .take(self.page_size)
                .cloned()
                .collect())
        }
    }

    fn timeout() -> FetchError {
        FetchError::Decode(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"))
    }

    #[test]
    fn gap_free_history_is_returned_once_in_order() {
        let history: Vec<RawMessage> = (0..20)
            .map(|i| message(i as u64, secs(i * 2), &format!("msg {i}")))
            .collect();
        let chat = HistoryChat {
            history: history.clone(),
            page_size: 3,
            requests: RefCell::new(0),
        };
        let sleeper = RecordingSleeper::default();
        let fetcher = TranscriptFetcher::new(&chat, &sleeper, Pacing::default());

        let transcript = fetcher.fetch(&window(40));

        let texts: Vec<&str> = transcript.iter().map(|msg| msg.text.as_str()).collect();
        let expected: Vec<String> = (0..20).map(|i| format!("msg {i}")).collect();
        assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(sleeper.count(), *chat.requests.borrow());
    }

    #[test]
    fn empty_page_then_messages_moves_cursor_past_last_message() {
        let chat = ScriptedChat::new(vec![
            Ok(Vec::new()),
            Ok(vec![message(1, secs(12), "first"), message(2, secs(30), "second")]),
        ]);
        let sleeper = RecordingSleeper::default();
        let transcript =
            TranscriptFetcher::new(&chat, &sleeper, Pacing::default()).fetch(&window(33));

        let queries = chat.queries.borrow();
        assert_eq!(queries[0], "2025-11-07T12:00:00+00:00");
        assert_eq!(queries[1], "2025-11-07T12:00:05+00:00");
        assert_eq!(queries[2], "2025-11-07T12:00:31+00:00");
        assert_eq!(queries.len(), 3);
        assert_eq!(transcript.len(), 2);
        assert_eq!(sleeper.total(), Duration::from_secs(3));
    }

    #[test]
    fn missing_timestamp_on_last_message_stops_the_walk() {
        let mut broken = message(3, secs(4), "no time");
        broken.created_at = None;
        let chat = ScriptedChat::new(vec![
            Ok(vec![message(1, secs(1), "ok"), broken]),
            Ok(vec![message(9, secs(10), "never fetched")]),
        ]);
        let sleeper = RecordingSleeper::default();
        let transcript =
            TranscriptFetcher::new(&chat, &sleeper, Pacing::default()).fetch(&window(3600));

        assert_eq!(chat.queries.borrow().len(), 1);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].timestamp, None);
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn failed_request_counts_as_empty_page() {
        let chat = ScriptedChat::new(vec![Err(timeout()), Ok(vec![message(1, secs(7), "late")])]);
        let sleeper = RecordingSleeper::default();
        let transcript =
            TranscriptFetcher::new(&chat, &sleeper, Pacing::default()).fetch(&window(9));

        let queries = chat.queries.borrow();
        assert_eq!(queries[1], "2025-11-07T12:00:05+00:00");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].id, Some(1));
    }

    #[test]
    fn silent_window_walks_to_the_end() {
        let chat = ScriptedChat::default();
        let sleeper = RecordingSleeper::default();
        let transcript =
            TranscriptFetcher::new(&chat, &sleeper, Pacing::default()).fetch(&window(20));

        assert!(transcript.is_empty());
        assert_eq!(chat.queries.borrow().len(), 4);
    }

    #[test]
    fn zero_length_window_makes_no_requests() {
        let chat = ScriptedChat::default();
        let sleeper = RecordingSleeper::default();
        let transcript =
            TranscriptFetcher::new(&chat, &sleeper, Pacing::default()).fetch(&window(0));
        assert!(transcript.is_empty());
        assert!(chat.queries.borrow().is_empty());
    }

    #[test]
    fn page_limit_truncates() {
        let chat = ScriptedChat::default();
        let sleeper = RecordingSleeper::default();
        TranscriptFetcher::new(&chat, &sleeper, Pacing::default())
            .with_max_pages(Some(2))
            .fetch(&window(3600));
        assert_eq!(chat.queries.borrow().len(), 2);
    }

    #[test]
    fn first_query_uses_stored_start_verbatim() {
        let chat = ScriptedChat::default();
        let sleeper = RecordingSleeper::default();
        let mut win = window(1);
        win.start_label = "2025-11-07T12:00:00Z".into();
        TranscriptFetcher::new(&chat, &sleeper, Pacing::default()).fetch(&win);
        assert_eq!(chat.queries.borrow()[0], "2025-11-07T12:00:00Z");
    }

    #[test]
    fn stale_page_cannot_rewind_the_cursor() {
        let cursor = Cursor::at(secs(60));
        let next = next_cursor(&cursor, &PageOutcome::Through(secs(10)), &Pacing::default())
            .unwrap();
        assert_eq!(next.position(), secs(65));
    }

    #[test]
    fn projection_defaults_missing_text() {
        let projected = ChatMessage::from(RawMessage {
            user_id: None,
            created_at: Some("2025-11-07T12:00:00Z".into()),
            content: None,
        });
        assert_eq!(projected.text, "");
        assert_eq!(projected.id, None);
    }

    #[test]
    fn classify_page_reads_last_message() {
        assert_eq!(classify_page(&[]), PageOutcome::Empty);
        assert_eq!(
            classify_page(&[message(1, secs(1), "a"), message(2, secs(2), "b")]),
            PageOutcome::Through(secs(2))
        );
        let mut bad = message(1, secs(1), "a");
        bad.created_at = Some("??".into());
        assert_eq!(classify_page(&[bad]), PageOutcome::Malformed);
    }
}
