//! Self-imposed rate limiting. None of these delays matter for correctness,
//! they keep the archiver from hammering Kick.

use std::time::Duration;

/// Blocks the current thread. Swapped for a recorder in tests.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fixed delays and bounds used across a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Attempts at fetching the VOD list before giving up.
    pub list_attempts: u32,
    /// Wait between failed VOD list attempts.
    pub list_backoff: Duration,
    /// How far the chat cursor jumps past an empty page.
    pub empty_page_advance: Duration,
    /// Wait after every chat page request.
    pub page_pause: Duration,
    /// Wait after each archived VOD.
    pub vod_pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            list_attempts: 3,
            list_backoff: Duration::from_secs(3),
            empty_page_advance: Duration::from_secs(5),
            page_pause: Duration::from_secs(1),
            vod_pause: Duration::from_secs(3),
        }
    }
}
