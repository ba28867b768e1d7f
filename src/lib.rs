#![forbid(unsafe_code)]

//! Incremental archiver for a Kick channel's VODs and their chat.
//!
//! Each run lists the channel's finished broadcasts, fetches the chat of every
//! VOD not yet in the catalog, stores one transcript document per VOD and
//! retires transcripts that have aged out of the synced directory.

pub mod archiver;
pub mod catalog;
pub mod config;
pub mod document;
pub mod kick;
pub mod lister;
pub mod logging;
pub mod metadata;
pub mod mirror;
pub mod pacing;
pub mod retention;
pub mod stats;
pub mod store;
pub mod timefmt;
pub mod transcript;

#[cfg(test)]
mod test_support;
