//! Writes one transcript document per VOD.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::document::{read_json, write_json};
use crate::metadata::{ChatMessage, TranscriptDocument, VodRecord};

pub const TRANSCRIPT_SUFFIX: &str = "_comments.json";

pub fn transcript_file_name(vod_id: u64) -> String {
    format!("{vod_id}{TRANSCRIPT_SUFFIX}")
}

pub fn is_transcript_file(name: &str) -> bool {
    name.ends_with(TRANSCRIPT_SUFFIX)
}

/// Picks the directory a transcript is written to. Consulted on every write.
pub trait CommentDirResolver {
    fn resolve(&self) -> PathBuf;
}

/// Uses the local mirror whenever it exists, the synced directory otherwise.
#[derive(Debug, Clone)]
pub struct PreferLocal {
    pub local: PathBuf,
    pub synced: PathBuf,
}

impl CommentDirResolver for PreferLocal {
    fn resolve(&self) -> PathBuf {
        if self.local.is_dir() {
            self.local.clone()
        } else {
            self.synced.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncedOnly {
    pub synced: PathBuf,
}

impl CommentDirResolver for SyncedOnly {
    fn resolve(&self) -> PathBuf {
        self.synced.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    /// Nothing was written because the transcript had no messages.
    NoComments,
}

pub struct TranscriptStore<'a> {
    resolver: &'a dyn CommentDirResolver,
}

impl<'a> TranscriptStore<'a> {
    pub fn new(resolver: &'a dyn CommentDirResolver) -> Self {
        Self { resolver }
    }

    /// Overwrites any earlier document for the same VOD.
    pub fn save(&self, vod: &VodRecord, comments: &[ChatMessage]) -> Result<SaveOutcome> {
        if comments.is_empty() {
            info!(vod = vod.id, "no comments, nothing saved");
            return Ok(SaveOutcome::NoComments);
        }

        let document = TranscriptDocument::new(vod, comments.to_vec());
        let path = self.resolver.resolve().join(transcript_file_name(vod.id));
        write_json(&path, &document)?;
        info!(vod = vod.id, comments = document.number_of_comments, path = %path.display(), "transcript saved");
        Ok(SaveOutcome::Written(path))
    }

    pub fn load(path: &Path) -> Result<TranscriptDocument> {
        read_json(path)
    }
}
