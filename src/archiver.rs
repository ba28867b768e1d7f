//! One archive pass: catalog → VOD list → new VODs → transcripts → catalog →
//! retention sweep.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::catalog::ArchiveCatalog;
use crate::config::ArchiverConfig;
use crate::kick::{ArchiveSource, ChatSource};
use crate::lister::ArchiveLister;
use crate::metadata::VodRecord;
use crate::pacing::{Pacing, Sleeper};
use crate::retention::RetentionSweeper;
use crate::store::{CommentDirResolver, SaveOutcome, TranscriptStore};
use crate::transcript::TranscriptFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    LoadingCatalog,
    ListingRemote,
    Diffing,
    FetchingVod,
    PersistingCatalog,
    Sweeping,
    Done,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// VODs that were not in the catalog yet.
    pub discovered: usize,
    /// VODs appended to the catalog, in processing order.
    pub archived: Vec<u64>,
    /// Archived VODs whose chat was empty, so no transcript was written.
    pub without_comments: Vec<u64>,
    pub swept: Vec<PathBuf>,
    /// Last state entered; `Done` after a complete run.
    pub state: RunState,
    pub failure: Option<String>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct Archiver<'a> {
    config: &'a ArchiverConfig,
    archives: &'a dyn ArchiveSource,
    chat: &'a dyn ChatSource,
    resolver: &'a dyn CommentDirResolver,
    sleeper: &'a dyn Sleeper,
    pacing: Pacing,
    persist_each_vod: bool,
}

impl<'a> Archiver<'a> {
    pub fn new(
        config: &'a ArchiverConfig,
        archives: &'a dyn ArchiveSource,
        chat: &'a dyn ChatSource,
        resolver: &'a dyn CommentDirResolver,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            config,
            archives,
            chat,
            resolver,
            sleeper,
            pacing: Pacing::default(),
            persist_each_vod: true,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Save the catalog after every VOD instead of once at the end, so a
    /// failure halfway through keeps what was already archived.
    pub fn persist_each_vod(mut self, enabled: bool) -> Self {
        self.persist_each_vod = enabled;
        self
    }

    /// Never returns an error: a failure stops the run and is recorded in the
    /// report.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        if let Err(err) = self.run_stages(&mut report) {
            let message = format!("{err:#}");
            error!(state = ?report.state, error = %message, "archive run aborted");
            report.failure = Some(message);
        }
        report
    }

    fn run_stages(&self, report: &mut RunReport) -> Result<()> {
        report.state = RunState::LoadingCatalog;
        let mut catalog = ArchiveCatalog::load(&self.config.catalog_file)?;
        info!(path = %catalog.path().display(), known = catalog.len(), "catalog loaded");

        report.state = RunState::ListingRemote;
        let remote =
            ArchiveLister::new(self.config, self.archives, self.sleeper, self.pacing).fetch();

        report.state = RunState::Diffing;
        let fresh = catalog.unseen(remote);
        report.discovered = fresh.len();
        if fresh.is_empty() {
            info!("no new archives");
        }

        report.state = RunState::FetchingVod;
        self.archive_vods(&mut catalog, fresh, report)?;

        report.state = RunState::PersistingCatalog;
        if !report.archived.is_empty() && !self.persist_each_vod {
            catalog.persist()?;
        }

        report.state = RunState::Sweeping;
        let sweeper = RetentionSweeper::new(&self.config.synced_dir, self.config.retention());
        report.swept = sweeper.sweep(Utc::now())?;

        report.state = RunState::Done;
        info!(
            archived = report.archived.len(),
            swept = report.swept.len(),
            "archive run complete"
        );
        Ok(())
    }

    fn archive_vods(
        &self,
        catalog: &mut ArchiveCatalog,
        fresh: Vec<VodRecord>,
        report: &mut RunReport,
    ) -> Result<()> {
        let fetcher = TranscriptFetcher::new(self.chat, self.sleeper, self.pacing)
            .with_max_pages(self.config.max_pages);
        let store = TranscriptStore::new(self.resolver);

        for mut vod in fresh {
            info!(vod = vod.id, title = %vod.title, start = %vod.start_time, "new archive");
            let window = vod.time_window()?;
            let comments = fetcher.fetch(&window);
            vod.number_of_comments = Some(comments.len());

            match store.save(&vod, &comments) {
                Ok(SaveOutcome::Written(_)) => {}
                Ok(SaveOutcome::NoComments) => report.without_comments.push(vod.id),
                Err(err) => {
                    warn!(vod = vod.id, error = %format!("{err:#}"), "could not save transcript");
                }
            }

            let id = vod.id;
            catalog.append(vod);
            if self.persist_each_vod {
                catalog.persist()?;
            }
            report.archived.push(id);
            self.sleeper.sleep(self.pacing.vod_pause);
        }
        Ok(())
    }
}
