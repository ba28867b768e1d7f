//! The catalog of VODs that have already been archived.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::document::{read_json, write_json};
use crate::metadata::VodRecord;

/// Append-only list of processed VODs backed by a single JSON array on disk.
#[derive(Debug)]
pub struct ArchiveCatalog {
    path: PathBuf,
    records: Vec<VodRecord>,
}

impl ArchiveCatalog {
    /// Loads the catalog, starting empty when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            read_json::<Vec<VodRecord>>(path)?
        } else {
            debug!(path = %path.display(), "no catalog yet, starting empty");
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[VodRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn known_ids(&self) -> HashSet<u64> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.records.iter().any(|record| record.id == id)
    }

    /// Keeps only the candidates whose id is not cataloged yet, preserving
    /// their order. Repeated ids in `candidates` are kept once.
    pub fn unseen(&self, candidates: Vec<VodRecord>) -> Vec<VodRecord> {
        let mut known = self.known_ids();
        candidates
            .into_iter()
            .filter(|candidate| known.insert(candidate.id))
            .collect()
    }

    /// Returns `false` without touching the catalog when the id is present.
    pub fn append(&mut self, record: VodRecord) -> bool {
        if self.contains(record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn persist(&self) -> Result<()> {
        write_json(&self.path, &self.records)?;
        info!(path = %self.path.display(), entries = self.records.len(), "catalog saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn vod(id: u64, title: &str) -> VodRecord {
        VodRecord {
            id,
            video_id: Some(id * 10),
            uuid: Some(format!("uuid-{id}")),
            title: title.to_string(),
            start_time: "2025-11-07T12:00:00+00:00".into(),
            url: Some(format!("https://kick.com/chan/videos/uuid-{id}")),
            duration: 60_000,
            video_length: "00:01:00".into(),
            number_of_comments: Some(2),
        }
    }

    #[test]
    fn load_missing_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let catalog = ArchiveCatalog::load(&dir.path().join("kick_archives.json"))?;
        assert!(catalog.is_empty());
        Ok(())
    }

    #[test]
    fn persist_then_load_keeps_order() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("kick_archives.json");
        let mut catalog = ArchiveCatalog::load(&path)?;
        assert!(catalog.append(vod(2, "雑談")));
        assert!(catalog.append(vod(1, "")));
        catalog.persist()?;

        let reloaded = ArchiveCatalog::load(&path)?;
        assert_eq!(reloaded.records(), catalog.records());
        assert_eq!(reloaded.records()[0].id, 2);
        assert!(fs::read_to_string(&path)?.contains("雑談"));
        Ok(())
    }

    #[test]
    fn append_refuses_duplicate_ids() -> Result<()> {
        let dir = tempdir()?;
        let mut catalog = ArchiveCatalog::load(&dir.path().join("c.json"))?;
        assert!(catalog.append(vod(5, "first")));
        assert!(!catalog.append(vod(5, "second")));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.records()[0].title, "first");
        Ok(())
    }

    #[test]
    fn unseen_filters_known_ids() -> Result<()> {
        let dir = tempdir()?;
        let mut catalog = ArchiveCatalog::load(&dir.path().join("c.json"))?;
        catalog.append(vod(1, "a"));
        let fresh = catalog.unseen(vec![vod(3, "c"), vod(1, "a"), vod(2, "b"), vod(3, "c")]);
        let ids: Vec<u64> = fresh.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![3, 2]);
        Ok(())
    }

    #[test]
    fn corrupt_catalog_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "[{]").unwrap();
        assert!(ArchiveCatalog::load(&path).is_err());
    }
}
