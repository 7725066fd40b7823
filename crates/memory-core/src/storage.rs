//! Per-session JSON file storage for memory records.
//!
//! Layout: `<root>/<sessionId>/<id>.json`, one record per file.

use crate::error::{MemoryError, Result};
use crate::schema::{MemoryRecord, validate_record_id, validate_session_id};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use tempfile::NamedTempFile;

/// A record together with the file it was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub path: Utf8PathBuf,
    pub record: MemoryRecord,
}

/// Counts gathered by a full scan of the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Parsable records
    pub records: usize,
    /// Session partitions (directories), including empty ones
    pub sessions: usize,
    /// `.json` units that failed to parse
    pub malformed: usize,
}

#[derive(Default)]
struct Scan {
    records: Vec<StoredRecord>,
    stats: StoreStats,
}

/// File-backed record store partitioned by session.
#[derive(Debug, Clone)]
pub struct RecordStore {
    /// Root directory holding one directory per session
    root: Utf8PathBuf,
}

impl RecordStore {
    /// Create a new store rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory for a session partition.
    pub fn session_dir(&self, session_id: &str) -> Utf8PathBuf {
        self.root.join(session_id)
    }

    /// File for a single record.
    pub fn record_path(&self, session_id: &str, id: &str) -> Utf8PathBuf {
        self.session_dir(session_id).join(format!("{id}.json"))
    }

    /// Persist a record under its session partition.
    ///
    /// The record is written to a temp file in the same directory, flushed,
    /// then renamed into place, so readers see either nothing or the
    /// complete unit.
    pub fn save(&self, record: &MemoryRecord) -> Result<Utf8PathBuf> {
        validate_session_id(&record.session_id)?;
        validate_record_id(&record.id)?;

        let dir = self.session_dir(&record.session_id);
        fs::create_dir_all(&dir).map_err(|e| MemoryError::io(&dir, e))?;

        let path = self.record_path(&record.session_id, &record.id);
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| MemoryError::io(&dir, e))?;
        serde_json::to_writer_pretty(&mut temp, record)?;
        temp.flush().map_err(|e| MemoryError::io(temp_path(&temp), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| MemoryError::io(temp_path(&temp), e))?;
        temp.persist(&path)?;

        debug!(
            "stored memory (id={}, session={}, utility={})",
            record.id, record.session_id, record.utility
        );
        Ok(path)
    }

    /// Load a single record. Missing or unparsable units yield `None`.
    pub fn load(&self, session_id: &str, id: &str) -> Result<Option<MemoryRecord>> {
        validate_session_id(session_id)?;
        validate_record_id(id)?;
        Ok(read_record(&self.record_path(session_id, id)))
    }

    /// Find a record by id across all sessions.
    pub fn find(&self, id: &str) -> Result<StoredRecord> {
        self.scan()
            .into_iter()
            .find(|stored| stored.record.id == id)
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))
    }

    /// Load every parsable record from every session.
    ///
    /// Units that fail to parse are skipped. An absent root yields an empty
    /// list.
    pub fn load_all(&self) -> Vec<MemoryRecord> {
        self.scan().into_iter().map(|stored| stored.record).collect()
    }

    /// Like [`load_all`](Self::load_all), keeping each record's file path.
    pub fn scan(&self) -> Vec<StoredRecord> {
        self.walk().records
    }

    /// Count records, partitions and malformed units.
    pub fn stats(&self) -> StoreStats {
        self.walk().stats
    }

    /// Remove a record's file. Failures are logged and returned.
    pub fn delete(&self, stored: &StoredRecord) -> Result<()> {
        fs::remove_file(&stored.path).map_err(|e| {
            warn!("could not delete {}: {}", stored.path, e);
            MemoryError::io(&stored.path, e)
        })?;
        debug!(
            "deleted memory (id={}, session={})",
            stored.record.id, stored.record.session_id
        );
        Ok(())
    }

    fn walk(&self) -> Scan {
        let mut scan = Scan::default();

        for session_dir in sorted_entries(&self.root) {
            if !session_dir.is_dir() {
                continue;
            }
            scan.stats.sessions += 1;

            for path in sorted_entries(&session_dir) {
                if path.extension() != Some("json") || !path.is_file() {
                    continue;
                }
                match read_record(&path) {
                    Some(record) => scan.records.push(StoredRecord { path, record }),
                    None => scan.stats.malformed += 1,
                }
            }
        }

        scan.stats.records = scan.records.len();
        scan
    }
}

/// Directory entries sorted by path. Unreadable or absent directories are
/// treated as empty.
fn sorted_entries(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!("could not read {}: {}", dir, e);
            }
            return Vec::new();
        }
    };

    let mut paths: Vec<Utf8PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    paths
}

fn read_record(path: &Utf8Path) -> Option<MemoryRecord> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                debug!("skipping unreadable memory {}: {}", path, e);
            }
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("skipping malformed memory {}: {}", path, e);
            None
        }
    }
}

fn temp_path(temp: &NamedTempFile) -> Utf8PathBuf {
    Utf8PathBuf::from(temp.path().to_string_lossy().into_owned())
}
