//! File-per-pane event store.
//!
//! Each pane has at most one record, `<dir>/<pane-id>.json`. Writers go
//! through a temp file in the same directory and `rename` into place, so a
//! concurrent reader sees either the old record or the new one, never a
//! partial write. No locking is involved.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use paneward_core::Status;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const RECORD_EXT: &str = "json";
pub const TEMP_PREFIX: &str = ".tmp-";

pub const STATUS_WORKING: &str = "working";
pub const STATUS_PAUSED: &str = "paused";
pub const STATUS_IDLE: &str = "idle";
pub const STATUS_STOPPED: &str = "stopped";

/// One pane's latest lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub pane_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(pane_id: impl Into<String>, status: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            pane_id: pane_id.into(),
            session_id: None,
            status: status.into(),
            timestamp: now,
        }
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id.filter(|s| !s.is_empty());
        self
    }

    pub fn is_stale(&self, max_age: TimeDelta, now: DateTime<Utc>) -> bool {
        now - self.timestamp > max_age
    }

    /// Raw status this record maps to.
    pub fn raw_status(&self) -> Status {
        map_event_status(&self.status)
    }
}

/// `working|paused|idle|stopped` -> raw status; anything else is `Unknown`.
pub fn map_event_status(status: &str) -> Status {
    match status {
        STATUS_WORKING => Status::Working,
        STATUS_PAUSED => Status::Paused,
        STATUS_IDLE => Status::Idle,
        STATUS_STOPPED => Status::Exited,
        _ => Status::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStoreConfig {
    pub dir: PathBuf,
    /// An `idle` write landing within this long of a `paused` record is dropped.
    pub suppress_idle_window: TimeDelta,
}

impl EventStoreConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suppress_idle_window: TimeDelta::seconds(10),
        }
    }

    pub fn with_suppress_idle_window(mut self, window: TimeDelta) -> Self {
        self.suppress_idle_window = window;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Kept the existing `paused` record; see [`EventStore::write`].
    Suppressed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed_stale: usize,
    pub removed_corrupt: usize,
    /// Temp files orphaned by a writer that died before its rename.
    pub removed_temp: usize,
    pub kept: usize,
}

#[derive(Debug, Clone)]
pub struct EventStore {
    config: EventStoreConfig,
}

impl EventStore {
    pub fn new(config: EventStoreConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn record_path(&self, pane_id: &str) -> PathBuf {
        self.config.dir.join(file_key(pane_id))
    }

    /// Replace the pane's record.
    ///
    /// An `idle` record is not written when the existing record is `paused`
    /// and younger than the suppression window (measured at the new record's
    /// timestamp). The program reports "stopped responding" in the same
    /// instant it raises a permission prompt; the prompt must win.
    pub fn write(&self, record: &EventRecord) -> Result<WriteOutcome, StoreError> {
        if record.status == STATUS_IDLE
            && let Ok(Some(existing)) = self.read_event(&record.pane_id)
            && existing.status == STATUS_PAUSED
            && record.timestamp - existing.timestamp < self.config.suppress_idle_window
        {
            tracing::debug!(pane_id = %record.pane_id, "idle write suppressed by recent paused");
            return Ok(WriteOutcome::Suppressed);
        }

        fs::create_dir_all(&self.config.dir)
            .map_err(|e| StoreError::io(&self.config.dir, e))?;
        let json = serde_json::to_vec(record)?;
        let target = self.record_path(&record.pane_id);
        let temp = self.temp_path(&record.pane_id);

        if let Err(e) = fs::write(&temp, &json) {
            cleanup_temp_file(&temp, &e);
            return Err(StoreError::io(&temp, e));
        }
        if let Err(e) = fs::rename(&temp, &target) {
            cleanup_temp_file(&temp, &e);
            return Err(StoreError::io(&target, e));
        }
        Ok(WriteOutcome::Written)
    }

    /// `Ok(None)` when the pane has no record.
    pub fn read_event(&self, pane_id: &str) -> Result<Option<EventRecord>, StoreError> {
        let path = self.record_path(pane_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Every parsable record keyed by pane id. Unreadable or unparsable
    /// files are skipped; a missing directory is an empty store.
    pub fn read_all(&self) -> HashMap<String, EventRecord> {
        self.record_files()
            .into_iter()
            .filter_map(|path| {
                let bytes = fs::read(&path).ok()?;
                serde_json::from_slice::<EventRecord>(&bytes).ok()
            })
            .map(|record| (record.pane_id.clone(), record))
            .collect()
    }

    /// Delete records older than `max_age`, any record that does not parse,
    /// and temp files whose mtime is older than `max_age`.
    pub fn cleanup(&self, max_age: TimeDelta, now: DateTime<Utc>) -> CleanupReport {
        let mut report = CleanupReport::default();
        for path in self.record_files() {
            let Ok(bytes) = fs::read(&path) else {
                continue;
            };
            let stale = match serde_json::from_slice::<EventRecord>(&bytes) {
                Ok(record) if record.is_stale(max_age, now) => {
                    report.removed_stale += 1;
                    true
                }
                Ok(_) => {
                    report.kept += 1;
                    false
                }
                Err(_) => {
                    report.removed_corrupt += 1;
                    true
                }
            };
            if stale && let Err(e) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove event record");
            }
        }

        for path in self.temp_files() {
            let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
                continue;
            };
            if now - DateTime::<Utc>::from(modified) <= max_age {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => report.removed_temp += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove orphaned temp file");
                }
            }
        }
        report
    }

    fn record_files(&self) -> Vec<PathBuf> {
        self.files_where(|p| p.extension().is_some_and(|ext| ext == RECORD_EXT))
    }

    fn temp_files(&self) -> Vec<PathBuf> {
        self.files_where(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(TEMP_PREFIX))
        })
    }

    fn files_where(&self, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.config.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.path())
            .filter(|p| keep(p))
            .collect()
    }

    fn temp_path(&self, pane_id: &str) -> PathBuf {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        self.config.dir.join(format!(
            "{TEMP_PREFIX}{}-{}-{nanos}",
            sanitize(pane_id),
            std::process::id()
        ))
    }
}

/// `%25` -> `%25.json`. Path separators are replaced so an id can never
/// escape the store directory.
fn file_key(pane_id: &str) -> String {
    format!("{}.{RECORD_EXT}", sanitize(pane_id))
}

fn sanitize(pane_id: &str) -> String {
    pane_id.replace(['/', '\\'], "_")
}

fn cleanup_temp_file(temp: &Path, original_error: &std::io::Error) {
    if let Err(e) = fs::remove_file(temp)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(
            path = %temp.display(),
            original_error = %original_error,
            cleanup_error = %e,
            "failed to remove event store temp file"
        );
    }
}
