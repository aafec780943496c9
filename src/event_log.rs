//! JSON-based operator event log.
//!
//! Append-only records of everything the system did unattended: tracks
//! played, ads inserted, volume moves, app-level notices, control-surface
//! connections. Loads from disk on each operation and saves after mutations.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Category of a log entry. Queries filter on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Music,
    Ad,
    VolumeManual,
    VolumeScheduled,
    App,
    Connection,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Music => "music",
            LogKind::Ad => "ad",
            LogKind::VolumeManual => "volume_manual",
            LogKind::VolumeScheduled => "volume_scheduled",
            LogKind::App => "app",
            LogKind::Connection => "connection",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<LogKind> {
        match s.trim().to_lowercase().as_str() {
            "music" => Some(LogKind::Music),
            "ad" | "ads" => Some(LogKind::Ad),
            "volume_manual" | "manual" => Some(LogKind::VolumeManual),
            "volume_scheduled" | "scheduled" => Some(LogKind::VolumeScheduled),
            "app" => Some(LogKind::App),
            "connection" => Some(LogKind::Connection),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub kind: LogKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// One page of query results plus the total match count (for paging UIs).
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub total: usize,
}

/// JSON-file-backed log store. Entries are never updated, only appended and
/// swept by age.
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(directory: &Path) -> Self {
        LogStore {
            path: directory.join("event_log.json"),
        }
    }

    /// Append one entry timestamped now.
    pub fn append(&self, kind: LogKind, description: &str, details: Option<String>) {
        self.append_at(Local::now(), kind, description, details);
    }

    /// Append one entry with an explicit timestamp.
    pub fn append_at(
        &self,
        at: DateTime<Local>,
        kind: LogKind,
        description: &str,
        details: Option<String>,
    ) {
        let mut entries = self.load();
        entries.push(LogEntry {
            at,
            kind,
            description: description.to_string(),
            details,
        });
        self.save(&entries);
    }

    /// Newest-first page of entries, optionally filtered by kind. `total`
    /// counts all matches, not just the returned page.
    pub fn query(&self, kind: Option<LogKind>, limit: usize, offset: usize) -> LogPage {
        let mut entries = self.load();
        entries.retain(|e| kind.map_or(true, |k| e.kind == k));
        entries.sort_by(|a, b| b.at.cmp(&a.at));
        let total = entries.len();
        let page = entries.into_iter().skip(offset).take(limit).collect();
        LogPage {
            entries: page,
            total,
        }
    }

    /// Delete entries older than `days` days. Returns how many were removed.
    pub fn clear_before_days(&self, days: u32) -> usize {
        let cutoff = Local::now() - Duration::days(days as i64);
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|e| e.at >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            self.save(&entries);
        }
        removed
    }

    /// Delete everything.
    pub fn clear_all(&self) -> usize {
        let removed = self.load().len();
        self.save(&Vec::new());
        removed
    }

    fn load(&self) -> Vec<LogEntry> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    fn save(&self, entries: &Vec<LogEntry>) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string(entries) {
            let _ = std::fs::write(&self.path, json);
        }
    }
}
