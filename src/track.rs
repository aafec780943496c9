use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback length (seconds) for tracks whose duration has not been measured
/// yet. Keeps the generator's cursor advancing instead of looping in place.
pub const FALLBACK_DURATION_SECS: u32 = 210;

/// A catalog entry. The audio bytes live in external storage; the engine only
/// deals in these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    /// Original upload filename, shown to operators.
    pub original_name: String,
    /// Measured duration in seconds. None until the storage/mix service has
    /// probed the file; immutable once set.
    pub duration_secs: Option<u32>,
    /// Advertisement vs. music. Toggleable by an operator at any time;
    /// already-generated playlist events are unaffected.
    pub is_ad: bool,
    pub created_at: DateTime<Local>,
}

impl Track {
    pub fn new(original_name: String, is_ad: bool) -> Self {
        Track {
            id: Uuid::new_v4(),
            original_name,
            duration_secs: None,
            is_ad,
            created_at: Local::now(),
        }
    }

    /// Duration the generator schedules with: measured, or the fallback.
    /// A stored zero counts as unmeasured; the generator's cursor must always
    /// advance.
    pub fn effective_duration_secs(&self) -> u32 {
        match self.duration_secs {
            Some(secs) if secs > 0 => secs,
            _ => FALLBACK_DURATION_SECS,
        }
    }

    /// Format the effective duration as MM:SS.
    pub fn duration_display(&self) -> String {
        let secs = self.effective_duration_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}
