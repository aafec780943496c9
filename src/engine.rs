//! Persisted engine state: the track catalog, every schedule, the volume
//! model, cadence counters and the generated playlist, all in one JSON file.

use crate::ad_scheduler::{AdLedger, AdSchedule};
use crate::fixed_schedule::FixedSongSchedule;
use crate::playlist::{PlaylistEvent, SelectionPolicy};
use crate::track::Track;
use crate::volume::{HourlyVolumes, ManualVolume, VolumePeriod};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

pub const STATE_FILE: &str = "plazawave_state.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct Engine {
    pub catalog: Vec<Track>,
    #[serde(default)]
    pub hourly: HourlyVolumes,
    #[serde(default)]
    pub periods: Vec<VolumePeriod>,
    #[serde(default)]
    pub ad_schedules: Vec<AdSchedule>,
    #[serde(default)]
    pub fixed_songs: Vec<FixedSongSchedule>,
    #[serde(default)]
    pub manual_volume: Option<ManualVolume>,
    #[serde(default)]
    pub ad_ledger: AdLedger,
    #[serde(default)]
    pub playlist: Vec<PlaylistEvent>,
    #[serde(default)]
    pub selection_policy: SelectionPolicy,
    next_period_id: u32,
    next_ad_id: u32,
    next_fixed_id: u32,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            catalog: Vec::new(),
            hourly: HourlyVolumes::default(),
            periods: Vec::new(),
            ad_schedules: Vec::new(),
            fixed_songs: Vec::new(),
            manual_volume: None,
            ad_ledger: AdLedger::new(),
            playlist: Vec::new(),
            selection_policy: SelectionPolicy::default(),
            next_period_id: 1,
            next_ad_id: 1,
            next_fixed_id: 1,
        }
    }

    /// Load engine state from JSON, or create a new instance if not found.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(engine) => return engine,
                    Err(e) => eprintln!("Warning: corrupt state file, starting fresh: {}", e),
                },
                Err(e) => eprintln!("Warning: could not read state file: {}", e),
            }
        }
        Engine::new()
    }

    /// Persist current state to JSON.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Create dir error: {}", e))?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Write error: {}", e))?;
        Ok(())
    }

    // ── Catalog ──────────────────────────────────────────────────────────

    pub fn find_track(&self, id: Uuid) -> Option<&Track> {
        self.catalog.iter().find(|t| t.id == id)
    }

    pub fn find_track_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.catalog.iter_mut().find(|t| t.id == id)
    }

    // ── Id allocation ────────────────────────────────────────────────────

    pub fn alloc_period_id(&mut self) -> u32 {
        let id = self.next_period_id;
        self.next_period_id += 1;
        id
    }

    pub fn alloc_ad_id(&mut self) -> u32 {
        let id = self.next_ad_id;
        self.next_ad_id += 1;
        id
    }

    pub fn alloc_fixed_id(&mut self) -> u32 {
        let id = self.next_fixed_id;
        self.next_fixed_id += 1;
        id
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
