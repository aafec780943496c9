//! AppCore — central command dispatcher for plazaWave.
//!
//! Unified interface for all engine operations. The CLI, the remote control
//! surface, and tests all go through AppCore methods, giving one point of
//! validation and one persistence discipline: validate first, mutate, save,
//! then notify.

use crate::ad_scheduler::{AdInterval, AdSchedule};
use crate::engine::{Engine, STATE_FILE};
use crate::event_log::{LogKind, LogPage, LogStore};
use crate::events::{Notifier, PushEvent};
use crate::fixed_schedule::FixedSongSchedule;
use crate::playlist::{generate, splice_next, GenerationInputs, SelectionPolicy};
use crate::services::{AudioMixService, PlayerStatus};
use crate::track::Track;
use crate::volume::{
    parse_time, resolve_volume, scheduled_volume, ManualVolume, PeriodLevel, VolumePeriod,
    VOLUME_EPSILON,
};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ── Response data types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatusData {
    pub track_count: usize,
    pub ad_count: usize,
    pub ad_schedule_count: usize,
    pub fixed_song_count: usize,
    pub period_count: usize,
    pub playlist_event_count: usize,
    pub current_volume: f32,
    pub manual_override: bool,
    pub player_connected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackData {
    pub id: Uuid,
    pub original_name: String,
    pub duration_secs: Option<u32>,
    pub duration_display: String,
    pub is_ad: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsData {
    pub current_volume: f32,
    pub manual_override: bool,
    pub hourly: [f32; 24],
    pub periods: Vec<PeriodData>,
    pub selection_policy: SelectionPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodData {
    pub id: u32,
    pub time_start: String,
    pub time_end: String,
    pub level: PeriodLevel,
    pub level_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdScheduleData {
    pub id: u32,
    pub track_id: Uuid,
    pub track_name: String,
    pub interval_display: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixedSongData {
    pub id: u32,
    pub track_id: Uuid,
    pub track_name: String,
    pub time: String,
    pub repeat_daily: bool,
    pub fired: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewEventData {
    pub at: String,
    pub kind: String,
    pub name: Option<String>,
    pub duration_secs: u32,
    pub volume: f32,
    pub played: bool,
}

// ── AppCore ─────────────────────────────────────────────────────────────────

pub struct AppCore {
    pub engine: Engine,
    pub logs: LogStore,
    pub notifier: Notifier,
    state_path: PathBuf,
    player_status: PlayerStatus,
    current_volume: f32,
}

impl AppCore {
    /// Create an AppCore over the given data directory (state file + logs).
    pub fn new(data_dir: &Path) -> Self {
        let state_path = data_dir.join(STATE_FILE);
        let engine = Engine::load_from(&state_path);
        let current_volume = resolve_volume(
            Local::now(),
            &engine.hourly,
            &engine.periods,
            engine.manual_volume.as_ref(),
        );
        AppCore {
            engine,
            logs: LogStore::new(data_dir),
            notifier: Notifier::new(),
            state_path,
            player_status: PlayerStatus::default(),
            current_volume,
        }
    }

    fn save(&self) -> Result<(), String> {
        self.engine.save_to(&self.state_path)
    }

    // ── Status ──────────────────────────────────────────────────────────

    pub fn get_status(&self) -> StatusData {
        StatusData {
            track_count: self.engine.catalog.iter().filter(|t| !t.is_ad).count(),
            ad_count: self.engine.catalog.iter().filter(|t| t.is_ad).count(),
            ad_schedule_count: self.engine.ad_schedules.len(),
            fixed_song_count: self.engine.fixed_songs.len(),
            period_count: self.engine.periods.len(),
            playlist_event_count: self.engine.playlist.len(),
            current_volume: self.current_volume,
            manual_override: self.engine.manual_volume.is_some(),
            player_connected: self.player_status.connected,
        }
    }

    // ── Catalog ─────────────────────────────────────────────────────────

    pub fn get_tracks(&self) -> Vec<TrackData> {
        self.engine.catalog.iter().map(track_data).collect()
    }

    /// Register an externally stored audio file in the catalog.
    pub fn add_track(
        &mut self,
        original_name: &str,
        duration_secs: Option<u32>,
        is_ad: bool,
    ) -> Result<TrackData, String> {
        let name = original_name.trim();
        if name.is_empty() {
            return Err("Track name is required".to_string());
        }
        if duration_secs == Some(0) {
            return Err("Duration must be at least 1 second".to_string());
        }
        let mut track = Track::new(name.to_string(), is_ad);
        track.duration_secs = duration_secs;
        let data = track_data(&track);
        self.engine.catalog.push(track);
        self.save()?;
        self.logs
            .append(LogKind::App, &format!("Track added: {}", name), None);
        self.notifier.broadcast(PushEvent::MusicAdded {
            name: name.to_string(),
        });
        Ok(data)
    }

    /// Record the measured duration. Durations are write-once.
    pub fn set_track_duration(&mut self, id: Uuid, secs: u32) -> Result<(), String> {
        if secs == 0 {
            return Err("Duration must be at least 1 second".to_string());
        }
        let track = self
            .engine
            .find_track_mut(id)
            .ok_or_else(|| format!("Track {} not found", id))?;
        if track.duration_secs.is_some() {
            return Err(format!(
                "Track '{}' already has a measured duration",
                track.original_name
            ));
        }
        track.duration_secs = Some(secs);
        self.save()
    }

    pub fn set_track_ad_flag(&mut self, id: Uuid, is_ad: bool) -> Result<(), String> {
        let track = self
            .engine
            .find_track_mut(id)
            .ok_or_else(|| format!("Track {} not found", id))?;
        track.is_ad = is_ad;
        self.save()
    }

    /// Remove a track from the catalog. Schedules referencing it are left in
    /// place; the generator skips and logs them.
    pub fn delete_track(&mut self, id: Uuid) -> Result<(), String> {
        let pos = self
            .engine
            .catalog
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| format!("Track {} not found", id))?;
        let removed = self.engine.catalog.remove(pos);
        self.save()?;
        self.logs.append(
            LogKind::App,
            &format!("Track deleted: {}", removed.original_name),
            None,
        );
        self.notifier.broadcast(PushEvent::MusicDeleted {
            name: removed.original_name,
        });
        Ok(())
    }

    /// Render an announcement through the mix service and register the result
    /// as an ad track. A render failure leaves state untouched.
    pub fn create_announcement(
        &mut self,
        service: &dyn AudioMixService,
        text: &str,
        voice: &str,
        background: Option<Uuid>,
    ) -> Result<TrackData, String> {
        if text.trim().is_empty() {
            return Err("Announcement text is required".to_string());
        }
        if let Some(bg) = background {
            if self.engine.find_track(bg).is_none() {
                return Err(format!("Background track {} not found", bg));
            }
        }
        let rendered = service.render(text, voice, background)?;
        let mut track = Track::new(rendered.name, true);
        track.duration_secs = Some(rendered.duration_secs);
        let data = track_data(&track);
        self.engine.catalog.push(track);
        self.save()?;
        self.logs.append(
            LogKind::App,
            &format!("Announcement created: {}", data.original_name),
            None,
        );
        self.notifier.broadcast(PushEvent::MusicAdded {
            name: data.original_name.clone(),
        });
        Ok(data)
    }

    // ── Volume ──────────────────────────────────────────────────────────

    pub fn get_settings(&self) -> SettingsData {
        SettingsData {
            current_volume: self.current_volume,
            manual_override: self.engine.manual_volume.is_some(),
            hourly: *self.engine.hourly.as_slice(),
            periods: self.engine.periods.iter().map(period_data).collect(),
            selection_policy: self.engine.selection_policy,
        }
    }

    /// Manual volume override. Takes effect immediately and holds until a
    /// scheduled tick supersedes it after the grace window.
    pub fn set_volume(&mut self, volume: f32) -> Result<f32, String> {
        if !volume.is_finite() {
            return Err("Volume must be a number in 0-1".to_string());
        }
        let manual = ManualVolume::set_now(volume);
        let applied = manual.volume;
        self.engine.manual_volume = Some(manual);
        self.current_volume = applied;
        self.save()?;
        self.logs.append(
            LogKind::VolumeManual,
            &format!("Manual volume set to {:.0}%", applied * 100.0),
            None,
        );
        self.notifier.broadcast(PushEvent::VolumeChanged {
            volume: applied,
            manual: true,
        });
        Ok(applied)
    }

    /// Merge the given slots into the hourly grid. Unlisted hours keep their
    /// current level.
    pub fn set_hourly_volumes(&mut self, map: &HashMap<u8, f32>) -> Result<(), String> {
        let mut grid = self.engine.hourly.clone();
        for (&hour, &volume) in map {
            grid.set(hour, volume)?;
        }
        self.engine.hourly = grid;
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "volume" });
        Ok(())
    }

    pub fn add_period(
        &mut self,
        time_start: &str,
        time_end: &str,
        level: PeriodLevel,
    ) -> Result<PeriodData, String> {
        let period = VolumePeriod {
            id: 0, // assigned below, after validation
            time_start: parse_time(time_start)?,
            time_end: parse_time(time_end)?,
            level,
        };
        period.validate()?;
        self.reject_overlap(&period, None)?;

        let mut period = period;
        period.id = self.engine.alloc_period_id();
        let data = period_data(&period);
        self.engine.periods.push(period);
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "volume" });
        Ok(data)
    }

    pub fn update_period(
        &mut self,
        id: u32,
        time_start: &str,
        time_end: &str,
        level: PeriodLevel,
    ) -> Result<(), String> {
        let updated = VolumePeriod {
            id,
            time_start: parse_time(time_start)?,
            time_end: parse_time(time_end)?,
            level,
        };
        updated.validate()?;
        self.reject_overlap(&updated, Some(id))?;

        let period = self
            .engine
            .periods
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| format!("Period {} not found", id))?;
        *period = updated;
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "volume" });
        Ok(())
    }

    pub fn delete_period(&mut self, id: u32) -> Result<(), String> {
        let pos = self
            .engine
            .periods
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| format!("Period {} not found", id))?;
        self.engine.periods.remove(pos);
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "volume" });
        Ok(())
    }

    fn reject_overlap(&self, candidate: &VolumePeriod, skip_id: Option<u32>) -> Result<(), String> {
        for existing in &self.engine.periods {
            if Some(existing.id) == skip_id {
                continue;
            }
            if existing.overlaps(candidate) {
                return Err(format!(
                    "Period overlaps existing period {} ({} - {})",
                    existing.id,
                    existing.time_start.format("%H:%M"),
                    existing.time_end.format("%H:%M")
                ));
            }
        }
        Ok(())
    }

    /// Scheduled recomputation entry point, called by the background ticker.
    /// Returns the effective volume after the tick.
    pub fn volume_tick(&mut self, now: DateTime<Local>) -> f32 {
        if let Some(manual) = self.engine.manual_volume {
            if manual.within_grace(now) {
                return self.current_volume;
            }
            // Grace elapsed: the schedule supersedes the override.
            self.engine.manual_volume = None;
            if self.save().is_err() {
                eprintln!("Warning: could not persist cleared manual volume");
            }
        }
        let target = scheduled_volume(now, &self.engine.hourly, &self.engine.periods);
        if (target - self.current_volume).abs() > VOLUME_EPSILON {
            self.current_volume = target;
            self.logs.append(
                LogKind::VolumeScheduled,
                &format!("Scheduled volume: {:.0}%", target * 100.0),
                None,
            );
            self.notifier.broadcast(PushEvent::VolumeChanged {
                volume: target,
                manual: false,
            });
        }
        self.current_volume
    }

    // ── Ad schedules ────────────────────────────────────────────────────

    pub fn get_ad_schedules(&self) -> Vec<AdScheduleData> {
        self.engine
            .ad_schedules
            .iter()
            .map(|s| self.ad_schedule_data(s))
            .collect()
    }

    pub fn add_ad_schedule(
        &mut self,
        track_id: Uuid,
        interval: AdInterval,
    ) -> Result<AdScheduleData, String> {
        if self.engine.find_track(track_id).is_none() {
            return Err(format!("Track {} not found", track_id));
        }
        let schedule = AdSchedule::new(0, track_id, interval);
        schedule.validate()?;

        let mut schedule = schedule;
        schedule.id = self.engine.alloc_ad_id();
        let data = self.ad_schedule_data(&schedule);
        self.engine.ad_schedules.push(schedule);
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "ads" });
        Ok(data)
    }

    pub fn update_ad_schedule(&mut self, id: u32, interval: AdInterval) -> Result<(), String> {
        let probe = AdSchedule::new(id, Uuid::nil(), interval);
        probe.validate()?;
        let schedule = self
            .engine
            .ad_schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| format!("Ad schedule {} not found", id))?;
        schedule.interval = interval;
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "ads" });
        Ok(())
    }

    pub fn delete_ad_schedule(&mut self, id: u32) -> Result<(), String> {
        let pos = self
            .engine
            .ad_schedules
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| format!("Ad schedule {} not found", id))?;
        self.engine.ad_schedules.remove(pos);
        let live: Vec<u32> = self.engine.ad_schedules.iter().map(|s| s.id).collect();
        self.engine.ad_ledger.retain_ids(&live);
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "ads" });
        Ok(())
    }

    /// Toggle enabled. Cadence counters are untouched, so re-enabling resumes
    /// where the schedule left off.
    pub fn toggle_ad_schedule(&mut self, id: u32) -> Result<bool, String> {
        let schedule = self
            .engine
            .ad_schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| format!("Ad schedule {} not found", id))?;
        schedule.enabled = !schedule.enabled;
        let new_state = schedule.enabled;
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "ads" });
        Ok(new_state)
    }

    fn ad_schedule_data(&self, s: &AdSchedule) -> AdScheduleData {
        AdScheduleData {
            id: s.id,
            track_id: s.track_id,
            track_name: self
                .engine
                .find_track(s.track_id)
                .map(|t| t.original_name.clone())
                .unwrap_or_else(|| "(deleted)".to_string()),
            interval_display: s.interval.display(),
            enabled: s.enabled,
        }
    }

    // ── Fixed songs ─────────────────────────────────────────────────────

    pub fn get_scheduled_songs(&self) -> Vec<FixedSongData> {
        self.engine
            .fixed_songs
            .iter()
            .map(|s| FixedSongData {
                id: s.id,
                track_id: s.track_id,
                track_name: self
                    .engine
                    .find_track(s.track_id)
                    .map(|t| t.original_name.clone())
                    .unwrap_or_else(|| "(deleted)".to_string()),
                time: s.time_display(),
                repeat_daily: s.repeat_daily,
                fired: s.fired,
            })
            .collect()
    }

    pub fn add_scheduled_song(
        &mut self,
        track_id: Uuid,
        time: &str,
        repeat_daily: bool,
    ) -> Result<u32, String> {
        if self.engine.find_track(track_id).is_none() {
            return Err(format!("Track {} not found", track_id));
        }
        let parsed = parse_time(time)?;
        let id = self.engine.alloc_fixed_id();
        self.engine
            .fixed_songs
            .push(FixedSongSchedule::new(id, track_id, parsed, repeat_daily));
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "songs" });
        Ok(id)
    }

    pub fn delete_scheduled_song(&mut self, id: u32) -> Result<(), String> {
        let pos = self
            .engine
            .fixed_songs
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| format!("Scheduled song {} not found", id))?;
        self.engine.fixed_songs.remove(pos);
        self.save()?;
        self.notifier
            .broadcast(PushEvent::ScheduleUpdated { kind: "songs" });
        Ok(())
    }

    // ── Playlist ────────────────────────────────────────────────────────

    pub fn set_selection_policy(&mut self, policy: SelectionPolicy) -> Result<(), String> {
        self.engine.selection_policy = policy;
        self.save()
    }

    /// Regenerate the stored sequence for the next `window_hours`, replacing
    /// it wholesale. Returns the number of events generated.
    pub fn regenerate_playlist(&mut self, window_hours: u32) -> Result<usize, String> {
        let mut rng = fastrand::Rng::new();
        self.regenerate_playlist_with(window_hours, &mut rng, Local::now())
    }

    /// Seeded, clock-injected variant; this is what tests drive.
    pub fn regenerate_playlist_with(
        &mut self,
        window_hours: u32,
        rng: &mut fastrand::Rng,
        now: DateTime<Local>,
    ) -> Result<usize, String> {
        if window_hours == 0 {
            return Err("Window must be at least 1 hour".to_string());
        }
        // Resume from the first unplayed slot when regenerating mid-playback.
        let start = self
            .engine
            .playlist
            .iter()
            .find(|e| !e.played)
            .map(|e| e.at)
            .filter(|at| *at > now)
            .unwrap_or(now);

        let inputs = GenerationInputs {
            catalog: &self.engine.catalog,
            ad_schedules: &self.engine.ad_schedules,
            fixed_songs: &self.engine.fixed_songs,
            hourly: &self.engine.hourly,
            periods: &self.engine.periods,
            policy: self.engine.selection_policy,
        };
        let outcome = generate(&inputs, &self.engine.ad_ledger, start, window_hours, rng)?;

        let count = outcome.events.len();
        self.engine.playlist = outcome.events;
        self.engine.ad_ledger = outcome.ledger;
        for id in &outcome.fired_one_shots {
            if let Some(s) = self.engine.fixed_songs.iter_mut().find(|s| s.id == *id) {
                s.fired = true;
            }
        }
        self.save()?;
        for warning in &outcome.warnings {
            self.logs.append(LogKind::App, warning, None);
        }
        self.logs.append(
            LogKind::App,
            &format!("Playlist regenerated: {} events over {}h", count, window_hours),
            None,
        );
        self.notifier
            .broadcast(PushEvent::PlaylistRegenerated { events: count });
        Ok(count)
    }

    /// Stored sequence rendered verbatim, up to `hours` ahead of its start.
    pub fn preview(&self, hours: u32) -> Vec<PreviewEventData> {
        let horizon = self
            .engine
            .playlist
            .first()
            .map(|e| e.at + chrono::Duration::hours(hours as i64));
        self.engine
            .playlist
            .iter()
            .filter(|e| horizon.map_or(true, |h| e.at < h))
            .map(|e| PreviewEventData {
                at: e.at.format("%Y-%m-%d %H:%M:%S").to_string(),
                kind: e.kind.label().to_string(),
                name: match &e.kind {
                    crate::playlist::EventKind::RandomMusic { name, .. }
                    | crate::playlist::EventKind::Ad { name, .. }
                    | crate::playlist::EventKind::ScheduledSong { name, .. } => Some(name.clone()),
                    crate::playlist::EventKind::Volume => None,
                },
                duration_secs: e.kind.duration_secs(),
                volume: e.volume,
                played: e.played,
            })
            .collect()
    }

    /// Splice one track in front of the remaining queue.
    pub fn play_next(&mut self, track_id: Uuid) -> Result<(), String> {
        let track = self
            .engine
            .find_track(track_id)
            .ok_or_else(|| format!("Track {} not found", track_id))?
            .clone();
        splice_next(&mut self.engine.playlist, &track, Local::now());
        self.save()?;
        self.logs.append(
            LogKind::App,
            &format!("Queued next: {}", track.original_name),
            None,
        );
        self.notifier.broadcast(PushEvent::PlaylistRegenerated {
            events: self.engine.playlist.len(),
        });
        Ok(())
    }

    /// Playback driver feedback: the event at `index` was played.
    pub fn mark_played(&mut self, index: usize) -> Result<(), String> {
        let len = self.engine.playlist.len();
        let log_line = {
            let event = self
                .engine
                .playlist
                .get_mut(index)
                .ok_or_else(|| format!("Event index {} out of range ({} events)", index, len))?;
            event.played = true;
            match &event.kind {
                crate::playlist::EventKind::Ad { name, .. } => {
                    Some((LogKind::Ad, format!("Ad played: {}", name)))
                }
                crate::playlist::EventKind::RandomMusic { name, .. }
                | crate::playlist::EventKind::ScheduledSong { name, .. } => {
                    Some((LogKind::Music, format!("Played: {}", name)))
                }
                crate::playlist::EventKind::Volume => None,
            }
        };
        self.save()?;
        if let Some((kind, description)) = log_line {
            self.logs.append(kind, &description, None);
        }
        Ok(())
    }

    // ── Player status ───────────────────────────────────────────────────

    pub fn get_player_status(&self) -> PlayerStatus {
        self.player_status.clone()
    }

    pub fn set_player_status(&mut self, status: PlayerStatus) {
        if status.connected != self.player_status.connected {
            let msg = if status.connected {
                "Player connected"
            } else {
                "Player disconnected"
            };
            self.logs.append(LogKind::Connection, msg, None);
        }
        self.player_status = status.clone();
        self.notifier
            .broadcast(PushEvent::PlayerStatus { status });
    }

    // ── Logs ────────────────────────────────────────────────────────────

    pub fn get_logs(
        &self,
        kind: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<LogPage, String> {
        let kind = match kind {
            Some(s) => Some(
                LogKind::from_str_loose(s).ok_or_else(|| format!("Unknown log type '{}'", s))?,
            ),
            None => None,
        };
        Ok(self.logs.query(kind, limit, offset))
    }

    pub fn add_log(&self, kind: LogKind, description: &str) {
        self.logs.append(kind, description, None);
    }

    pub fn clear_logs(&self, before_days: Option<u32>) -> usize {
        match before_days {
            Some(days) => self.logs.clear_before_days(days),
            None => self.logs.clear_all(),
        }
    }
}

fn track_data(t: &Track) -> TrackData {
    TrackData {
        id: t.id,
        original_name: t.original_name.clone(),
        duration_secs: t.duration_secs,
        duration_display: t.duration_display(),
        is_ad: t.is_ad,
        created_at: t.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn period_data(p: &VolumePeriod) -> PeriodData {
    PeriodData {
        id: p.id,
        time_start: p.time_start.format("%H:%M").to_string(),
        time_end: p.time_end.format("%H:%M").to_string(),
        level: p.level,
        level_display: p.level_display(),
    }
}
