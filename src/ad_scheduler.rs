//! Ad cadence model. Each ad schedule fires on a cadence of either wall-clock
//! minutes or songs played. The due/not-due decision is a pure function over
//! an explicit ledger so the generator and the tests share one code path.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ── Schedule definition ──────────────────────────────────────────────────────

/// Cadence of an ad schedule. Wire shape matches the stored records:
/// `{"interval_type": "minutes", "interval_value": 10}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "interval_type", content = "interval_value", rename_all = "lowercase")]
pub enum AdInterval {
    /// Fire once at least this many minutes have elapsed since the last fire.
    Minutes(u32),
    /// Fire once at least this many songs have played since the last fire.
    Songs(u32),
}

impl AdInterval {
    pub fn display(&self) -> String {
        match self {
            AdInterval::Minutes(n) => format!("every {} min", n),
            AdInterval::Songs(n) => format!("every {} songs", n),
        }
    }
}

/// An ad definition: which track to insert and how often.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSchedule {
    pub id: u32,
    pub track_id: Uuid,
    #[serde(flatten)]
    pub interval: AdInterval,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AdSchedule {
    pub fn new(id: u32, track_id: Uuid, interval: AdInterval) -> Self {
        AdSchedule {
            id,
            track_id,
            interval,
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let value = match self.interval {
            AdInterval::Minutes(n) | AdInterval::Songs(n) => n,
        };
        if value == 0 {
            return Err("Ad interval must be at least 1".into());
        }
        Ok(())
    }
}

// ── Cadence ledger ───────────────────────────────────────────────────────────

/// Per-schedule firing history. `songs_since` counts song plays after the
/// last fire (or after the ledger entry was created).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AdCadenceState {
    #[serde(default)]
    pub last_fired: Option<DateTime<Local>>,
    #[serde(default)]
    pub songs_since: u32,
}

/// Firing history for all ad schedules, keyed by schedule id. Persisted with
/// engine state so restarts do not reset cadences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdLedger(HashMap<u32, AdCadenceState>);

impl AdLedger {
    pub fn new() -> Self {
        AdLedger(HashMap::new())
    }

    pub fn state(&self, schedule_id: u32) -> AdCadenceState {
        self.0.get(&schedule_id).copied().unwrap_or_default()
    }

    /// Record that the schedule's ad was inserted at `at`.
    pub fn mark_fired(&mut self, schedule_id: u32, at: DateTime<Local>) {
        let entry = self.0.entry(schedule_id).or_default();
        entry.last_fired = Some(at);
        entry.songs_since = 0;
    }

    /// Record one song play against every tracked schedule. Schedules with no
    /// entry yet get one, so songs-cadence counting starts at first sight.
    pub fn note_song_played(&mut self, schedule_ids: impl Iterator<Item = u32>) {
        for id in schedule_ids {
            let entry = self.0.entry(id).or_default();
            entry.songs_since = entry.songs_since.saturating_add(1);
        }
    }

    /// Drop entries for schedules that no longer exist.
    pub fn retain_ids(&mut self, live: &[u32]) {
        self.0.retain(|id, _| live.contains(id));
    }
}

// ── Decision logic ───────────────────────────────────────────────────────────

/// Whether a schedule is due at `at`. For minutes cadences with no prior fire
/// the elapsed time counts from `baseline` (the start of the generation
/// window), so a fresh schedule does not fire at the very first boundary.
pub fn is_due(
    schedule: &AdSchedule,
    at: DateTime<Local>,
    baseline: DateTime<Local>,
    state: &AdCadenceState,
) -> bool {
    if !schedule.enabled {
        return false;
    }
    match schedule.interval {
        AdInterval::Minutes(mins) => {
            let since = state.last_fired.unwrap_or(baseline);
            (at - since).num_seconds() >= mins as i64 * 60
        }
        AdInterval::Songs(count) => state.songs_since >= count,
    }
}

/// All schedules due at a boundary, ascending by id. Ascending id is the tie
/// order when several cadences come due at the same boundary.
pub fn due_schedules<'a>(
    schedules: &'a [AdSchedule],
    at: DateTime<Local>,
    baseline: DateTime<Local>,
    ledger: &AdLedger,
) -> Vec<&'a AdSchedule> {
    let mut due: Vec<&AdSchedule> = schedules
        .iter()
        .filter(|s| is_due(s, at, baseline, &ledger.state(s.id)))
        .collect();
    due.sort_by_key(|s| s.id);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 12, 18, h, m, 0).unwrap()
    }

    fn minutes_schedule(id: u32, mins: u32) -> AdSchedule {
        AdSchedule::new(id, Uuid::new_v4(), AdInterval::Minutes(mins))
    }

    fn songs_schedule(id: u32, count: u32) -> AdSchedule {
        AdSchedule::new(id, Uuid::new_v4(), AdInterval::Songs(count))
    }

    #[test]
    fn validate_rejects_zero_interval() {
        assert!(minutes_schedule(1, 0).validate().is_err());
        assert!(songs_schedule(1, 0).validate().is_err());
        assert!(minutes_schedule(1, 10).validate().is_ok());
    }

    #[test]
    fn minutes_cadence_counts_from_baseline_when_never_fired() {
        let s = minutes_schedule(1, 10);
        let state = AdCadenceState::default();
        let baseline = at(12, 0);
        assert!(!is_due(&s, at(12, 0), baseline, &state));
        assert!(!is_due(&s, at(12, 9), baseline, &state));
        assert!(is_due(&s, at(12, 10), baseline, &state));
        assert!(is_due(&s, at(12, 45), baseline, &state));
    }

    #[test]
    fn minutes_cadence_counts_from_last_fire() {
        let s = minutes_schedule(1, 15);
        let mut ledger = AdLedger::new();
        ledger.mark_fired(1, at(12, 0));
        assert!(!is_due(&s, at(12, 14), at(11, 0), &ledger.state(1)));
        assert!(is_due(&s, at(12, 15), at(11, 0), &ledger.state(1)));
    }

    #[test]
    fn songs_cadence_fires_after_enough_plays() {
        let s = songs_schedule(1, 3);
        let mut ledger = AdLedger::new();
        let baseline = at(9, 0);
        for _ in 0..2 {
            ledger.note_song_played(std::iter::once(1));
        }
        assert!(!is_due(&s, at(9, 30), baseline, &ledger.state(1)));
        ledger.note_song_played(std::iter::once(1));
        assert!(is_due(&s, at(9, 30), baseline, &ledger.state(1)));
    }

    #[test]
    fn firing_resets_song_counter() {
        let s = songs_schedule(1, 2);
        let mut ledger = AdLedger::new();
        ledger.note_song_played(std::iter::once(1));
        ledger.note_song_played(std::iter::once(1));
        assert!(is_due(&s, at(9, 0), at(9, 0), &ledger.state(1)));
        ledger.mark_fired(1, at(9, 0));
        assert!(!is_due(&s, at(9, 0), at(9, 0), &ledger.state(1)));
        assert_eq!(ledger.state(1).songs_since, 0);
    }

    #[test]
    fn disabled_schedule_never_due() {
        let mut s = minutes_schedule(1, 1);
        s.enabled = false;
        assert!(is_due(
            &minutes_schedule(1, 1),
            at(13, 0),
            at(12, 0),
            &AdCadenceState::default()
        ));
        assert!(!is_due(&s, at(13, 0), at(12, 0), &AdCadenceState::default()));
    }

    #[test]
    fn due_schedules_sorted_ascending_by_id() {
        let schedules = vec![
            minutes_schedule(7, 5),
            minutes_schedule(2, 5),
            minutes_schedule(4, 90),
        ];
        let ledger = AdLedger::new();
        let due = due_schedules(&schedules, at(13, 0), at(12, 0), &ledger);
        let ids: Vec<u32> = due.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 7]);
    }

    #[test]
    fn ledger_retains_only_live_ids() {
        let mut ledger = AdLedger::new();
        ledger.mark_fired(1, at(10, 0));
        ledger.mark_fired(2, at(10, 0));
        ledger.retain_ids(&[2]);
        assert!(ledger.state(1).last_fired.is_none());
        assert!(ledger.state(2).last_fired.is_some());
    }

    #[test]
    fn interval_serialization_matches_wire_shape() {
        let s = minutes_schedule(3, 10);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["interval_type"], "minutes");
        assert_eq!(json["interval_value"], 10);
        let loaded: AdSchedule = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.interval, AdInterval::Minutes(10));
        assert!(loaded.enabled);
    }

    #[test]
    fn interval_display() {
        assert_eq!(AdInterval::Minutes(10).display(), "every 10 min");
        assert_eq!(AdInterval::Songs(4).display(), "every 4 songs");
    }
}
