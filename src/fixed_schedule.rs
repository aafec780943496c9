//! Fixed-time song schedules: play a specific track at a specific time of
//! day, once or every day. One-shot schedules keep an explicit `fired` flag
//! in persisted state so a restart cannot replay them.

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedSongSchedule {
    pub id: u32,
    pub track_id: Uuid,
    pub time: NaiveTime,
    #[serde(default)]
    pub repeat_daily: bool,
    #[serde(default)]
    pub fired: bool,
}

impl FixedSongSchedule {
    pub fn new(id: u32, track_id: Uuid, time: NaiveTime, repeat_daily: bool) -> Self {
        FixedSongSchedule {
            id,
            track_id,
            time,
            repeat_daily,
            fired: false,
        }
    }

    pub fn time_display(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// Concrete occurrences of the given schedules inside [window_start,
/// window_end), sorted by time then schedule id (the tie order when two
/// schedules name the same minute). Repeat-daily schedules yield one
/// occurrence per calendar day in the window; one-shots at most one ever.
pub fn occurrences_in_window(
    schedules: &[FixedSongSchedule],
    window_start: DateTime<Local>,
    window_end: DateTime<Local>,
) -> Vec<(DateTime<Local>, u32)> {
    let mut out: Vec<(DateTime<Local>, u32)> = Vec::new();
    for schedule in schedules {
        if !schedule.repeat_daily && schedule.fired {
            continue;
        }
        let mut day = window_start.date_naive();
        let last_day = window_end.date_naive();
        while day <= last_day {
            // Skip times that don't exist on this day (DST spring-forward).
            if let Some(at) = Local
                .from_local_datetime(&day.and_time(schedule.time))
                .earliest()
            {
                if at >= window_start && at < window_end {
                    out.push((at, schedule.id));
                    if !schedule.repeat_daily {
                        break;
                    }
                }
            }
            day = match day.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }
    }
    out.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    out
}
