//! Volume model: hourly baseline grid, named time-of-day periods (fixed or
//! gradient), and the operator's manual override, combined with a fixed
//! precedence rule. Resolution is a pure function so it can run on any thread
//! and in tests without a clock.

use chrono::{DateTime, Local, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Resolved changes smaller than this emit no log entry or volume event.
pub const VOLUME_EPSILON: f32 = 0.02;

/// Seconds a fresh manual override survives scheduled recomputation. Within
/// this window a tick must not clobber a volume the operator just set.
pub const MANUAL_GRACE_SECS: i64 = 3;

/// Parse a time-of-day string in HH:MM or HH:MM:SS format.
pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("Invalid time '{}'. Expected HH:MM or HH:MM:SS", s))
}

// ── Hourly grid ──────────────────────────────────────────────────────────────

/// Baseline volume per hour of day. Exactly 24 slots; direct indexing by
/// hour, no interpolation between hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyVolumes([f32; 24]);

impl Default for HourlyVolumes {
    fn default() -> Self {
        HourlyVolumes([0.5; 24])
    }
}

impl HourlyVolumes {
    pub fn get(&self, hour: u32) -> f32 {
        self.0[(hour % 24) as usize]
    }

    pub fn set(&mut self, hour: u8, volume: f32) -> Result<(), String> {
        if hour > 23 {
            return Err(format!("Invalid hour {} (expected 0-23)", hour));
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(format!("Volume {} out of range 0-1", volume));
        }
        self.0[hour as usize] = volume;
        Ok(())
    }

    pub fn as_slice(&self) -> &[f32; 24] {
        &self.0
    }
}

// ── Periods ──────────────────────────────────────────────────────────────────

/// A period is either a flat volume or a linear ramp across its window.
/// Exactly one variant per record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PeriodLevel {
    Fixed { volume: f32 },
    Gradient { volume_start: f32, volume_end: f32 },
}

/// A named time-of-day volume window. Same-day only: time_start must precede
/// time_end (no cross-midnight wraparound).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumePeriod {
    pub id: u32,
    pub time_start: NaiveTime,
    pub time_end: NaiveTime,
    pub level: PeriodLevel,
}

impl VolumePeriod {
    /// Validate bounds and scalar ranges. Called at the mutation boundary.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_start >= self.time_end {
            return Err(format!(
                "Period start {} must be before end {}",
                self.time_start.format("%H:%M"),
                self.time_end.format("%H:%M")
            ));
        }
        let scalars = match self.level {
            PeriodLevel::Fixed { volume } => vec![volume],
            PeriodLevel::Gradient {
                volume_start,
                volume_end,
            } => vec![volume_start, volume_end],
        };
        for v in scalars {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("Volume {} out of range 0-1", v));
            }
        }
        Ok(())
    }

    /// Half-open membership: start inclusive, end exclusive, so back-to-back
    /// periods hand off cleanly at the shared minute.
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.time_start <= t && t < self.time_end
    }

    /// Two periods overlap if their half-open windows share any instant.
    /// Sharing only a boundary (08:00-10:00 and 10:00-12:00) is not overlap.
    pub fn overlaps(&self, other: &VolumePeriod) -> bool {
        self.time_start < other.time_end && other.time_start < self.time_end
    }

    /// Volume at a time-of-day inside this window. Gradients interpolate
    /// linearly by fractional position and clamp at both bounds, so the value
    /// equals volume_start at time_start and volume_end at time_end.
    pub fn volume_at(&self, t: NaiveTime) -> f32 {
        match self.level {
            PeriodLevel::Fixed { volume } => volume,
            PeriodLevel::Gradient {
                volume_start,
                volume_end,
            } => {
                let span = (self.time_end - self.time_start).num_seconds();
                if span <= 0 {
                    return volume_start;
                }
                let elapsed = (t - self.time_start).num_seconds();
                let frac = (elapsed as f32 / span as f32).clamp(0.0, 1.0);
                volume_start + frac * (volume_end - volume_start)
            }
        }
    }

    pub fn level_display(&self) -> String {
        match self.level {
            PeriodLevel::Fixed { volume } => format!("{:.0}%", volume * 100.0),
            PeriodLevel::Gradient {
                volume_start,
                volume_end,
            } => format!("{:.0}% -> {:.0}%", volume_start * 100.0, volume_end * 100.0),
        }
    }
}

// ── Manual override ──────────────────────────────────────────────────────────

/// Operator-issued direct volume set. Last writer wins: the timestamp lets the
/// scheduled tick tell a fresh override (leave it alone) from a stale one
/// (supersede it).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ManualVolume {
    pub volume: f32,
    pub set_at: DateTime<Local>,
}

impl ManualVolume {
    pub fn set_now(volume: f32) -> Self {
        ManualVolume {
            volume: volume.clamp(0.0, 1.0),
            set_at: Local::now(),
        }
    }

    /// Whether this override is still inside its grace window at `now`.
    pub fn within_grace(&self, now: DateTime<Local>) -> bool {
        (now - self.set_at).num_seconds() < MANUAL_GRACE_SECS
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Schedule-derived volume at an instant, ignoring any manual override:
/// matching period first (highest id wins if state holds overlapping
/// periods), hourly grid otherwise.
pub fn scheduled_volume(
    at: DateTime<Local>,
    hourly: &HourlyVolumes,
    periods: &[VolumePeriod],
) -> f32 {
    let t = at.time();
    let winner = periods
        .iter()
        .filter(|p| p.contains(t))
        .max_by_key(|p| p.id);
    let v = match winner {
        Some(p) => p.volume_at(t),
        None => hourly.get(at.hour()),
    };
    v.clamp(0.0, 1.0)
}

/// Effective output volume at an instant. Precedence: manual override,
/// matching period, hourly grid. Always in [0, 1].
pub fn resolve_volume(
    at: DateTime<Local>,
    hourly: &HourlyVolumes,
    periods: &[VolumePeriod],
    manual: Option<&ManualVolume>,
) -> f32 {
    if let Some(m) = manual {
        return m.volume.clamp(0.0, 1.0);
    }
    scheduled_volume(at, hourly, periods)
}
