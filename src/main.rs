use clap::{Parser, Subcommand};
use plaza_wave::ad_scheduler::AdInterval;
use plaza_wave::app_core::AppCore;
use plaza_wave::playlist::SelectionPolicy;
use plaza_wave::ticker::{VolumeTicker, TICK_INTERVAL_SECS};
use plaza_wave::volume::PeriodLevel;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "plazawave", about = "Holiday plaza music scheduler CLI")]
struct Cli {
    /// Data directory (state + logs). Defaults to the user data dir,
    /// overridable with PLAZAWAVE_DATA.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine status
    Status,
    /// Run the volume scheduler in the foreground
    Run {
        /// Seconds between volume recomputations
        #[arg(long, default_value_t = TICK_INTERVAL_SECS)]
        tick_secs: u64,
    },
    /// Track catalog management
    Music {
        #[command(subcommand)]
        action: MusicCmd,
    },
    /// Volume model: manual override, hourly grid, periods
    Volume {
        #[command(subcommand)]
        action: VolumeCmd,
    },
    /// Ad schedule management
    Ads {
        #[command(subcommand)]
        action: AdsCmd,
    },
    /// Fixed-time song management
    Songs {
        #[command(subcommand)]
        action: SongsCmd,
    },
    /// Playlist generation and queue edits
    Playlist {
        #[command(subcommand)]
        action: PlaylistCmd,
    },
    /// Event log
    Logs {
        #[command(subcommand)]
        action: LogsCmd,
    },
}

#[derive(Subcommand)]
enum MusicCmd {
    /// List catalog tracks
    List,
    /// Register an externally stored audio file
    Add {
        /// Display name of the file
        name: String,
        /// Measured duration in seconds, if known
        #[arg(long)]
        duration: Option<u32>,
        /// Register as an ad rather than music
        #[arg(long)]
        ad: bool,
    },
    /// Flip a track between music and ad
    SetAd {
        /// Track id or name
        track: String,
        /// true/false
        value: bool,
    },
    /// Remove a track from the catalog
    Remove {
        /// Track id or name
        track: String,
    },
}

#[derive(Subcommand)]
enum VolumeCmd {
    /// Show the volume model
    Show,
    /// Set a manual volume override (0-1)
    Set { volume: f32 },
    /// Set hourly baseline slots, e.g. 8=0.6 22=0.2
    Hourly {
        /// hour=volume pairs
        #[arg(required = true)]
        slots: Vec<String>,
    },
    /// Volume period management
    Period {
        #[command(subcommand)]
        action: PeriodCmd,
    },
}

#[derive(Subcommand)]
enum PeriodCmd {
    /// List periods
    List,
    /// Add a period (fixed --volume, or gradient --from/--to)
    Add {
        /// Start time HH:MM
        start: String,
        /// End time HH:MM
        end: String,
        /// Fixed volume (0-1)
        #[arg(long)]
        volume: Option<f32>,
        /// Gradient start volume (0-1)
        #[arg(long)]
        from: Option<f32>,
        /// Gradient end volume (0-1)
        #[arg(long)]
        to: Option<f32>,
    },
    /// Remove a period by id
    Remove { id: u32 },
}

#[derive(Subcommand)]
enum AdsCmd {
    /// List ad schedules
    List,
    /// Add an ad schedule
    Add {
        /// Track id or name
        track: String,
        /// Cadence in minutes
        #[arg(long, conflicts_with = "songs")]
        minutes: Option<u32>,
        /// Cadence in songs played
        #[arg(long)]
        songs: Option<u32>,
    },
    /// Remove an ad schedule by id
    Remove { id: u32 },
    /// Enable/disable an ad schedule
    Toggle { id: u32 },
}

#[derive(Subcommand)]
enum SongsCmd {
    /// List fixed-time songs
    List,
    /// Schedule a song at a time of day
    Add {
        /// Track id or name
        track: String,
        /// Time of day HH:MM
        time: String,
        /// Repeat every day
        #[arg(long)]
        daily: bool,
    },
    /// Remove a fixed-time song by id
    Remove { id: u32 },
}

#[derive(Subcommand)]
enum PlaylistCmd {
    /// Regenerate the sequence for the next N hours
    Generate {
        /// Window length in hours
        #[arg(default_value_t = 4)]
        hours: u32,
        /// RNG seed for reproducible sequences
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the stored sequence
    Preview {
        /// Hours ahead to show
        #[arg(default_value_t = 4)]
        hours: u32,
    },
    /// Splice a track in front of the remaining queue
    Next {
        /// Track id or name
        track: String,
    },
    /// Set the random selection policy
    Policy {
        /// uniform | shuffle
        policy: String,
    },
}

#[derive(Subcommand)]
enum LogsCmd {
    /// Show log entries, newest first
    Show {
        /// Filter by type (music, ad, manual, scheduled, app, connection)
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Delete log entries (all, or only those older than --before-days)
    Clear {
        #[arg(long)]
        before_days: Option<u32>,
    },
}

fn data_dir(cli_override: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_override {
        return dir;
    }
    if let Ok(dir) = std::env::var("PLAZAWAVE_DATA") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plazawave")
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn unwrap_or_fail<T>(result: Result<T, String>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => fail(&e),
    }
}

/// Resolve a track argument: a full UUID, or a (case-insensitive) name.
fn resolve_track(core: &AppCore, arg: &str) -> Uuid {
    if let Ok(id) = Uuid::parse_str(arg) {
        return id;
    }
    let matches: Vec<_> = core
        .engine
        .catalog
        .iter()
        .filter(|t| t.original_name.eq_ignore_ascii_case(arg))
        .collect();
    match matches.as_slice() {
        [t] => t.id,
        [] => fail(&format!("No track named '{}'", arg)),
        _ => fail(&format!("Multiple tracks named '{}'; use the id", arg)),
    }
}

fn main() {
    let cli = Cli::parse();
    let dir = data_dir(cli.data_dir);
    let mut core = AppCore::new(&dir);

    match cli.command {
        Commands::Status => {
            let s = core.get_status();
            println!("Tracks:          {} music, {} ads", s.track_count, s.ad_count);
            println!("Ad schedules:    {}", s.ad_schedule_count);
            println!("Fixed songs:     {}", s.fixed_song_count);
            println!("Volume periods:  {}", s.period_count);
            println!("Playlist events: {}", s.playlist_event_count);
            println!(
                "Volume:          {:.0}%{}",
                s.current_volume * 100.0,
                if s.manual_override { " (manual)" } else { "" }
            );
            println!(
                "Player:          {}",
                if s.player_connected { "connected" } else { "disconnected" }
            );
        }

        Commands::Run { tick_secs } => {
            if tick_secs == 0 {
                fail("Tick interval must be at least 1 second");
            }
            let core = Arc::new(Mutex::new(core));
            let tick_core = core.clone();
            let _ticker = VolumeTicker::spawn(Duration::from_secs(tick_secs), move || {
                tick_core.lock().unwrap().volume_tick(chrono::Local::now());
            });
            println!("Volume scheduler running (every {}s). Ctrl+C to stop.", tick_secs);
            loop {
                std::thread::sleep(Duration::from_secs(60));
            }
        }

        Commands::Music { action } => match action {
            MusicCmd::List => {
                let tracks = core.get_tracks();
                if tracks.is_empty() {
                    println!("Catalog is empty.");
                    return;
                }
                for t in tracks {
                    println!(
                        "{}  {:5}  {:5}  {}",
                        t.id,
                        if t.is_ad { "ad" } else { "music" },
                        t.duration_display,
                        t.original_name
                    );
                }
            }
            MusicCmd::Add { name, duration, ad } => {
                let data = unwrap_or_fail(core.add_track(&name, duration, ad));
                println!("Added {} ({})", data.original_name, data.id);
            }
            MusicCmd::SetAd { track, value } => {
                let id = resolve_track(&core, &track);
                unwrap_or_fail(core.set_track_ad_flag(id, value));
                println!("Updated.");
            }
            MusicCmd::Remove { track } => {
                let id = resolve_track(&core, &track);
                unwrap_or_fail(core.delete_track(id));
                println!("Removed.");
            }
        },

        Commands::Volume { action } => match action {
            VolumeCmd::Show => {
                let s = core.get_settings();
                println!(
                    "Current: {:.0}%{}",
                    s.current_volume * 100.0,
                    if s.manual_override { " (manual)" } else { "" }
                );
                println!("Hourly grid:");
                for (hour, v) in s.hourly.iter().enumerate() {
                    print!("  {:02}={:.0}%", hour, v * 100.0);
                    if hour % 6 == 5 {
                        println!();
                    }
                }
                if s.periods.is_empty() {
                    println!("No periods.");
                } else {
                    println!("Periods:");
                    for p in s.periods {
                        println!(
                            "  [{}] {} - {}  {}",
                            p.id, p.time_start, p.time_end, p.level_display
                        );
                    }
                }
            }
            VolumeCmd::Set { volume } => {
                let applied = unwrap_or_fail(core.set_volume(volume));
                println!("Volume set to {:.0}% (manual).", applied * 100.0);
            }
            VolumeCmd::Hourly { slots } => {
                let mut map = HashMap::new();
                for slot in &slots {
                    let (hour, volume) = match slot.split_once('=') {
                        Some((h, v)) => (h, v),
                        None => fail(&format!("Expected hour=volume, got '{}'", slot)),
                    };
                    let hour: u8 = match hour.parse() {
                        Ok(h) => h,
                        Err(_) => fail(&format!("Invalid hour '{}'", hour)),
                    };
                    let volume: f32 = match volume.parse() {
                        Ok(v) => v,
                        Err(_) => fail(&format!("Invalid volume '{}'", volume)),
                    };
                    map.insert(hour, volume);
                }
                unwrap_or_fail(core.set_hourly_volumes(&map));
                println!("Hourly grid updated ({} slots).", map.len());
            }
            VolumeCmd::Period { action } => match action {
                PeriodCmd::List => {
                    for p in core.get_settings().periods {
                        println!(
                            "[{}] {} - {}  {}",
                            p.id, p.time_start, p.time_end, p.level_display
                        );
                    }
                }
                PeriodCmd::Add {
                    start,
                    end,
                    volume,
                    from,
                    to,
                } => {
                    let level = match (volume, from, to) {
                        (Some(v), None, None) => PeriodLevel::Fixed { volume: v },
                        (None, Some(f), Some(t)) => PeriodLevel::Gradient {
                            volume_start: f,
                            volume_end: t,
                        },
                        _ => fail("Use either --volume, or both --from and --to"),
                    };
                    let data = unwrap_or_fail(core.add_period(&start, &end, level));
                    println!("Period {} added: {}", data.id, data.level_display);
                }
                PeriodCmd::Remove { id } => {
                    unwrap_or_fail(core.delete_period(id));
                    println!("Period {} removed.", id);
                }
            },
        },

        Commands::Ads { action } => match action {
            AdsCmd::List => {
                let schedules = core.get_ad_schedules();
                if schedules.is_empty() {
                    println!("No ad schedules.");
                    return;
                }
                for s in schedules {
                    println!(
                        "[{}] {}  {}  {}",
                        s.id,
                        s.track_name,
                        s.interval_display,
                        if s.enabled { "on" } else { "off" }
                    );
                }
            }
            AdsCmd::Add {
                track,
                minutes,
                songs,
            } => {
                let interval = match (minutes, songs) {
                    (Some(m), None) => AdInterval::Minutes(m),
                    (None, Some(s)) => AdInterval::Songs(s),
                    _ => fail("Specify exactly one of --minutes or --songs"),
                };
                let id = resolve_track(&core, &track);
                let data = unwrap_or_fail(core.add_ad_schedule(id, interval));
                println!("Ad schedule {} added ({}).", data.id, data.interval_display);
            }
            AdsCmd::Remove { id } => {
                unwrap_or_fail(core.delete_ad_schedule(id));
                println!("Ad schedule {} removed.", id);
            }
            AdsCmd::Toggle { id } => {
                let enabled = unwrap_or_fail(core.toggle_ad_schedule(id));
                println!(
                    "Ad schedule {} is now {}.",
                    id,
                    if enabled { "enabled" } else { "disabled" }
                );
            }
        },

        Commands::Songs { action } => match action {
            SongsCmd::List => {
                let songs = core.get_scheduled_songs();
                if songs.is_empty() {
                    println!("No fixed-time songs.");
                    return;
                }
                for s in songs {
                    println!(
                        "[{}] {}  {}  {}{}",
                        s.id,
                        s.time,
                        s.track_name,
                        if s.repeat_daily { "daily" } else { "once" },
                        if s.fired { " (fired)" } else { "" }
                    );
                }
            }
            SongsCmd::Add { track, time, daily } => {
                let id = resolve_track(&core, &track);
                let schedule_id = unwrap_or_fail(core.add_scheduled_song(id, &time, daily));
                println!("Fixed song {} added at {}.", schedule_id, time);
            }
            SongsCmd::Remove { id } => {
                unwrap_or_fail(core.delete_scheduled_song(id));
                println!("Fixed song {} removed.", id);
            }
        },

        Commands::Playlist { action } => match action {
            PlaylistCmd::Generate { hours, seed } => {
                let count = match seed {
                    Some(s) => {
                        let mut rng = fastrand::Rng::with_seed(s);
                        unwrap_or_fail(core.regenerate_playlist_with(
                            hours,
                            &mut rng,
                            chrono::Local::now(),
                        ))
                    }
                    None => unwrap_or_fail(core.regenerate_playlist(hours)),
                };
                println!("Generated {} events over {}h.", count, hours);
            }
            PlaylistCmd::Preview { hours } => {
                let events = core.preview(hours);
                if events.is_empty() {
                    println!("No playlist. Run 'playlist generate' first.");
                    return;
                }
                for e in events {
                    println!(
                        "{}  {:9}  {:3}  {:>4}s  {}",
                        e.at,
                        e.kind,
                        if e.played { "[x]" } else { "[ ]" },
                        e.duration_secs,
                        e.name.unwrap_or_else(|| format!("{:.0}%", e.volume * 100.0))
                    );
                }
            }
            PlaylistCmd::Next { track } => {
                let id = resolve_track(&core, &track);
                unwrap_or_fail(core.play_next(id));
                println!("Queued.");
            }
            PlaylistCmd::Policy { policy } => {
                let parsed = match policy.trim().to_lowercase().as_str() {
                    "uniform" => SelectionPolicy::UniformNoRepeat,
                    "shuffle" => SelectionPolicy::ShuffleCycle,
                    other => fail(&format!("Unknown policy '{}' (uniform|shuffle)", other)),
                };
                unwrap_or_fail(core.set_selection_policy(parsed));
                println!("Selection policy set to {}.", policy.trim().to_lowercase());
            }
        },

        Commands::Logs { action } => match action {
            LogsCmd::Show {
                kind,
                limit,
                offset,
            } => {
                let page = unwrap_or_fail(core.get_logs(kind.as_deref(), limit, offset));
                println!("{} entries ({} total):", page.entries.len(), page.total);
                for e in page.entries {
                    println!(
                        "{}  {:16}  {}{}",
                        e.at.format("%Y-%m-%d %H:%M:%S"),
                        e.kind.as_str(),
                        e.description,
                        e.details.map(|d| format!(" ({})", d)).unwrap_or_default()
                    );
                }
            }
            LogsCmd::Clear { before_days } => {
                let removed = core.clear_logs(before_days);
                println!("Removed {} entries.", removed);
            }
        },
    }
}
