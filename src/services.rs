//! Interfaces to external collaborators: the playback driver reporting its
//! status, and the mix/TTS service that renders announcements into audio.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status snapshot reported by the external playback driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// Track currently playing, if any.
    pub current: Option<Uuid>,
    pub is_playing: bool,
    #[serde(default)]
    pub position_secs: f64,
    pub volume: f32,
    /// Whether the driver currently holds a connection to the engine.
    pub connected: bool,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        PlayerStatus {
            current: None,
            is_playing: false,
            position_secs: 0.0,
            volume: 1.0,
            connected: false,
        }
    }
}

/// Output of an announcement render: a stored audio file the engine can
/// register as a track.
#[derive(Debug, Clone)]
pub struct RenderedAudio {
    pub name: String,
    pub duration_secs: u32,
}

/// Text-to-speech + background-music mixing, performed out of process. The
/// engine only consumes the returned metadata; failures surface to the caller
/// and leave state untouched.
pub trait AudioMixService {
    fn render(
        &self,
        text: &str,
        voice: &str,
        background: Option<Uuid>,
    ) -> Result<RenderedAudio, String>;
}
