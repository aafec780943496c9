//! In-process push channel. Mutations and player status updates broadcast a
//! [`PushEvent`] to every subscriber; whatever transport fronts the engine
//! (remote control surface, test harness) subscribes here.

use crate::services::PlayerStatus;
use serde::Serialize;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// Notification fanned out after state changes. Fire-and-forget.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    PlayerStatus { status: PlayerStatus },
    VolumeChanged { volume: f32, manual: bool },
    PlaylistRegenerated { events: usize },
    ScheduleUpdated { kind: &'static str },
    MusicAdded { name: String },
    MusicDeleted { name: String },
}

/// Best-effort broadcast to a dynamic subscriber list. Senders whose receiver
/// hung up are pruned on the next broadcast.
#[derive(Default)]
pub struct Notifier {
    subscribers: Mutex<Vec<Sender<PushEvent>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> Receiver<PushEvent> {
        let (tx, rx) = channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    pub fn broadcast(&self, event: PushEvent) {
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}
