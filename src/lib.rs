//! plazaWave — Core library for the holiday plaza music scheduler.
//!
//! All scheduling, volume, and playlist logic lives here. The CLI and the
//! remote control surface consume this crate through [`app_core::AppCore`].

pub mod ad_scheduler;
pub mod app_core;
pub mod engine;
pub mod event_log;
pub mod events;
pub mod fixed_schedule;
pub mod playlist;
pub mod services;
pub mod ticker;
pub mod track;
pub mod volume;
