//! Alerting System
//!
//! Plays the drowsiness cue without blocking the frame loop. Playback runs
//! as a detached blocking task; when the sound cannot be played the
//! platform fallback beep is used instead and the failure never reaches
//! the caller.

mod config;
mod fallback;
mod sink;
mod sound;

pub use config::AlertConfig;
pub use fallback::{platform_fallback, FallbackBeep, TerminalBell};
#[cfg(windows)]
pub use fallback::ConsoleBeep;
pub use sink::{AlertSink, AudioAlert};
pub use sound::{default_player, SoundPlayer, SoundResource};
#[cfg(feature = "audio")]
pub use sound::RodioPlayer;

use std::path::PathBuf;

use thiserror::Error;

/// Alert errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Alert sound not found: {}", .0.display())]
    SoundMissing(PathBuf),

    #[error("Failed to read alert sound: {0}")]
    Io(#[from] std::io::Error),

    #[error("Alert sound could not be decoded: {0}")]
    Decode(String),

    #[error("Audio playback failed: {0}")]
    Playback(String),

    #[error("Audio output not available: {0}")]
    Unsupported(String),
}
