//! Alert configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Sound played when drowsiness is detected
    pub sound_path: PathBuf,
    /// Fallback console beep pitch (Windows only)
    pub beep_frequency_hz: u32,
    /// Fallback console beep length (Windows only)
    pub beep_duration_ms: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_path: PathBuf::from("models/alert.wav"),
            beep_frequency_hz: 1000,
            beep_duration_ms: 500,
        }
    }
}
