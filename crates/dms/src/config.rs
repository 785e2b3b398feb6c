//! DMS configuration

use std::num::NonZeroU32;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Parameters for one cascade classifier pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeParams {
    /// Image pyramid step between detection scales (must be > 1.0)
    pub scale_factor: f64,

    /// Neighbouring hits required to keep a candidate
    pub min_neighbors: i32,

    /// Smallest object size considered, in pixels (0 = no limit)
    pub min_size: u32,
}

impl CascadeParams {
    /// Face pass defaults
    pub fn face() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_size: 0,
        }
    }

    /// Eye pass defaults
    pub fn eye() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: 0,
        }
    }
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Consecutive closed-eyes frames before the drowsiness alert
    pub threshold_frames: u32,

    /// Assumed capture rate, used to turn frame counts into seconds
    pub frames_per_second: u32,

    /// Haar cascade for frontal faces
    pub face_model_path: PathBuf,

    /// Haar cascade for eyes
    pub eye_model_path: PathBuf,

    /// Face detection parameters
    pub face: CascadeParams,

    /// Eye detection parameters
    pub eye: CascadeParams,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            threshold_frames: 900, // 30 seconds at ~30 FPS
            frames_per_second: 30,
            face_model_path: PathBuf::from("models/haarcascade_frontalface_default.xml"),
            eye_model_path: PathBuf::from("models/haarcascade_eye.xml"),
            face: CascadeParams::face(),
            eye: CascadeParams::eye(),
        }
    }
}

impl DmsConfig {
    /// Alert threshold in frames
    pub fn threshold(&self) -> Result<NonZeroU32, DmsError> {
        NonZeroU32::new(self.threshold_frames)
            .ok_or_else(|| DmsError::Config("threshold_frames must be at least 1".into()))
    }

    /// Frame rate used for elapsed-time display
    pub fn fps(&self) -> Result<NonZeroU32, DmsError> {
        NonZeroU32::new(self.frames_per_second)
            .ok_or_else(|| DmsError::Config("frames_per_second must be at least 1".into()))
    }

    /// Check every value the detector and tracker rely on
    pub fn validate(&self) -> Result<(), DmsError> {
        self.threshold()?;
        self.fps()?;
        for (name, params) in [("face", &self.face), ("eye", &self.eye)] {
            if !(params.scale_factor > 1.0) {
                return Err(DmsError::Config(format!(
                    "{} scale_factor must be greater than 1.0, got {}",
                    name, params.scale_factor
                )));
            }
            if params.min_neighbors < 0 {
                return Err(DmsError::Config(format!(
                    "{} min_neighbors must not be negative",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DmsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold().unwrap().get(), 900);
        assert_eq!(config.face.min_neighbors, 5);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = DmsConfig {
            threshold_frames: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DmsError::Config(_))));
    }

    #[test]
    fn test_zero_fps_rejected() {
        let config = DmsConfig {
            frames_per_second: 0,
            ..Default::default()
        };
        assert!(matches!(config.fps(), Err(DmsError::Config(_))));
    }

    #[test]
    fn test_scale_factor_must_grow() {
        let mut config = DmsConfig::default();
        config.eye.scale_factor = 1.0;
        assert!(config.validate().is_err());

        config.eye.scale_factor = f64::NAN;
        assert!(config.validate().is_err());
    }
}
