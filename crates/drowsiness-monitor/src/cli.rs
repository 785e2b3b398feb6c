//! Command-line interface

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::Settings;

/// Webcam drowsiness monitor with an audible alert
#[derive(Parser, Debug, Default)]
#[command(name = "drowsiness-monitor", version, about)]
pub struct Cli {
    /// Settings file (TOML); defaults to ./drowsiness-monitor.toml when present
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Camera device index
    #[arg(long, value_name = "INDEX", conflicts_with = "replay")]
    pub camera: Option<i32>,

    /// Replay the images of a directory instead of reading the camera
    #[arg(long, value_name = "DIR")]
    pub replay: Option<PathBuf>,

    /// Run without the preview window
    #[arg(long)]
    pub headless: bool,

    /// Consecutive closed-eyes frames before the alert
    #[arg(long, value_name = "FRAMES")]
    pub threshold_frames: Option<u32>,

    /// Assumed frame rate for elapsed-time display
    #[arg(long, value_name = "FPS")]
    pub fps: Option<u32>,

    /// Face Haar cascade
    #[arg(long, value_name = "PATH")]
    pub face_model: Option<PathBuf>,

    /// Eye Haar cascade
    #[arg(long, value_name = "PATH")]
    pub eye_model: Option<PathBuf>,

    /// Alert sound
    #[arg(long, value_name = "PATH")]
    pub sound: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(index) = self.camera {
            settings.camera.device_index = index;
        }
        if self.headless {
            settings.preview.enabled = false;
        }
        if let Some(frames) = self.threshold_frames {
            settings.dms.threshold_frames = frames;
        }
        if let Some(fps) = self.fps {
            settings.dms.frames_per_second = fps;
        }
        if let Some(path) = &self.face_model {
            settings.dms.face_model_path = path.clone();
        }
        if let Some(path) = &self.eye_model {
            settings.dms.eye_model_path = path.clone();
        }
        if let Some(path) = &self.sound {
            settings.alert.sound_path = path.clone();
        }
        match self.verbose {
            0 => {}
            1 => settings.logging.level = "debug".to_string(),
            _ => settings.logging.level = "trace".to_string(),
        }
        if self.log_json {
            settings.logging.json = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_no_flags_keep_settings() {
        let cli = Cli::try_parse_from(["drowsiness-monitor"]).unwrap();
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.dms.threshold_frames, 900);
        assert!(settings.preview.enabled);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "drowsiness-monitor",
            "--camera",
            "1",
            "--headless",
            "--threshold-frames",
            "90",
            "--sound",
            "beep.wav",
            "-vv",
        ])
        .unwrap();

        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.camera.device_index, 1);
        assert!(!settings.preview.enabled);
        assert_eq!(settings.dms.threshold_frames, 90);
        assert_eq!(settings.alert.sound_path, Path::new("beep.wav"));
        assert_eq!(settings.logging.level, "trace");
    }

    #[test]
    fn test_replay_conflicts_with_camera() {
        let result = Cli::try_parse_from([
            "drowsiness-monitor",
            "--camera",
            "0",
            "--replay",
            "frames/",
        ]);
        assert!(result.is_err());
    }
}
