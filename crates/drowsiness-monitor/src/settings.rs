//! Layered monitor settings
//!
//! Priority (lowest to highest):
//! 1. Built-in defaults
//! 2. TOML file (`drowsiness-monitor.toml` in the working directory, or `--config`)
//! 3. Environment (`DROWSY_` prefix, `__` between sections, e.g. `DROWSY_DMS__THRESHOLD_FRAMES`)
//! 4. Command-line flags, applied by [`crate::Cli::apply`]

use std::path::Path;

use alerting::AlertConfig;
use camera_capture::CameraConfig;
use config::{Config, Environment, File};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::MonitorError;

/// Config file looked up when no path is given (extension added by `config`)
pub const DEFAULT_CONFIG_FILE: &str = "drowsiness-monitor";

/// Preview window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Show the annotated frames in a window
    pub enabled: bool,
    /// Window title
    pub window_title: String,
    /// Key that ends the session
    pub quit_key: char,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_title: "Drowsiness Detection".to_string(),
            quit_key: 'q',
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraConfig,
    pub dms: DmsConfig,
    pub alert: AlertConfig,
    pub preview: PreviewConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load defaults, the config file and `DROWSY_*` environment variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::from_sources(path, environment())
    }

    /// Same as [`Settings::load`] with a caller-supplied environment source
    pub fn from_sources(path: Option<&Path>, env: Environment) -> Result<Self, MonitorError> {
        let file = match path {
            Some(p) => {
                debug!("Loading settings from {}", p.display());
                File::from(p).required(true)
            }
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<(), MonitorError> {
        self.dms.validate()?;
        if !self.preview.quit_key.is_ascii() {
            return Err(MonitorError::InvalidSetting(format!(
                "quit_key must be an ASCII character, got {:?}",
                self.preview.quit_key
            )));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix("DROWSY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(map))
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::from_sources(None, env(&[])).unwrap();
        assert_eq!(settings.dms.threshold_frames, 900);
        assert_eq!(settings.preview.window_title, "Drowsiness Detection");
        assert_eq!(settings.preview.quit_key, 'q');
        assert_eq!(settings.alert.sound_path, Path::new("models/alert.wav"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        std::fs::write(
            &path,
            r#"
[camera]
device_index = 2

[dms]
threshold_frames = 150
frames_per_second = 15

[dms.face]
scale_factor = 1.2
min_neighbors = 4
min_size = 40

[preview]
enabled = false
quit_key = "x"
"#,
        )
        .unwrap();

        let settings = Settings::from_sources(Some(&path), env(&[])).unwrap();
        assert_eq!(settings.camera.device_index, 2);
        assert_eq!(settings.dms.threshold_frames, 150);
        assert_eq!(settings.dms.face.min_size, 40);
        assert_eq!(settings.dms.eye.min_neighbors, 3);
        assert!(!settings.preview.enabled);
        assert_eq!(settings.preview.quit_key, 'x');
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        std::fs::write(&path, "[dms]\nthreshold_frames = 150\n").unwrap();

        let settings = Settings::from_sources(
            Some(&path),
            env(&[
                ("DROWSY_DMS__THRESHOLD_FRAMES", "60"),
                ("DROWSY_LOGGING__JSON", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.dms.threshold_frames, 60);
        assert!(settings.logging.json);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::from_sources(Some(&missing), env(&[])),
            Err(MonitorError::Settings(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_ascii_quit_key() {
        let mut settings = Settings::default();
        settings.preview.quit_key = 'ü';
        assert!(matches!(
            settings.validate(),
            Err(MonitorError::InvalidSetting(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut settings = Settings::default();
        settings.dms.threshold_frames = 0;
        assert!(matches!(settings.validate(), Err(MonitorError::Dms(_))));
    }
}
