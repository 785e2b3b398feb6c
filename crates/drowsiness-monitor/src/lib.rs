//! Drowsiness Monitor
//!
//! Wires the frame source, the DMS tracker, the alert sink and the debug
//! preview into a single-threaded frame loop.

pub mod cli;
pub mod preview;
pub mod session;
pub mod settings;

pub use cli::Cli;
pub use preview::{NullPreview, Preview, PreviewControl};
pub use session::{run_session, watch_interrupts, ExitReason, SessionSummary};
pub use settings::{LoggingConfig, PreviewConfig, Settings};

use alerting::AlertError;
use camera_capture::CameraError;
use dms::DmsError;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Alert(#[from] AlertError),

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Preview failed: {0}")]
    Preview(String),
}

/// Initialize logging
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if let Err(e) = result {
        eprintln!("warning: tracing subscriber already set: {}", e);
    }
}
