//! Camera Capture Library for the Drowsiness Monitor
//!
//! Provides frame sources for the monitoring loop:
//! - Webcam capture through OpenCV `VideoCapture` (feature `opencv`)
//! - Image-sequence replay from a directory of stills
//!
//! Both sources yield [`VideoFrame`]s so the rest of the pipeline never
//! touches a vision-library type directly.

pub mod frame;
pub mod sequence;

#[cfg(feature = "opencv")]
pub mod capture;

pub use frame::{GrayFrame, PixelFormat, VideoFrame};
pub use sequence::ImageSequence;

#[cfg(feature = "opencv")]
pub use capture::OpenCvCamera;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Frame read failed: {0}")]
    Read(String),

    #[error("Camera support not available: {0}")]
    Unsupported(String),
}

/// A source of video frames, read one at a time by the frame loop.
///
/// Implementations own their device handle and release it on drop.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` once the stream has ended. An `Err` means the
    /// device failed to deliver a frame.
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        (**self).read_frame()
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index passed to the capture backend (0 = default webcam)
    pub device_index: i32,
    /// Requested capture width (backend default when unset)
    pub width: Option<u32>,
    /// Requested capture height (backend default when unset)
    pub height: Option<u32>,
    /// Requested capture rate (backend default when unset)
    pub fps: Option<u32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: None,
            height: None,
            fps: None,
        }
    }
}

impl CameraConfig {
    /// Open the configured webcam.
    ///
    /// Fails with [`CameraError::Unsupported`] when the crate was built
    /// without the `opencv` feature.
    pub fn open(&self) -> Result<Box<dyn FrameSource>, CameraError> {
        #[cfg(feature = "opencv")]
        {
            Ok(Box::new(OpenCvCamera::open(self)?))
        }

        #[cfg(not(feature = "opencv"))]
        {
            Err(CameraError::Unsupported(format!(
                "device {} requested but this build has no `opencv` feature",
                self.device_index
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_first_device() {
        let config = CameraConfig::default();
        assert_eq!(config.device_index, 0);
        assert!(config.width.is_none());
        assert!(config.fps.is_none());
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_open_without_backend_is_unsupported() {
        let err = CameraConfig::default().open().err();
        assert!(matches!(err, Some(CameraError::Unsupported(_))));
    }

    #[test]
    fn test_boxed_source_forwards_reads() {
        struct Countdown(u32);

        impl FrameSource for Countdown {
            fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
                if self.0 == 0 {
                    return Ok(None);
                }
                self.0 -= 1;
                Ok(Some(VideoFrame::new(vec![0; 3], 1, 1, PixelFormat::Bgr24, 0, self.0)))
            }
        }

        let mut source: Box<dyn FrameSource> = Box::new(Countdown(2));
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_none());
    }
}
