//! Driver Monitoring System (DMS)
//!
//! Webcam drowsiness monitoring:
//! - Face detection
//! - Eye detection inside each face
//! - Closed-eyes scoring with a one-shot alert per drowsy episode
//! - Overlay layout for the debug preview

pub mod analysis;
pub mod config;
pub mod detector;
pub mod state;

pub use analysis::{DmsAnalysis, Overlay, OverlayBox, OverlayColor, OverlayText};
pub use config::{CascadeParams, DmsConfig};
pub use detector::{check_model_file, FaceDetection, FaceEyeDetector, Region};
pub use state::{Action, DrowsinessPhase, DrowsinessTracker, Observation, SessionState};

#[cfg(feature = "opencv")]
pub use detector::CascadeDetector;

use std::num::NonZeroU32;
use std::path::PathBuf;

use camera_capture::VideoFrame;
use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model file not found: {}", .0.display())]
    ModelMissing(PathBuf),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detector not available: {0}")]
    Unsupported(String),
}

/// Load the Haar cascade detector named by `config`.
///
/// Both model files are checked before anything else so a missing file is
/// reported the same way with or without the `opencv` feature.
pub fn load_detector(config: &DmsConfig) -> Result<Box<dyn FaceEyeDetector>, DmsError> {
    check_model_file(&config.face_model_path)?;
    check_model_file(&config.eye_model_path)?;

    #[cfg(feature = "opencv")]
    {
        Ok(Box::new(CascadeDetector::load(config)?))
    }

    #[cfg(not(feature = "opencv"))]
    {
        Err(DmsError::Unsupported(
            "cascade detection requires the `opencv` feature".into(),
        ))
    }
}

/// Driver monitoring module
pub struct DmsModule<D> {
    detector: D,
    tracker: DrowsinessTracker,
    phase: DrowsinessPhase,
    fps: NonZeroU32,
}

impl<D: FaceEyeDetector> DmsModule<D> {
    /// Create a new DMS module with configuration
    pub fn new(config: &DmsConfig, detector: D) -> Result<Self, DmsError> {
        config.validate()?;
        let threshold = config.threshold()?;
        info!(
            "Drowsiness threshold: {} frames (~{}s at {} fps)",
            threshold,
            threshold.get() / config.frames_per_second,
            config.frames_per_second
        );

        Ok(Self {
            detector,
            tracker: DrowsinessTracker::new(threshold),
            phase: DrowsinessPhase::default(),
            fps: config.fps()?,
        })
    }

    /// Analyze a single frame for driver state
    pub fn analyze(&mut self, frame: &VideoFrame) -> Result<DmsAnalysis, DmsError> {
        let gray = frame.to_grayscale();
        let faces = self.detector.detect_faces(&gray)?;

        let mut detections = Vec::with_capacity(faces.len());
        for face in faces {
            // A face clamped to nothing still counts as present, with no eyes
            let face = face.clamp_to(gray.width, gray.height);
            let roi = if face.is_empty() {
                None
            } else {
                gray.crop(face.x, face.y, face.width, face.height)
            };
            let eyes = match roi {
                Some(roi) => self
                    .detector
                    .detect_eyes(&roi)?
                    .iter()
                    .map(|eye| face.offset(eye))
                    .collect(),
                None => Vec::new(),
            };
            detections.push(FaceDetection { face, eyes });
        }

        let observation = match detections.iter().map(|d| d.eyes.len()).max() {
            Some(eyes) => Observation::face(eyes),
            None => Observation::no_face(),
        };

        let action = self.tracker.observe(observation);
        let state = self.tracker.state();
        let phase = action.phase();

        metrics::counter!("dms_frames_processed_total").increment(1);
        if action == Action::DrowsinessAlert {
            metrics::counter!("dms_drowsiness_alerts_total").increment(1);
            info!(
                "Drowsiness detected at frame {} after {} closed-eyes frames",
                frame.sequence, state.score
            );
        } else if self.phase == DrowsinessPhase::DrowsyAlerted && phase != self.phase {
            info!("Drowsy episode ended at frame {} ({:?})", frame.sequence, phase);
        }
        if phase != self.phase {
            debug!("frame {}: phase {:?} -> {:?}", frame.sequence, self.phase, phase);
            self.phase = phase;
        }
        debug!(
            "frame {}: {} face(s), {:?} -> {:?}",
            frame.sequence,
            detections.len(),
            observation,
            action
        );

        Ok(DmsAnalysis {
            sequence: frame.sequence,
            faces: detections,
            observation,
            action,
            state,
        })
    }

    /// Frame rate used for elapsed-time display
    pub fn fps(&self) -> NonZeroU32 {
        self.fps
    }

    pub fn tracker(&self) -> &DrowsinessTracker {
        &self.tracker
    }
}
