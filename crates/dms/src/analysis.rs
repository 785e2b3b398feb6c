//! DMS analysis results and overlay layout

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::detector::{FaceDetection, Region};
use crate::state::{Action, Observation, SessionState};

/// Complete per-frame analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Frame sequence number
    pub sequence: u32,

    /// Every face found, with its eyes
    pub faces: Vec<FaceDetection>,

    /// Observation fed to the tracker
    pub observation: Observation,

    /// Tracker decision for this frame
    pub action: Action,

    /// Tracker state after this frame
    pub state: SessionState,
}

impl DmsAnalysis {
    /// The caller should fire the audio alert for this frame
    pub fn should_alert(&self) -> bool {
        self.action == Action::DrowsinessAlert
    }

    /// Lay out the debug overlay for this frame
    pub fn overlay(&self, fps: NonZeroU32) -> Overlay {
        let mut boxes = Vec::new();
        for det in &self.faces {
            boxes.push(OverlayBox {
                region: det.face,
                color: OverlayColor::Blue,
            });
            if det.eyes_open() {
                boxes.extend(det.eyes.iter().map(|eye| OverlayBox {
                    region: *eye,
                    color: OverlayColor::Green,
                }));
            }
        }

        let mut texts = Vec::new();
        match self.action {
            Action::NoFace => {
                texts.push(OverlayText::status("Face is not detected", OverlayColor::Red))
            }
            Action::EyesOpen => {
                texts.push(OverlayText::status("Eyes are open", OverlayColor::Green))
            }
            Action::EyesClosed(_) | Action::DrowsinessAlert | Action::DrowsinessOngoing => {
                let secs = self.state.elapsed_secs(fps);
                texts.push(OverlayText::status(
                    format!("Eyes closed: {}s", secs),
                    OverlayColor::Red,
                ));
            }
        }
        if self.action.is_drowsy() {
            texts.push(OverlayText {
                text: "Drowsiness detected!".to_string(),
                origin: (100, 100),
                scale: 1.5,
                thickness: 3,
                color: OverlayColor::Red,
            });
        }

        Overlay { boxes, texts }
    }
}

/// Overlay palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayColor {
    Red,
    Green,
    Blue,
}

impl OverlayColor {
    /// Color as (blue, green, red)
    pub fn bgr(&self) -> (u8, u8, u8) {
        match self {
            OverlayColor::Red => (0, 0, 255),
            OverlayColor::Green => (0, 255, 0),
            OverlayColor::Blue => (255, 0, 0),
        }
    }
}

/// Rectangle to outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayBox {
    pub region: Region,
    pub color: OverlayColor,
}

/// Line of text to draw
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    /// Baseline origin in pixels
    pub origin: (i32, i32),
    pub scale: f64,
    pub thickness: i32,
    pub color: OverlayColor,
}

impl OverlayText {
    fn status(text: impl Into<String>, color: OverlayColor) -> Self {
        Self {
            text: text.into(),
            origin: (10, 30),
            scale: 1.0,
            thickness: 2,
            color,
        }
    }
}

/// Everything the preview draws on top of a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub boxes: Vec<OverlayBox>,
    pub texts: Vec<OverlayText>,
}
