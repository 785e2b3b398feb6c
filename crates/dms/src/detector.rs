//! Face and eye detection

use std::path::Path;

use camera_capture::GrayFrame;
use serde::{Deserialize, Serialize};

use crate::state::EYES_OPEN_MIN;
use crate::DmsError;

/// Axis-aligned detection box, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Shrink the region so it lies inside a `width` x `height` frame
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Region {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    /// Translate a region expressed relative to `self` into frame coordinates
    pub fn offset(&self, inner: &Region) -> Region {
        Region {
            x: self.x.saturating_add(inner.x),
            y: self.y.saturating_add(inner.y),
            ..*inner
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One detected face and the eyes found inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Face box in frame coordinates
    pub face: Region,
    /// Eye boxes in frame coordinates
    pub eyes: Vec<Region>,
}

impl FaceDetection {
    /// Two or more eyes visible
    pub fn eyes_open(&self) -> bool {
        self.eyes.len() >= EYES_OPEN_MIN
    }
}

/// Pretrained face/eye detector.
///
/// Implementations wrap an external vision library; the monitor only needs
/// the two queries below.
pub trait FaceEyeDetector {
    /// Faces in a full grayscale frame
    fn detect_faces(&mut self, gray: &GrayFrame) -> Result<Vec<Region>, DmsError>;

    /// Eyes in a face crop; regions are relative to the crop
    fn detect_eyes(&mut self, face_roi: &GrayFrame) -> Result<Vec<Region>, DmsError>;
}

impl<D: FaceEyeDetector + ?Sized> FaceEyeDetector for Box<D> {
    fn detect_faces(&mut self, gray: &GrayFrame) -> Result<Vec<Region>, DmsError> {
        (**self).detect_faces(gray)
    }

    fn detect_eyes(&mut self, face_roi: &GrayFrame) -> Result<Vec<Region>, DmsError> {
        (**self).detect_eyes(face_roi)
    }
}

/// Fail early when a model file is missing
pub fn check_model_file(path: &Path) -> Result<(), DmsError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DmsError::ModelMissing(path.to_path_buf()))
    }
}

#[cfg(feature = "opencv")]
pub use cascade::CascadeDetector;

#[cfg(feature = "opencv")]
mod cascade {
    use std::path::Path;

    use camera_capture::capture::gray_to_mat;
    use camera_capture::GrayFrame;
    use opencv::core::{Rect, Size, Vector};
    use opencv::objdetect::CascadeClassifier;
    use opencv::prelude::*;
    use tracing::info;

    use super::{check_model_file, FaceEyeDetector, Region};
    use crate::config::CascadeParams;
    use crate::{DmsConfig, DmsError};

    /// Haar cascade face/eye detector backed by OpenCV
    pub struct CascadeDetector {
        face: CascadeClassifier,
        eye: CascadeClassifier,
        face_params: CascadeParams,
        eye_params: CascadeParams,
    }

    impl CascadeDetector {
        /// Load both cascades, failing if either is missing or unreadable
        pub fn load(config: &DmsConfig) -> Result<Self, DmsError> {
            Ok(Self {
                face: load_cascade(&config.face_model_path)?,
                eye: load_cascade(&config.eye_model_path)?,
                face_params: config.face,
                eye_params: config.eye,
            })
        }
    }

    fn load_cascade(path: &Path) -> Result<CascadeClassifier, DmsError> {
        check_model_file(path)?;
        info!("Loading cascade from {}", path.display());

        let name = path.to_string_lossy();
        let classifier = CascadeClassifier::new(&name)
            .map_err(|e| DmsError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        let empty = classifier
            .empty()
            .map_err(|e| DmsError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        if empty {
            return Err(DmsError::ModelLoad(format!(
                "{}: file may be corrupted or not a valid Haar cascade",
                path.display()
            )));
        }
        Ok(classifier)
    }

    fn run(
        classifier: &mut CascadeClassifier,
        gray: &GrayFrame,
        params: &CascadeParams,
    ) -> Result<Vec<Region>, DmsError> {
        let mat = gray_to_mat(gray).map_err(|e| DmsError::Detection(e.to_string()))?;
        let min = params.min_size as i32;

        let mut hits = Vector::<Rect>::new();
        classifier
            .detect_multi_scale(
                &mat,
                &mut hits,
                params.scale_factor,
                params.min_neighbors,
                0,
                Size::new(min, min),
                Size::new(0, 0),
            )
            .map_err(|e| DmsError::Detection(e.to_string()))?;

        Ok(hits
            .iter()
            .map(|r| {
                Region::new(
                    r.x.max(0) as u32,
                    r.y.max(0) as u32,
                    r.width.max(0) as u32,
                    r.height.max(0) as u32,
                )
            })
            .collect())
    }

    impl FaceEyeDetector for CascadeDetector {
        fn detect_faces(&mut self, gray: &GrayFrame) -> Result<Vec<Region>, DmsError> {
            run(&mut self.face, gray, &self.face_params)
        }

        fn detect_eyes(&mut self, face_roi: &GrayFrame) -> Result<Vec<Region>, DmsError> {
            run(&mut self.eye, face_roi, &self.eye_params)
        }
    }
}
