//! Image-sequence replay source

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::ImageFormat;
use tracing::{debug, info};

use crate::{CameraError, FrameSource, VideoFrame};

/// Replays the still images of a directory as a video stream.
///
/// Files are visited in sorted path order; anything whose extension is not
/// a known image format is skipped. The stream ends after the last image.
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
    sequence: u32,
    started: Instant,
}

impl ImageSequence {
    /// Collect the images of `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && ImageFormat::from_path(path).is_ok())
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CameraError::Open(format!(
                "{}: no image files to replay",
                dir.display()
            )));
        }

        info!("Replaying {} images from {}", paths.len(), dir.display());

        Ok(Self {
            paths: paths.into_iter(),
            sequence: 0,
            started: Instant::now(),
        })
    }

}

impl FrameSource for ImageSequence {
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let Some(path) = self.paths.next() else {
            debug!("Image sequence exhausted");
            return Ok(None);
        };

        let img = image::open(&path)
            .map_err(|e| CameraError::Read(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        let frame = VideoFrame::from_rgb_image(
            img,
            self.started.elapsed().as_nanos() as u64,
            self.sequence,
        );
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }
}
