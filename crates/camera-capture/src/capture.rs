//! OpenCV webcam capture and `Mat` conversions

use std::time::Instant;

use opencv::core::{Mat, CV_8UC3};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use tracing::{debug, info, warn};

use crate::{CameraConfig, CameraError, FrameSource, GrayFrame, PixelFormat, VideoFrame};

/// Webcam opened through OpenCV's `VideoCapture`.
///
/// The device is released when the camera is dropped, so every exit path of
/// the frame loop gives the handle back.
pub struct OpenCvCamera {
    capture: VideoCapture,
    device_index: i32,
    sequence: u32,
    started: Instant,
}

impl OpenCvCamera {
    /// Open the device and apply the requested capture properties
    pub fn open(config: &CameraConfig) -> Result<Self, CameraError> {
        let capture = VideoCapture::new(config.device_index, videoio::CAP_ANY)
            .map_err(|e| CameraError::Open(e.to_string()))?;

        let opened = capture
            .is_opened()
            .map_err(|e| CameraError::Open(e.to_string()))?;
        if !opened {
            return Err(CameraError::Open(format!(
                "Cannot access webcam {}",
                config.device_index
            )));
        }

        let mut camera = Self {
            capture,
            device_index: config.device_index,
            sequence: 0,
            started: Instant::now(),
        };

        camera.request(videoio::CAP_PROP_FRAME_WIDTH, config.width);
        camera.request(videoio::CAP_PROP_FRAME_HEIGHT, config.height);
        camera.request(videoio::CAP_PROP_FPS, config.fps);

        info!("Opened webcam {}", config.device_index);
        Ok(camera)
    }

    /// Best-effort property request; backends may ignore it
    fn request(&mut self, prop: i32, value: Option<u32>) {
        let Some(value) = value else { return };
        match self.capture.set(prop, f64::from(value)) {
            Ok(true) => debug!("Camera property {} set to {}", prop, value),
            Ok(false) => warn!("Camera ignored property {} = {}", prop, value),
            Err(e) => warn!("Failed to set camera property {}: {}", prop, e),
        }
    }
}

impl FrameSource for OpenCvCamera {
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        let mut mat = Mat::default();
        let grabbed = self
            .capture
            .read(&mut mat)
            .map_err(|e| CameraError::Read(e.to_string()))?;

        if !grabbed || mat.empty() {
            return Err(CameraError::Read("Failed to grab frame".into()));
        }

        let frame = mat_to_frame(
            &mat,
            self.started.elapsed().as_nanos() as u64,
            self.sequence,
        )?;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(Some(frame))
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release webcam {}: {}", self.device_index, e);
        } else {
            debug!("Released webcam {}", self.device_index);
        }
    }
}

/// Copy a BGR `Mat` into a [`VideoFrame`]
pub fn mat_to_frame(
    mat: &Mat,
    timestamp_ns: u64,
    sequence: u32,
) -> Result<VideoFrame, CameraError> {
    if mat.typ() != CV_8UC3 {
        return Err(CameraError::Format(format!(
            "expected 8-bit 3-channel frame, got type {}",
            mat.typ()
        )));
    }

    let data = if mat.is_continuous() {
        mat.data_bytes().map(<[u8]>::to_vec)
    } else {
        mat.try_clone().and_then(|m| m.data_bytes().map(<[u8]>::to_vec))
    }
    .map_err(|e| CameraError::Format(e.to_string()))?;

    Ok(VideoFrame::new(
        data,
        mat.cols() as u32,
        mat.rows() as u32,
        PixelFormat::Bgr24,
        timestamp_ns,
        sequence,
    ))
}

/// Build an owned BGR `Mat` from a frame (RGB frames are swapped first)
pub fn frame_to_mat(frame: &VideoFrame) -> opencv::Result<Mat> {
    let bgr = frame.to_bgr();
    packed_to_mat(&bgr.data, 3, bgr.height)
}

/// Build an owned single-channel `Mat` from a gray frame
pub fn gray_to_mat(frame: &GrayFrame) -> opencv::Result<Mat> {
    packed_to_mat(&frame.data, 1, frame.height)
}

fn packed_to_mat(data: &[u8], channels: i32, rows: u32) -> opencv::Result<Mat> {
    let flat = Mat::from_slice(data)?;
    let shaped = flat.reshape(channels, rows as i32)?;
    shaped.try_clone()
}
