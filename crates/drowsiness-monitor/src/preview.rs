//! Debug preview of annotated frames

use camera_capture::VideoFrame;
use dms::Overlay;

use crate::{MonitorError, PreviewConfig};

/// What the frame loop should do after a frame was shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewControl {
    Continue,
    Quit,
}

/// Presentation surface for annotated frames
pub trait Preview {
    /// Draw `overlay` on `frame`, display it and poll for the quit key
    fn show(
        &mut self,
        frame: &VideoFrame,
        overlay: &Overlay,
    ) -> Result<PreviewControl, MonitorError>;
}

impl<P: Preview + ?Sized> Preview for Box<P> {
    fn show(
        &mut self,
        frame: &VideoFrame,
        overlay: &Overlay,
    ) -> Result<PreviewControl, MonitorError> {
        (**self).show(frame, overlay)
    }
}

/// Headless mode: nothing is shown and the loop never quits on its own
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPreview;

impl Preview for NullPreview {
    fn show(
        &mut self,
        _frame: &VideoFrame,
        _overlay: &Overlay,
    ) -> Result<PreviewControl, MonitorError> {
        Ok(PreviewControl::Continue)
    }
}

/// Open the preview described by `config`
pub fn open_preview(config: &PreviewConfig) -> Result<Box<dyn Preview>, MonitorError> {
    if !config.enabled {
        return Ok(Box::new(NullPreview));
    }

    #[cfg(feature = "vision")]
    {
        Ok(Box::new(highgui_window::HighGuiPreview::open(config)?))
    }

    #[cfg(not(feature = "vision"))]
    {
        Err(MonitorError::Preview(
            "preview window requires the `vision` feature (use --headless)".into(),
        ))
    }
}

/// `true` when a `wait_key` code matches the configured quit key
pub fn is_quit_key(code: i32, quit_key: char) -> bool {
    code >= 0 && quit_key.is_ascii() && (code & 0xFF) as u8 == quit_key as u8
}

#[cfg(feature = "vision")]
pub use highgui_window::HighGuiPreview;

#[cfg(feature = "vision")]
mod highgui_window {
    use camera_capture::capture::frame_to_mat;
    use camera_capture::VideoFrame;
    use dms::{Overlay, OverlayColor};
    use opencv::core::{Point, Rect, Scalar};
    use opencv::{highgui, imgproc};
    use tracing::{debug, info};

    use super::{is_quit_key, Preview, PreviewControl};
    use crate::{MonitorError, PreviewConfig};

    fn cv(e: opencv::Error) -> MonitorError {
        MonitorError::Preview(e.to_string())
    }

    fn scalar(color: OverlayColor) -> Scalar {
        let (b, g, r) = color.bgr();
        Scalar::new(f64::from(b), f64::from(g), f64::from(r), 0.0)
    }

    /// OpenCV HighGUI window
    pub struct HighGuiPreview {
        window: String,
        quit_key: char,
    }

    impl HighGuiPreview {
        pub fn open(config: &PreviewConfig) -> Result<Self, MonitorError> {
            highgui::named_window(&config.window_title, highgui::WINDOW_AUTOSIZE).map_err(cv)?;
            info!(
                "Preview window '{}' open, press '{}' to quit",
                config.window_title, config.quit_key
            );
            Ok(Self {
                window: config.window_title.clone(),
                quit_key: config.quit_key,
            })
        }
    }

    impl Preview for HighGuiPreview {
        fn show(
            &mut self,
            frame: &VideoFrame,
            overlay: &Overlay,
        ) -> Result<PreviewControl, MonitorError> {
            let mut mat = frame_to_mat(frame).map_err(cv)?;

            for b in &overlay.boxes {
                let r = b.region;
                imgproc::rectangle(
                    &mut mat,
                    Rect::new(r.x as i32, r.y as i32, r.width as i32, r.height as i32),
                    scalar(b.color),
                    2,
                    imgproc::LINE_8,
                    0,
                )
                .map_err(cv)?;
            }

            for t in &overlay.texts {
                imgproc::put_text(
                    &mut mat,
                    &t.text,
                    Point::new(t.origin.0, t.origin.1),
                    imgproc::FONT_HERSHEY_SIMPLEX,
                    t.scale,
                    scalar(t.color),
                    t.thickness,
                    imgproc::LINE_8,
                    false,
                )
                .map_err(cv)?;
            }

            highgui::imshow(&self.window, &mat).map_err(cv)?;
            let key = highgui::wait_key(1).map_err(cv)?;
            if is_quit_key(key, self.quit_key) {
                return Ok(PreviewControl::Quit);
            }
            Ok(PreviewControl::Continue)
        }
    }

    impl Drop for HighGuiPreview {
        fn drop(&mut self) {
            if highgui::destroy_window(&self.window).is_ok() {
                debug!("Closed preview window '{}'", self.window);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_key_matching() {
        assert!(is_quit_key(b'q' as i32, 'q'));
        // Some backends set modifier bits above the low byte
        assert!(is_quit_key(0x10_0000 | b'q' as i32, 'q'));
        assert!(!is_quit_key(b'Q' as i32, 'q'));
        assert!(!is_quit_key(-1, 'q'));
        assert!(!is_quit_key(b'q' as i32, 'é'));
    }

    #[test]
    fn test_disabled_preview_is_null() {
        let config = PreviewConfig {
            enabled: false,
            ..Default::default()
        };
        let mut preview = open_preview(&config).unwrap();
        let frame = VideoFrame::new(vec![0; 3], 1, 1, camera_capture::PixelFormat::Bgr24, 0, 0);
        assert_eq!(
            preview.show(&frame, &Overlay::default()).unwrap(),
            PreviewControl::Continue
        );
    }

    #[cfg(not(feature = "vision"))]
    #[test]
    fn test_window_needs_vision_feature() {
        assert!(matches!(
            open_preview(&PreviewConfig::default()),
            Err(MonitorError::Preview(_))
        ));
    }
}
