//! Video frame types and processing

use image::RgbImage;

/// Pixel layout of a packed three-channel frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Blue-green-red byte order, as delivered by OpenCV capture
    Bgr24,
    /// Red-green-blue byte order, as decoded by the `image` crate
    Rgb24,
}

impl PixelFormat {
    /// Offsets of the (red, green, blue) bytes within one pixel
    fn rgb_offsets(self) -> (usize, usize, usize) {
        match self {
            PixelFormat::Bgr24 => (2, 1, 0),
            PixelFormat::Rgb24 => (0, 1, 2),
        }
    }
}

/// Decoded three-channel video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Packed pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Channel order of `data`
    pub format: PixelFormat,
    /// Capture timestamp (nanoseconds since the source was opened)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from packed pixel data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        timestamp_ns: u64,
        sequence: u32,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            timestamp_ns,
            sequence,
        }
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(img: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = img.dimensions();
        Self {
            data: img.into_raw(),
            width,
            height,
            format: PixelFormat::Rgb24,
            timestamp_ns,
            sequence,
        }
    }

    /// Get pixel at (x, y) as `[r, g, b]` regardless of storage order
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        let px = self.data.get(idx..idx + 3)?;
        let (r, g, b) = self.format.rgb_offsets();
        Some([px[r], px[g], px[b]])
    }

    /// Convert to a single-channel luminance frame
    pub fn to_grayscale(&self) -> GrayFrame {
        let (r, g, b) = self.format.rgb_offsets();
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[r] as f32 * 0.299
                   + pixel[g] as f32 * 0.587
                   + pixel[b] as f32 * 0.114) as u8;
            gray.push(y);
        }
        GrayFrame {
            data: gray,
            width: self.width,
            height: self.height,
        }
    }

    /// Convert to BGR byte order (no-op when already BGR)
    pub fn to_bgr(&self) -> VideoFrame {
        match self.format {
            PixelFormat::Bgr24 => self.clone(),
            PixelFormat::Rgb24 => {
                let mut data = self.data.clone();
                for pixel in data.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
                VideoFrame {
                    data,
                    format: PixelFormat::Bgr24,
                    ..*self
                }
            }
        }
    }
}

/// Single-channel 8-bit frame used as detector input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    /// Luminance values (width * height)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
}

impl GrayFrame {
    /// Crop a region of the frame, `None` if it does not fit
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Option<GrayFrame> {
        if x.checked_add(w)? > self.width || y.checked_add(h)? > self.height {
            return None;
        }

        let mut cropped = Vec::with_capacity((w * h) as usize);
        for row in y..(y + h) {
            let start = (row * self.width + x) as usize;
            let end = start + w as usize;
            cropped.extend_from_slice(&self.data[start..end]);
        }

        Some(GrayFrame {
            data: cropped,
            width: w,
            height: h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn solid(format: PixelFormat, px: [u8; 3], width: u32, height: u32) -> VideoFrame {
        let data = px.iter().copied().cycle().take((width * height * 3) as usize).collect();
        VideoFrame::new(data, width, height, format, 0, 0)
    }

    #[test]
    fn test_get_pixel_honours_channel_order() {
        let bgr = solid(PixelFormat::Bgr24, [10, 20, 30], 2, 2);
        assert_eq!(bgr.get_pixel(1, 1), Some([30, 20, 10]));

        let rgb = solid(PixelFormat::Rgb24, [10, 20, 30], 2, 2);
        assert_eq!(rgb.get_pixel(0, 0), Some([10, 20, 30]));
        assert_eq!(rgb.get_pixel(2, 0), None);
    }

    #[test]
    fn test_grayscale_weights_red_channel() {
        // Pure red in both layouts must give the same luminance
        let bgr = solid(PixelFormat::Bgr24, [0, 0, 255], 1, 1).to_grayscale();
        let rgb = solid(PixelFormat::Rgb24, [255, 0, 0], 1, 1).to_grayscale();
        assert_eq!(bgr.data, vec![76]);
        assert_eq!(bgr, rgb);
    }

    #[test]
    fn test_to_bgr_swaps_rgb() {
        let rgb = solid(PixelFormat::Rgb24, [1, 2, 3], 1, 1);
        let bgr = rgb.to_bgr();
        assert_eq!(bgr.format, PixelFormat::Bgr24);
        assert_eq!(bgr.data, vec![3, 2, 1]);
        assert_eq!(bgr.get_pixel(0, 0), rgb.get_pixel(0, 0));
    }

    #[test]
    fn test_crop_rows() {
        let gray = GrayFrame {
            data: (0..16).collect(),
            width: 4,
            height: 4,
        };
        let roi = gray.crop(1, 2, 2, 2).unwrap();
        assert_eq!(roi.data, vec![9, 10, 13, 14]);
        assert!(gray.crop(3, 0, 2, 1).is_none());
        assert!(gray.crop(u32::MAX, 0, 2, 1).is_none());
    }

    proptest! {
        #[test]
        fn prop_crop_inside_bounds_keeps_size(
            w in 1u32..32, h in 1u32..32, x in 0u32..32, y in 0u32..32,
        ) {
            let gray = GrayFrame { data: vec![7; 32 * 32], width: 32, height: 32 };
            match gray.crop(x, y, w, h) {
                Some(roi) => {
                    prop_assert!(x + w <= 32 && y + h <= 32);
                    prop_assert_eq!(roi.data.len(), (w * h) as usize);
                }
                None => prop_assert!(x + w > 32 || y + h > 32),
            }
        }
    }
}
