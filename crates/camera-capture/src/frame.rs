//! Video frame types and conversions

use image::RgbImage;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds since stream start)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a black frame
    pub fn blank(width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        let len = width as usize * height as usize * 3;
        Self::new(vec![0; len], width, height, timestamp_ns, sequence)
    }

    /// Wrap a decoded image
    pub fn from_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Copy into an `image` buffer for drawing.
    ///
    /// Returns `None` when the pixel buffer does not match the frame size.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_size() {
        let frame = VideoFrame::blank(4, 3, 0, 0);
        assert_eq!(frame.data.len(), 36);
        assert_eq!(frame.get_pixel(3, 2), Some([0, 0, 0]));
        assert_eq!(frame.get_pixel(4, 0), None);
    }

    #[test]
    fn test_image_round_trip() {
        let mut image = RgbImage::new(2, 2);
        image.put_pixel(1, 0, image::Rgb([10, 20, 30]));

        let frame = VideoFrame::from_image(image, 5, 1);
        assert_eq!(frame.get_pixel(1, 0), Some([10, 20, 30]));

        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_truncated_buffer_is_not_an_image() {
        let frame = VideoFrame::new(vec![0; 5], 2, 2, 0, 0);
        assert!(frame.to_rgb_image().is_none());
        assert_eq!(frame.get_pixel(1, 1), None);
    }
}
