#![forbid(unsafe_code)]

//! Decoded frame buffers.
//!
//! A [`Frame`] is an 8-bit, row-major, channel-interleaved image. Frames are
//! immutable once built: readers hand them out and the verifier only ever
//! borrows their bytes.

use std::fmt;

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SequenceError};

/// Frame dimensions plus channel count (1 = grayscale, 3 = color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl Shape {
    #[must_use]
    pub const fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    #[must_use]
    pub const fn gray(width: u32, height: u32) -> Self {
        Self::new(width, height, 1)
    }

    #[must_use]
    pub const fn color(width: u32, height: u32) -> Self {
        Self::new(width, height, 3)
    }

    #[must_use]
    pub const fn is_color(&self) -> bool {
        self.channels >= 3
    }

    /// Number of samples in a frame of this shape.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    shape: Shape,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a raw sample buffer. The buffer length must match the shape.
    pub fn new(shape: Shape, data: Vec<u8>) -> Result<Self> {
        let expected = shape.byte_len();
        if data.len() != expected {
            return Err(SequenceError::BufferLength {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// A frame with every sample set to `value`.
    #[must_use]
    pub fn filled(shape: Shape, value: u8) -> Self {
        Self {
            shape,
            data: vec![value; shape.byte_len()],
        }
    }

    /// Convert a decoded image, forcing RGB8 or Luma8 per `is_color`.
    #[must_use]
    pub fn from_image(image: DynamicImage, is_color: bool) -> Self {
        if is_color {
            let rgb = image.into_rgb8();
            let shape = Shape::color(rgb.width(), rgb.height());
            Self {
                shape,
                data: rgb.into_raw(),
            }
        } else {
            let gray = image.into_luma8();
            let shape = Shape::gray(gray.width(), gray.height());
            Self {
                shape,
                data: gray.into_raw(),
            }
        }
    }

    /// Convert into an `image` buffer for encoding.
    pub fn to_image(&self) -> Result<DynamicImage> {
        let Shape {
            width,
            height,
            channels,
        } = self.shape;
        let image = match channels {
            1 => {
                GrayImage::from_raw(width, height, self.data.clone()).map(DynamicImage::ImageLuma8)
            }
            3 => RgbImage::from_raw(width, height, self.data.clone()).map(DynamicImage::ImageRgb8),
            _ => None,
        };
        image.ok_or(SequenceError::BufferLength {
            shape: self.shape,
            expected: self.shape.byte_len(),
            actual: self.data.len(),
        })
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Raw samples in row-major order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_buffer_length() {
        let err = Frame::new(Shape::color(2, 2), vec![0; 11]).expect_err("short buffer");
        assert!(matches!(
            err,
            SequenceError::BufferLength {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn image_round_trip_preserves_samples() {
        let data: Vec<u8> = (0..24).collect();
        let frame = Frame::new(Shape::color(4, 2), data.clone()).expect("frame");
        let back = Frame::from_image(frame.to_image().expect("image"), true);
        assert_eq!(back.shape(), Shape::color(4, 2));
        assert_eq!(back.as_bytes(), data.as_slice());
    }

    #[test]
    fn gray_conversion_drops_channels() {
        let frame = Frame::filled(Shape::color(3, 3), 200);
        let gray = Frame::from_image(frame.to_image().expect("image"), false);
        assert_eq!(gray.shape(), Shape::gray(3, 3));
        assert_eq!(gray.as_bytes().len(), 9);
    }

    #[test]
    fn shape_display_and_color_flag() {
        assert_eq!(Shape::color(640, 480).to_string(), "640x480x3");
        assert!(Shape::color(1, 1).is_color());
        assert!(!Shape::gray(1, 1).is_color());
    }
}
