//! Captured video frames.
//!
//! QR decoders work on a single 8-bit brightness (luma) plane.  Cameras,
//! however, hand out frames in whatever pixel format they were configured
//! for; most USB webcams default to packed YUYV.  [`Frame::luma`] converts
//! any supported format into the greyscale plane the decoder expects.
//!
//! # YUYV layout (for beginners)
//!
//! YUYV packs two pixels into four bytes: `[Y0 U Y1 V]`.  The `Y` bytes are
//! the brightness of each pixel; `U` and `V` are colour information shared
//! by the pair.  Extracting luma is therefore just taking every other byte.

use thiserror::Error;

/// Pixel layout of [`Frame::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One byte per pixel, brightness only.
    Gray8,
    /// Packed 4:2:2 YUV, two bytes per pixel.
    Yuyv,
    /// Packed 8-bit RGB, three bytes per pixel.
    Rgb24,
}

impl PixelFormat {
    /// Bytes used per pixel in this layout.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Yuyv => 2,
            PixelFormat::Rgb24 => 3,
        }
    }
}

/// Errors raised when a frame buffer does not match its declared geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame buffer too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("frame has zero width or height")]
    Empty,
}

/// A single captured frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Raw pixel bytes, row-major, no padding between rows.
    pub data: Vec<u8>,
    /// Per-stream sequence number, starting at 0.
    pub sequence: u64,
}

impl Frame {
    /// Number of bytes a buffer of this geometry and format must contain.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Returns the greyscale plane of the frame, one byte per pixel.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Empty`] for a zero-sized frame and
    /// [`FrameError::TooShort`] when `data` holds fewer bytes than the
    /// declared geometry requires.
    pub fn luma(&self) -> Result<Vec<u8>, FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::Empty);
        }
        let expected = self.expected_len();
        if self.data.len() < expected {
            return Err(FrameError::TooShort {
                expected,
                actual: self.data.len(),
            });
        }
        let pixels = &self.data[..expected];

        let plane = match self.format {
            PixelFormat::Gray8 => pixels.to_vec(),
            // [Y0 U Y1 V] -> Y0, Y1
            PixelFormat::Yuyv => pixels.iter().step_by(2).copied().collect(),
            // ITU-R BT.601 weights in 8-bit fixed point.
            PixelFormat::Rgb24 => pixels
                .chunks_exact(3)
                .map(|px| {
                    let (r, g, b) = (u32::from(px[0]), u32::from(px[1]), u32::from(px[2]));
                    ((77 * r + 150 * g + 29 * b) >> 8) as u8
                })
                .collect(),
        };
        Ok(plane)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
