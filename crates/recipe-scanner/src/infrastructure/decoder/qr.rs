//! QR decoding with the `rqrr` crate.
//!
//! Each frame is reduced to its greyscale plane, handed to rqrr's grid
//! detector, and the first grid that decodes cleanly wins.  Frames without a
//! code (by far the common case) yield `Ok(None)`.

use recipe_core::{DecodedPayload, Frame};
use tracing::debug;

use crate::application::camera_session::{BarcodeDecoder, DecodeError};

/// A stateless QR decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl BarcodeDecoder for QrDecoder {
    fn decode(&self, frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError> {
        let luma = frame.luma()?;
        let width = frame.width as usize;
        let height = frame.height as usize;

        let mut image =
            rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

        for grid in image.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) if !content.trim().is_empty() => {
                    return Ok(Some(DecodedPayload::new(content)));
                }
                Ok(_) => debug!("Frame {}: QR code with empty content", frame.sequence),
                Err(e) => debug!("Frame {}: grid found but not decodable: {e:?}", frame.sequence),
            }
        }
        Ok(None)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
