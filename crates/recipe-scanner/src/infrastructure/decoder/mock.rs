//! Text-frame decoder used with the mock camera backend.
//!
//! The mock backend cannot produce a real QR image, so it emits greyscale
//! frames whose pixel bytes spell `QR:<payload>`.  [`TextFrameDecoder`]
//! recognises that prefix and returns the payload; any other frame decodes
//! to nothing, just like a camera frame without a code in view.

use recipe_core::{DecodedPayload, Frame, PixelFormat};

use crate::application::camera_session::{BarcodeDecoder, DecodeError};

const MARKER: &[u8] = b"QR:";

/// Builds a one-row greyscale frame carrying `payload`.
pub fn text_frame(payload: &str) -> Frame {
    let mut data = MARKER.to_vec();
    data.extend_from_slice(payload.as_bytes());
    Frame {
        width: data.len() as u32,
        height: 1,
        format: PixelFormat::Gray8,
        data,
        sequence: 0,
    }
}

/// Decodes frames built by [`text_frame`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFrameDecoder;

impl BarcodeDecoder for TextFrameDecoder {
    fn decode(&self, frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError> {
        if frame.format != PixelFormat::Gray8 {
            return Ok(None);
        }
        let Some(body) = frame.data.strip_prefix(MARKER) else {
            return Ok(None);
        };
        let text = std::str::from_utf8(body)
            .map_err(|e| DecodeError::Decoder(format!("payload is not UTF-8: {e}")))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(DecodedPayload::new(text)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
