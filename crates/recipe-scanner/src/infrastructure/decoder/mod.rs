//! Barcode decoders.
//!
//! - [`qr::QrDecoder`] finds and decodes QR codes in real camera frames.
//! - [`mock::TextFrameDecoder`] reads the synthetic text frames produced for
//!   the mock camera backend.

pub mod mock;
pub mod qr;
