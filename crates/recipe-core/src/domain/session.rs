//! Camera-session lifecycle types.
//!
//! # Session tokens (for beginners)
//!
//! Every time the scanner opens a capture stream it hands out a fresh
//! [`SessionToken`].  Each decoded barcode is tagged with the token of the
//! stream that saw it.  When the user switches cameras the old stream is shut
//! down, but a decode result may already be sitting in the channel; comparing
//! its token to the current one lets the consumer throw such stale results
//! away instead of acting on a frame from the wrong camera.

use serde::{Deserialize, Serialize};

/// Identifies one started capture stream.  Later streams get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub u64);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of the camera session.
///
/// ```text
/// Idle ──list──▶ Enumerating ──▶ Idle ──start──▶ Streaming ◀──switch──┐
///                                                   │  └──────────────┘
///                                                   └──stop──▶ Stopped
/// ```
///
/// Failures never produce a dedicated error state: the session simply ends
/// up without an active stream (`Idle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No stream is open.
    Idle,
    /// Device enumeration is in flight.
    Enumerating,
    /// A stream is open and its decode loop is running.
    Streaming,
    /// The session was disposed; no further streams will be opened.
    Stopped,
}

/// Text decoded from one barcode sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPayload {
    pub text: String,
}

impl DecodedPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A decoded payload tagged with the stream that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub token: SessionToken,
    pub payload: DecodedPayload,
}
