//! Request numbering for out-of-order reply detection.
//!
//! # Why number requests? (for beginners)
//!
//! The scanner may fire several recipe requests in quick succession (the
//! same code stays in front of the camera, or the user scans two items).
//! The replies can arrive in any order.  Without care, a slow reply for the
//! *first* scan could overwrite the display after the reply for the *second*
//! scan already rendered.
//!
//! Each request takes a number from [`SequenceCounter::issue`].  When a reply
//! arrives, [`SequenceCounter::is_latest`] tells whether a newer request has
//! been issued since; if so, the reply is dropped.
//!
//! ```text
//! issue() -> 1 ──────────────────────────────▶ reply 1 (is_latest(1) = false, dropped)
//! issue() -> 2 ──────────▶ reply 2 (is_latest(2) = true, rendered)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// A lock-free, monotonically increasing request counter.
///
/// Numbers start at 1; 0 means "nothing issued yet".
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last_issued: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next sequence number.
    ///
    /// `AcqRel` makes the increment visible to every later `is_latest` call
    /// on any thread.
    pub fn issue(&self) -> u64 {
        self.last_issued.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// The most recently issued number, or 0 if none was issued.
    pub fn latest(&self) -> u64 {
        self.last_issued.load(Ordering::Acquire)
    }

    /// Returns `true` if no request was issued after `seq`.
    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest() == seq
    }
}
