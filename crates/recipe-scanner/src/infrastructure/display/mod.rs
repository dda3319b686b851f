//! `DisplaySurface` implementations.
//!
//! - [`terminal::TerminalDisplay`] prints each region to a writer (stdout in
//!   the binary).
//! - [`recording::RecordingDisplay`] keeps every update in memory so tests
//!   can assert on exactly what was shown and in which order.

pub mod recording;
pub mod terminal;
