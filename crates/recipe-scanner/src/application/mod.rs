//! Application layer use cases for the scanner.
//!
//! # What use cases does the scanner have?
//!
//! - **`camera_session`** – Owns the one active capture stream: enumerates
//!   cameras, opens a stream, runs the continuous decode loop, and switches
//!   to the next camera on request.  The camera API and the QR decoder are
//!   injected as [`camera_session::MediaBackend`] and
//!   [`camera_session::BarcodeDecoder`] implementations.
//!
//! - **`render_recipe`** – Sends a decoded subject to the recipe endpoint,
//!   turns the reply into display sections, and writes them to a
//!   [`render_recipe::DisplaySurface`].  Replies that arrive after a newer
//!   request was issued are dropped.

pub mod camera_session;
pub mod render_recipe;
