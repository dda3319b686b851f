//! recipe-scanner library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does recipe-scanner do? (for beginners)
//!
//! 1. Enumerates the cameras attached to the machine and opens the first one.
//! 2. Runs a decode loop on the live feed; every frame is handed to a QR
//!    decoder.
//! 3. When a code is recognised, its text (e.g. `"Banana Bread"`) is sent to
//!    the recipe endpoint.
//! 4. The reply is split into a title, an ingredient list, and a numbered
//!    instruction list, and written to the display.
//! 5. The user can switch to the next camera (round-robin) or ask for a fresh
//!    recipe for the same item at any time.
//!
//! # Layers
//!
//! ```text
//! application/     CameraSessionManager, RecipeRenderer (traits at the seams)
//! infrastructure/  camera backends, QR decoder, HTTP client, display,
//!                  config file, stdin triggers
//! ```
//!
//! The application layer never names a concrete camera API, HTTP library, or
//! terminal; those are injected from `main.rs`.

/// Application layer: use cases for the scanner.
pub mod application;

/// Infrastructure layer: camera, decoder, network, display, and storage adapters.
pub mod infrastructure;
