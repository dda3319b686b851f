//! # recipe-core
//!
//! Shared library for the recipe scanner containing the domain entities, the
//! recipe text parser, and the JSON contract spoken with the recipe endpoint.
//!
//! It has zero dependencies on camera APIs, HTTP clients, or terminals.
//!
//! # Architecture overview (for beginners)
//!
//! The scanner points a camera at a QR code printed on a food item, decodes
//! the text in the code (e.g. `"Banana Bread"`), asks a remote service to
//! generate a recipe for it, and shows the recipe split into a title, an
//! ingredient list, and a numbered instruction list.
//!
//! This crate (`recipe-core`) is the pure foundation.  It defines:
//!
//! - **`domain`** – Camera devices and the round-robin device ring, session
//!   tokens and states, captured frames, decoded payloads, and the
//!   best-effort recipe text parser.
//!
//! - **`protocol`** – The request/response bodies of the recipe endpoint and
//!   the [`SequenceCounter`] that numbers outgoing requests so late replies
//!   can be recognised.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `recipe_core::ParsedRecipe` instead of `recipe_core::domain::recipe::ParsedRecipe`.
pub use domain::device::{DeviceRing, MediaDeviceInfo, MediaDeviceKind, VideoDevice};
pub use domain::frame::{Frame, FrameError, PixelFormat};
pub use domain::recipe::{parse, ParsedRecipe, FETCH_FAILED_TEXT, NOT_FOUND_TEXT};
pub use domain::session::{DecodedPayload, ScanEvent, SessionState, SessionToken};
pub use protocol::messages::{GenerateRecipeRequest, RecipeResponse};
pub use protocol::sequence::SequenceCounter;
