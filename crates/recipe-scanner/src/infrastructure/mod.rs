//! Infrastructure layer for the scanner.
//!
//! Contains OS- and network-facing adapters: camera capture, QR decoding,
//! the HTTP recipe client, the terminal display, the TOML config file, and
//! the stdin command reader.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `recipe_core`, but MUST NOT be imported by the `application` layer outside
//! of tests.
//!
//! # Sub-modules
//!
//! - **`media`** – `MediaBackend` implementations.  The V4L2 backend is
//!   compiled on Linux with the `v4l2` feature; a scripted
//!   `MockMediaBackend` is always available.
//!
//! - **`decoder`** – `BarcodeDecoder` implementations: `QrDecoder` (rqrr) for
//!   real frames and `TextFrameDecoder` for the mock backend's text frames.
//!
//! - **`recipe_api`** – `HttpRecipeClient`, a `RecipeSource` that POSTs the
//!   scanned subject to the recipe endpoint with reqwest.
//!
//! - **`display`** – `DisplaySurface` implementations: a terminal writer and
//!   an in-memory recorder for tests.
//!
//! - **`storage`** – Loading and saving `AppConfig` as TOML.
//!
//! - **`triggers`** – Turns stdin lines (`n`, `r`, `q`) into user triggers.

pub mod decoder;
pub mod display;
pub mod media;
pub mod recipe_api;
pub mod storage;
pub mod triggers;
