//! Domain entities with no I/O.
//!
//! - [`device`] – video devices and the round-robin [`device::DeviceRing`].
//! - [`frame`] – raw captured frames and luma extraction for the decoder.
//! - [`recipe`] – the recipe text parser and [`recipe::ParsedRecipe`].
//! - [`session`] – session tokens, states, and decoded scan events.

pub mod device;
pub mod frame;
pub mod recipe;
pub mod session;
