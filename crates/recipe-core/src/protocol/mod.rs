//! Wire contract with the recipe endpoint.
//!
//! - [`messages`] – JSON request and response bodies.
//! - [`sequence`] – thread-safe counter used to number requests.

pub mod messages;
pub mod sequence;

pub use sequence::SequenceCounter;
