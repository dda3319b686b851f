//! Camera backends.
//!
//! The real backend is selected at compile time: on Linux with the `v4l2`
//! feature enabled, [`NativeMediaBackend`] is the V4L2 implementation.  On
//! every other build only the scripted [`mock::MockMediaBackend`] exists and
//! the binary runs in demo mode.

pub mod mock;

#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub mod linux;

#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub use linux::V4l2MediaBackend as NativeMediaBackend;
