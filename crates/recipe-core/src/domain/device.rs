//! Camera device entities and the round-robin device ring.
//!
//! # Why a ring? (for beginners)
//!
//! The scanner has exactly one device-selection policy: start on the first
//! enumerated camera and, every time the user asks to switch, move to the
//! next one, wrapping back to the first after the last.  Storing the device
//! list together with the current index in one type keeps that policy in a
//! single place and makes it trivially testable:
//!
//! ```text
//! devices:  [ front, back, usb ]
//! index:        0  →  1  →  2  →  0  → …
//! ```
//!
//! The list is a snapshot taken at enumeration time.  Cameras plugged in or
//! removed afterwards are only seen after the next enumeration.

use serde::{Deserialize, Serialize};

/// The kind of a media device reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaDeviceKind {
    /// A camera or other video source.
    VideoInput,
    /// A microphone.
    AudioInput,
    /// A speaker or headphone output.
    AudioOutput,
}

/// A raw enumeration record as returned by the platform media backend.
///
/// The backend may report every kind of media device; the session manager
/// only keeps the [`MediaDeviceKind::VideoInput`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDeviceInfo {
    /// Opaque platform identifier (e.g. `/dev/video0` on Linux).
    pub device_id: String,
    /// Human-readable name shown to the user.
    pub label: String,
    /// What kind of device this is.
    pub kind: MediaDeviceKind,
}

impl MediaDeviceInfo {
    /// Creates a video-input record.
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: MediaDeviceKind::VideoInput,
        }
    }

    /// Returns `true` if this device can be used as a camera.
    pub fn is_video_input(&self) -> bool {
        self.kind == MediaDeviceKind::VideoInput
    }
}

/// A camera that a capture stream can be opened on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoDevice {
    /// Opaque platform identifier.
    pub device_id: String,
    /// Human-readable name.
    pub label: String,
}

impl VideoDevice {
    pub fn new(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
        }
    }
}

impl From<MediaDeviceInfo> for VideoDevice {
    fn from(info: MediaDeviceInfo) -> Self {
        Self {
            device_id: info.device_id,
            label: info.label,
        }
    }
}

impl std::fmt::Display for VideoDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.device_id)
    }
}

/// Keeps only the video inputs of an enumeration result, preserving order.
pub fn filter_video_inputs(devices: Vec<MediaDeviceInfo>) -> Vec<VideoDevice> {
    devices
        .into_iter()
        .filter(MediaDeviceInfo::is_video_input)
        .map(VideoDevice::from)
        .collect()
}

/// Ordered device snapshot plus the index of the selected device.
///
/// Invariant: `current_index < devices.len()` whenever the ring is non-empty,
/// and `current_index == 0` when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRing {
    devices: Vec<VideoDevice>,
    current_index: usize,
}

impl DeviceRing {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ring positioned on the first device.
    pub fn from_devices(devices: Vec<VideoDevice>) -> Self {
        Self {
            devices,
            current_index: 0,
        }
    }

    /// Replaces the snapshot with a fresh enumeration result.
    ///
    /// The selection follows the selected device by id, so a device list
    /// that grows or reorders keeps pointing at the same camera.  If that
    /// device is gone, selection restarts at the first device.
    pub fn replace(&mut self, devices: Vec<VideoDevice>) {
        let selected = self.current().map(|d| d.device_id.clone());
        self.devices = devices;
        self.current_index = selected
            .and_then(|id| self.position(&id))
            .unwrap_or(0);
    }

    pub fn devices(&self) -> &[VideoDevice] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The selected device, or `None` if the ring is empty.
    pub fn current(&self) -> Option<&VideoDevice> {
        self.devices.get(self.current_index)
    }

    /// Advances to the next device, wrapping after the last one.
    ///
    /// Returns `None` and leaves the index untouched when fewer than two
    /// devices are known, since there is nothing to switch to.
    pub fn advance(&mut self) -> Option<&VideoDevice> {
        let count = self.devices.len();
        if count < 2 {
            return None;
        }
        self.current_index = (self.current_index + 1) % count;
        self.devices.get(self.current_index)
    }

    /// Moves the selection onto the device with `device_id`.
    ///
    /// Returns `false` (and changes nothing) if the device is not in the ring.
    pub fn select(&mut self, device_id: &str) -> bool {
        match self.position(device_id) {
            Some(idx) => {
                self.current_index = idx;
                true
            }
            None => false,
        }
    }

    /// Index of the device with `device_id`, if present.
    pub fn position(&self, device_id: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.device_id == device_id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
