//! Scripted camera backend for tests and demo mode.
//!
//! # Why a mock backend?
//!
//! Real cameras need hardware, permissions, and a person holding a QR code
//! in front of the lens.  `MockMediaBackend` instead serves a fixed device
//! list and plays back a fixed list of frames in a loop, so the whole
//! pipeline (session manager, decoder, renderer) can run anywhere.
//!
//! # What it records
//!
//! - `open_calls()` – how many streams were opened.
//! - `live_streams()` – how many opened streams have not been stopped yet.
//!   The session manager must never let this exceed 1.
//! - `stopped_devices()` – device ids in the order their streams stopped.
//!
//! # Failure injection
//!
//! - `deny_enumeration()` makes `enumerate_devices` fail with
//!   `PermissionDenied`.
//! - `deny_device(id)` makes `open_stream` fail for that device.
//! - `fail_after_frames(n)` makes each stream error after `n` frames.
//!
//! `add_device(info)` plugs in a camera after construction, for tests of
//! re-enumeration.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use recipe_core::{Frame, MediaDeviceInfo, PixelFormat, VideoDevice};

use crate::application::camera_session::{CaptureStream, MediaBackend, MediaError};

/// Default pause between mock frames.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(5);

/// A mock backend that serves scripted devices and frames.
pub struct MockMediaBackend {
    devices: Mutex<Vec<MediaDeviceInfo>>,
    frames: Vec<Frame>,
    frame_interval: Duration,
    enumeration_denied: bool,
    denied_devices: HashSet<String>,
    fail_after: Option<u64>,
    open_calls: AtomicUsize,
    live_streams: Arc<AtomicUsize>,
    stopped: Arc<Mutex<Vec<String>>>,
}

impl MockMediaBackend {
    /// Creates a backend reporting exactly `devices`.
    pub fn new(devices: Vec<MediaDeviceInfo>) -> Self {
        Self {
            devices: Mutex::new(devices),
            frames: Vec::new(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
            enumeration_denied: false,
            denied_devices: HashSet::new(),
            fail_after: None,
            open_calls: AtomicUsize::new(0),
            live_streams: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates `count` video inputs named `mock-video-0`, `mock-video-1`, ...
    pub fn with_cameras(count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| MediaDeviceInfo::video(format!("mock-video-{i}"), format!("Mock Camera {i}")))
                .collect(),
        )
    }

    /// Frames every stream plays back in a loop.  With no frames, streams
    /// produce blank greyscale frames.
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn deny_enumeration(mut self) -> Self {
        self.enumeration_denied = true;
        self
    }

    pub fn deny_device(mut self, device_id: impl Into<String>) -> Self {
        self.denied_devices.insert(device_id.into());
        self
    }

    pub fn fail_after_frames(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Plugs in another device; the next enumeration reports it last.
    pub fn add_device(&self, device: MediaDeviceInfo) {
        self.devices.lock().unwrap().push(device);
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    pub fn stopped_devices(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaBackend for MockMediaBackend {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError> {
        if self.enumeration_denied {
            return Err(MediaError::PermissionDenied(
                "camera access denied by mock".to_string(),
            ));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn open_stream(
        &self,
        device: &VideoDevice,
    ) -> Result<Box<dyn CaptureStream>, MediaError> {
        if self.denied_devices.contains(&device.device_id) {
            return Err(MediaError::PermissionDenied(format!(
                "{} denied by mock",
                device.device_id
            )));
        }
        let known = self
            .devices
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.device_id == device.device_id);
        if !known {
            return Err(MediaError::DeviceNotFound(device.device_id.clone()));
        }

        self.open_calls.fetch_add(1, Ordering::SeqCst);
        self.live_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCaptureStream {
            device_id: device.device_id.clone(),
            frames: self.frames.clone(),
            frame_interval: self.frame_interval,
            fail_after: self.fail_after,
            produced: 0,
            stopped: false,
            live_streams: Arc::clone(&self.live_streams),
            stop_log: Arc::clone(&self.stopped),
        }))
    }
}

/// A stream that replays the backend's frames.
pub struct MockCaptureStream {
    device_id: String,
    frames: Vec<Frame>,
    frame_interval: Duration,
    fail_after: Option<u64>,
    produced: u64,
    stopped: bool,
    live_streams: Arc<AtomicUsize>,
    stop_log: Arc<Mutex<Vec<String>>>,
}

impl CaptureStream for MockCaptureStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn next_frame(&mut self) -> Result<Frame, MediaError> {
        if self.stopped {
            return Err(MediaError::Stream("stream already stopped".to_string()));
        }
        if self.fail_after.is_some_and(|limit| self.produced >= limit) {
            return Err(MediaError::Stream("mock capture failure".to_string()));
        }
        std::thread::sleep(self.frame_interval);

        let mut frame = if self.frames.is_empty() {
            blank_frame()
        } else {
            self.frames[(self.produced as usize) % self.frames.len()].clone()
        };
        frame.sequence = self.produced;
        self.produced += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.live_streams.fetch_sub(1, Ordering::SeqCst);
        if let Ok(mut log) = self.stop_log.lock() {
            log.push(self.device_id.clone());
        }
    }
}

impl Drop for MockCaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn blank_frame() -> Frame {
    Frame {
        width: 8,
        height: 8,
        format: PixelFormat::Gray8,
        data: vec![0xFF; 64],
        sequence: 0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
