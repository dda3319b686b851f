//! CameraSessionManager: owns the single active capture stream.
//!
//! # Responsibilities
//!
//! - Enumerate the video inputs reported by a [`MediaBackend`] and keep them
//!   in a [`DeviceRing`] snapshot.
//! - Open a stream on one device and run a continuous decode loop over it,
//!   forwarding every recognised barcode as a [`ScanEvent`].
//! - Switch to the next device in round-robin order.
//!
//! # The one-stream rule (for beginners)
//!
//! A camera can usually only be opened by one reader at a time, so the
//! manager never lets two streams overlap.  Before a new stream is opened the
//! old decode loop is told to stop (an `AtomicBool` flag) and the manager
//! *waits* for the loop's task to finish.  The loop releases its stream on
//! the way out, so by the time the new device is opened the old one is
//! already closed.
//!
//! Every stream also gets a fresh [`SessionToken`].  A result decoded just
//! before the switch may still be queued in the channel; the consumer calls
//! [`CameraSessionManager::is_current`] to discard it.
//!
//! # Threading model
//!
//! Reading frames from a camera is a blocking operation, so the decode loop
//! runs on Tokio's blocking pool via `spawn_blocking`.  Decoded events are
//! pushed with `try_send`: if the consumer is momentarily behind, extra
//! sightings of the same code are dropped rather than stalling the capture
//! thread.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use recipe_core::{
    domain::device::filter_video_inputs, DecodedPayload, DeviceRing, Frame, FrameError,
    MediaDeviceInfo, ScanEvent, SessionState, SessionToken, VideoDevice,
};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Default capacity of the scan-event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 32;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Error type for camera access operations.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not supported: {0}")]
    Unsupported(String),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy: {0}")]
    DeviceBusy(String),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for a single decode attempt.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("decoder failure: {0}")]
    Decoder(String),
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("error accessing camera: could not enumerate devices: {0}")]
    DeviceEnumeration(#[source] MediaError),
    #[error("error accessing camera {device_id}: {source}")]
    CameraAccess {
        device_id: String,
        #[source]
        source: MediaError,
    },
    #[error("no video input devices found")]
    NoDevices,
    #[error("the camera session has been stopped")]
    Stopped,
}

// ── Seams ─────────────────────────────────────────────────────────────────────

/// Platform camera API.
///
/// Implementations live in `infrastructure::media`.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Lists every media device the platform reports, of any kind.
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError>;

    /// Opens a capture stream on `device`.
    async fn open_stream(&self, device: &VideoDevice)
        -> Result<Box<dyn CaptureStream>, MediaError>;
}

/// An open, exclusively owned capture stream.
///
/// All methods are called from the blocking decode-loop thread.
pub trait CaptureStream: Send {
    /// Identifier of the device the stream reads from.
    fn device_id(&self) -> &str;

    /// Blocks until the next frame is available.
    fn next_frame(&mut self) -> Result<Frame, MediaError>;

    /// Releases the device.  Calling it more than once has no further effect.
    fn stop(&mut self);
}

/// Recognises a barcode in a frame.
pub trait BarcodeDecoder: Send + Sync {
    /// Returns `Ok(None)` when the frame contains no readable code.
    fn decode(&self, frame: &Frame) -> Result<Option<DecodedPayload>, DecodeError>;
}

/// Result of [`CameraSessionManager::switch_to_next_device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The stream now reads from `device`.
    Switched {
        device: VideoDevice,
        token: SessionToken,
    },
    /// Fewer than two devices are known; the current stream was left alone.
    NotEnoughDevices { known: usize },
}

// ── Manager ───────────────────────────────────────────────────────────────────

struct ActiveCapture {
    token: SessionToken,
    device: VideoDevice,
    stop_flag: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Owns the device snapshot and at most one running decode loop.
pub struct CameraSessionManager {
    media: Arc<dyn MediaBackend>,
    decoder: Arc<dyn BarcodeDecoder>,
    events: mpsc::Sender<ScanEvent>,
    devices: DeviceRing,
    active: Option<ActiveCapture>,
    state: SessionState,
    last_token: u64,
}

impl CameraSessionManager {
    /// Creates a manager and the receiver on which decoded scans arrive.
    pub fn new(
        media: Arc<dyn MediaBackend>,
        decoder: Arc<dyn BarcodeDecoder>,
        event_buffer: usize,
    ) -> (Self, mpsc::Receiver<ScanEvent>) {
        let (events, rx) = mpsc::channel(event_buffer.max(1));
        let manager = Self {
            media,
            decoder,
            events,
            devices: DeviceRing::new(),
            active: None,
            state: SessionState::Idle,
            last_token: 0,
        };
        (manager, rx)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The most recent enumeration snapshot.
    pub fn devices(&self) -> &[VideoDevice] {
        self.devices.devices()
    }

    pub fn current_index(&self) -> usize {
        self.devices.current_index()
    }

    /// The device the running decode loop reads from, if any.
    pub fn active_device(&self) -> Option<&VideoDevice> {
        self.active.as_ref().map(|a| &a.device)
    }

    pub fn active_token(&self) -> Option<SessionToken> {
        self.active.as_ref().map(|a| a.token)
    }

    pub fn has_active_stream(&self) -> bool {
        self.active.is_some()
    }

    /// Returns `true` if `token` belongs to the stream that is running now.
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.active_token() == Some(token)
    }

    /// Enumerates devices and stores the video inputs as the new snapshot.
    ///
    /// An empty list is not an error; callers decide how to report it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::DeviceEnumeration`] if the platform refuses
    /// access.  The previous snapshot is kept in that case.
    pub async fn list_video_devices(&mut self) -> Result<Vec<VideoDevice>, SessionError> {
        if self.state == SessionState::Stopped {
            return Err(SessionError::Stopped);
        }
        let previous = self.state;
        self.state = SessionState::Enumerating;

        let result = self.media.enumerate_devices().await;
        self.state = previous;

        let all = result.map_err(|e| {
            warn!("Device enumeration failed: {e}");
            SessionError::DeviceEnumeration(e)
        })?;
        let total = all.len();
        let videos = filter_video_inputs(all);
        info!(
            "Found {} video input(s) among {} media device(s)",
            videos.len(),
            total
        );
        for (i, device) in videos.iter().enumerate() {
            debug!("  [{i}] {device}");
        }

        self.devices.replace(videos.clone());
        if let Some(active) = &self.active {
            if !self.devices.select(&active.device.device_id) {
                warn!("Active camera {} is no longer listed", active.device);
            }
        }
        Ok(videos)
    }

    /// Stops any running stream and starts one on `device`, or on the
    /// current ring entry when `device` is `None`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoDevices`] if no device was given and the snapshot
    ///   is empty.
    /// - [`SessionError::CameraAccess`] if the device cannot be opened.  The
    ///   session is left without a stream.
    /// - [`SessionError::Stopped`] after [`stop`](Self::stop).
    pub async fn start_session(
        &mut self,
        device: Option<VideoDevice>,
    ) -> Result<SessionToken, SessionError> {
        if self.state == SessionState::Stopped {
            return Err(SessionError::Stopped);
        }
        self.stop_active().await;

        let device = match device {
            Some(device) => {
                if !self.devices.select(&device.device_id) {
                    debug!("{device} is not in the current snapshot");
                }
                device
            }
            None => self
                .devices
                .current()
                .cloned()
                .ok_or(SessionError::NoDevices)?,
        };

        let stream = self.media.open_stream(&device).await.map_err(|source| {
            warn!("Error accessing camera {device}: {source}");
            SessionError::CameraAccess {
                device_id: device.device_id.clone(),
                source,
            }
        })?;

        self.last_token += 1;
        let token = SessionToken(self.last_token);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let task = {
            let decoder = Arc::clone(&self.decoder);
            let stop_flag = Arc::clone(&stop_flag);
            let events = self.events.clone();
            tokio::task::spawn_blocking(move || {
                run_decode_loop(stream, decoder, token, stop_flag, events)
            })
        };

        info!("Started stream {token} on {device}");
        self.active = Some(ActiveCapture {
            token,
            device,
            stop_flag,
            task,
        });
        self.state = SessionState::Streaming;
        Ok(token)
    }

    /// Advances the ring and restarts the stream on the next device.
    ///
    /// With fewer than two known devices nothing changes and
    /// [`SwitchOutcome::NotEnoughDevices`] is returned.
    ///
    /// # Errors
    ///
    /// Same as [`start_session`](Self::start_session).  On failure the ring
    /// stays on the new index, so a further switch moves past the bad device.
    pub async fn switch_to_next_device(&mut self) -> Result<SwitchOutcome, SessionError> {
        if self.state == SessionState::Stopped {
            return Err(SessionError::Stopped);
        }
        let known = self.devices.len();
        let Some(next) = self.devices.advance().cloned() else {
            warn!("Only {known} camera(s) available; not switching");
            return Ok(SwitchOutcome::NotEnoughDevices { known });
        };

        info!("Switching to camera {next}");
        let token = self.start_session(Some(next.clone())).await?;
        Ok(SwitchOutcome::Switched {
            device: next,
            token,
        })
    }

    /// Stops the running stream and disposes the session.
    ///
    /// Safe to call more than once.
    pub async fn stop(&mut self) {
        self.stop_active().await;
        if self.state != SessionState::Stopped {
            info!("Camera session stopped");
        }
        self.state = SessionState::Stopped;
    }

    async fn stop_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        active.stop_flag.store(true, Ordering::Release);
        if let Err(e) = active.task.await {
            warn!("Decode loop for {} ended abnormally: {e}", active.device);
        }
        debug!("Stream {} on {} released", active.token, active.device);
        if self.state == SessionState::Streaming {
            self.state = SessionState::Idle;
        }
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        // The loop releases its stream once it observes the flag.
        if let Some(active) = &self.active {
            active.stop_flag.store(true, Ordering::Release);
        }
    }
}

fn run_decode_loop(
    mut stream: Box<dyn CaptureStream>,
    decoder: Arc<dyn BarcodeDecoder>,
    token: SessionToken,
    stop_flag: Arc<AtomicBool>,
    events: mpsc::Sender<ScanEvent>,
) {
    debug!("Decode loop {token} running on {}", stream.device_id());
    while !stop_flag.load(Ordering::Acquire) {
        let frame = match stream.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Capture on {} failed: {e}", stream.device_id());
                break;
            }
        };

        // A frame may have been waiting while the stop flag was raised.
        if stop_flag.load(Ordering::Acquire) {
            break;
        }

        match decoder.decode(&frame) {
            Ok(Some(payload)) => {
                let event = ScanEvent { token, payload };
                match events.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => {
                        debug!("Scan channel full; dropping {:?}", event.payload.text);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!("Scan channel closed; ending decode loop {token}");
                        break;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => debug!("Frame {} not decodable: {e}", frame.sequence),
        }
    }
    stream.stop();
    debug!("Decode loop {token} finished");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{
        decoder::mock::{text_frame, TextFrameDecoder},
        media::mock::MockMediaBackend,
    };
    use recipe_core::MediaDeviceKind;
    use std::time::Duration;

    fn manager_with(
        backend: Arc<MockMediaBackend>,
    ) -> (CameraSessionManager, mpsc::Receiver<ScanEvent>) {
        CameraSessionManager::new(backend, Arc::new(TextFrameDecoder), DEFAULT_EVENT_BUFFER)
    }

    async fn next_event(rx: &mut mpsc::Receiver<ScanEvent>) -> ScanEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a scan event")
            .expect("scan channel closed")
    }

    // ── Enumeration ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_list_video_devices_keeps_only_video_inputs() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::new(vec![
            MediaDeviceInfo::video("cam-a", "Front"),
            MediaDeviceInfo {
                device_id: "mic".to_string(),
                label: "Microphone".to_string(),
                kind: MediaDeviceKind::AudioInput,
            },
            MediaDeviceInfo::video("cam-b", "Back"),
        ]));
        let (mut manager, _rx) = manager_with(backend);

        // Act
        let devices = manager.list_video_devices().await.expect("enumerate");

        // Assert
        let ids: Vec<_> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["cam-a", "cam-b"]);
        assert_eq!(manager.devices().len(), 2);
        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_list_video_devices_reports_denied_enumeration() {
        let backend = Arc::new(MockMediaBackend::with_cameras(2).deny_enumeration());
        let (mut manager, _rx) = manager_with(backend);

        let result = manager.list_video_devices().await;

        assert!(matches!(result, Err(SessionError::DeviceEnumeration(_))));
        assert!(manager.devices().is_empty());
        assert_eq!(manager.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_start_without_devices_returns_no_devices() {
        let backend = Arc::new(MockMediaBackend::with_cameras(0));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");

        let result = manager.start_session(None).await;

        assert!(matches!(result, Err(SessionError::NoDevices)));
        assert!(!manager.has_active_stream());
        assert_eq!(backend.open_calls(), 0);
    }

    // ── Streaming ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_start_session_opens_first_device() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::with_cameras(2));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");

        // Act
        let token = manager.start_session(None).await.expect("start");

        // Assert
        assert_eq!(manager.state(), SessionState::Streaming);
        assert!(manager.is_current(token));
        assert_eq!(manager.active_device(), manager.devices().first());
        assert_eq!(backend.live_streams(), 1);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_decoded_payload_is_tagged_with_current_token() {
        // Arrange
        let backend = Arc::new(
            MockMediaBackend::with_cameras(1).with_frames(vec![text_frame("Banana Bread")]),
        );
        let (mut manager, mut rx) = manager_with(backend);
        manager.list_video_devices().await.expect("enumerate");

        // Act
        let token = manager.start_session(None).await.expect("start");
        let event = next_event(&mut rx).await;

        // Assert
        assert_eq!(event.token, token);
        assert_eq!(event.payload.text, "Banana Bread");

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_denied_device_leaves_session_without_stream() {
        let backend = Arc::new(MockMediaBackend::with_cameras(1).deny_device("mock-video-0"));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");

        let result = manager.start_session(None).await;

        match result {
            Err(SessionError::CameraAccess { device_id, .. }) => {
                assert_eq!(device_id, "mock-video-0")
            }
            other => panic!("expected CameraAccess, got {other:?}"),
        }
        assert!(!manager.has_active_stream());
        assert_eq!(manager.state(), SessionState::Idle);
        assert_eq!(backend.live_streams(), 0);
    }

    // ── Switching ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_switch_with_single_device_is_a_noop() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::with_cameras(1));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");
        let token = manager.start_session(None).await.expect("start");

        // Act
        let outcome = manager.switch_to_next_device().await.expect("switch");

        // Assert
        assert_eq!(outcome, SwitchOutcome::NotEnoughDevices { known: 1 });
        assert!(manager.is_current(token));
        assert_eq!(backend.open_calls(), 1);
        assert_eq!(backend.live_streams(), 1);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_switch_cycles_round_robin_with_one_live_stream() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::with_cameras(3));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");
        manager.start_session(None).await.expect("start");

        // Act / Assert
        let mut visited = Vec::new();
        for _ in 0..3 {
            let outcome = manager.switch_to_next_device().await.expect("switch");
            let SwitchOutcome::Switched { device, token } = outcome else {
                panic!("expected a switch");
            };
            assert!(manager.is_current(token));
            assert_eq!(backend.live_streams(), 1, "streams must never overlap");
            visited.push(device.device_id);
        }

        assert_eq!(visited, vec!["mock-video-1", "mock-video-2", "mock-video-0"]);
        assert_eq!(manager.current_index(), 0);
        assert_eq!(
            backend.stopped_devices(),
            vec!["mock-video-0", "mock-video-1", "mock-video-2"]
        );

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_switch_invalidates_previous_token() {
        let backend = Arc::new(MockMediaBackend::with_cameras(2));
        let (mut manager, _rx) = manager_with(backend);
        manager.list_video_devices().await.expect("enumerate");
        let first = manager.start_session(None).await.expect("start");

        manager.switch_to_next_device().await.expect("switch");

        assert!(!manager.is_current(first));
        assert!(manager.active_token() > Some(first));

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_failed_switch_advances_index_past_bad_device() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::with_cameras(3).deny_device("mock-video-1"));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");
        manager.start_session(None).await.expect("start");

        // Act
        let failed = manager.switch_to_next_device().await;
        let recovered = manager.switch_to_next_device().await.expect("switch");

        // Assert
        assert!(matches!(failed, Err(SessionError::CameraAccess { .. })));
        assert!(matches!(
            recovered,
            SwitchOutcome::Switched { ref device, .. } if device.device_id == "mock-video-2"
        ));
        assert_eq!(backend.live_streams(), 1);

        manager.stop().await;
    }

    #[tokio::test]
    async fn test_relisting_while_streaming_keeps_round_robin_from_active_camera() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::with_cameras(3));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");
        manager.start_session(None).await.expect("start");
        manager.switch_to_next_device().await.expect("switch");
        manager.switch_to_next_device().await.expect("switch");
        backend.add_device(MediaDeviceInfo::video("mock-video-3", "Mock Camera 3"));

        // Act
        let listed = manager.list_video_devices().await.expect("relist");
        let outcome = manager.switch_to_next_device().await.expect("switch");

        // Assert
        assert_eq!(listed.len(), 4);
        assert!(matches!(
            outcome,
            SwitchOutcome::Switched { ref device, .. } if device.device_id == "mock-video-3"
        ));
        assert_eq!(manager.current_index(), 3);
        assert_eq!(backend.live_streams(), 1);

        manager.stop().await;
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_stop_releases_stream_and_blocks_restart() {
        // Arrange
        let backend = Arc::new(MockMediaBackend::with_cameras(2));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");
        manager.start_session(None).await.expect("start");

        // Act
        manager.stop().await;
        manager.stop().await;

        // Assert
        assert_eq!(manager.state(), SessionState::Stopped);
        assert_eq!(backend.live_streams(), 0);
        assert!(matches!(
            manager.start_session(None).await,
            Err(SessionError::Stopped)
        ));
        assert!(matches!(
            manager.switch_to_next_device().await,
            Err(SessionError::Stopped)
        ));
    }

    #[tokio::test]
    async fn test_decode_loop_ends_when_stream_fails() {
        let backend = Arc::new(MockMediaBackend::with_cameras(1).fail_after_frames(2));
        let (mut manager, _rx) = manager_with(Arc::clone(&backend));
        manager.list_video_devices().await.expect("enumerate");
        manager.start_session(None).await.expect("start");

        // The loop stops the stream itself once capture fails.
        tokio::time::timeout(Duration::from_secs(5), async {
            while backend.live_streams() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("stream was not released after a capture failure");

        manager.stop().await;
        assert_eq!(backend.stopped_devices(), vec!["mock-video-0"]);
    }
}
