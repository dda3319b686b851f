//! V4L2 camera backend.
//!
//! Devices are the `/dev/videoN` nodes reported by the kernel.  Nodes that
//! cannot capture video (metadata nodes that UVC drivers create next to each
//! camera) are skipped during enumeration.
//!
//! Streams request YUYV at the configured resolution; the driver may pick a
//! different size or fall back to GREY or RGB3, and the frames report
//! whatever was actually negotiated.  Buffers are memory-mapped and read
//! through `v4l::io::mmap::Stream`.

use std::io;

use async_trait::async_trait;
use recipe_core::{Frame, MediaDeviceInfo, PixelFormat, VideoDevice};
use tracing::{debug, info};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream as V4lCaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::application::camera_session::{CaptureStream, MediaBackend, MediaError};

const BUFFER_COUNT: u32 = 4;
const EBUSY: i32 = 16;

/// V4L2 implementation of [`MediaBackend`].
pub struct V4l2MediaBackend {
    width: u32,
    height: u32,
}

impl V4l2MediaBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
impl MediaBackend for V4l2MediaBackend {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, MediaError> {
        tokio::task::spawn_blocking(enumerate_blocking)
            .await
            .map_err(|e| MediaError::Stream(format!("enumeration task failed: {e}")))?
    }

    async fn open_stream(
        &self,
        device: &VideoDevice,
    ) -> Result<Box<dyn CaptureStream>, MediaError> {
        let device_id = device.device_id.clone();
        let (width, height) = (self.width, self.height);
        let stream = tokio::task::spawn_blocking(move || open_blocking(device_id, width, height))
            .await
            .map_err(|e| MediaError::Stream(format!("open task failed: {e}")))??;
        Ok(Box::new(stream))
    }
}

fn enumerate_blocking() -> Result<Vec<MediaDeviceInfo>, MediaError> {
    let mut found = Vec::new();
    for node in v4l::context::enum_devices() {
        let path = node.path().to_string_lossy().into_owned();
        let device = match Device::with_path(node.path()) {
            Ok(device) => device,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(MediaError::PermissionDenied(format!("{path}: {e}")));
            }
            Err(e) => {
                debug!("Skipping {path}: {e}");
                continue;
            }
        };
        let caps = match device.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!("Skipping {path}: query_caps failed: {e}");
                continue;
            }
        };
        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            debug!("Skipping {path}: not a capture node");
            continue;
        }
        let label = node.name().unwrap_or(caps.card);
        found.push(MediaDeviceInfo::video(path, label));
    }
    found.sort_by(|a, b| a.device_id.cmp(&b.device_id));
    Ok(found)
}

fn open_blocking(device_id: String, width: u32, height: u32) -> Result<V4l2Stream, MediaError> {
    let device = Device::with_path(&device_id).map_err(|e| classify(&device_id, e))?;

    let mut fmt = device.format().map_err(|e| classify(&device_id, e))?;
    fmt.width = width;
    fmt.height = height;
    fmt.fourcc = FourCC::new(b"YUYV");
    let fmt = device
        .set_format(&fmt)
        .map_err(|e| classify(&device_id, e))?;

    let format = pixel_format(fmt.fourcc).ok_or_else(|| {
        MediaError::Unsupported(format!(
            "{device_id} negotiated unsupported pixel format {:?}",
            fmt.fourcc
        ))
    })?;

    let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
        .map_err(|e| classify(&device_id, e))?;

    info!(
        "Opened {device_id} at {}x{} {:?}",
        fmt.width, fmt.height, fmt.fourcc
    );
    Ok(V4l2Stream {
        stream: Some(stream),
        device_id,
        width: fmt.width,
        height: fmt.height,
        stride: fmt.stride as usize,
        format,
    })
}

fn pixel_format(fourcc: FourCC) -> Option<PixelFormat> {
    match &fourcc.repr {
        b"YUYV" => Some(PixelFormat::Yuyv),
        b"GREY" => Some(PixelFormat::Gray8),
        b"RGB3" => Some(PixelFormat::Rgb24),
        _ => None,
    }
}

fn classify(device_id: &str, e: io::Error) -> MediaError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => MediaError::PermissionDenied(format!("{device_id}: {e}")),
        io::ErrorKind::NotFound => MediaError::DeviceNotFound(device_id.to_string()),
        _ if e.raw_os_error() == Some(EBUSY) => MediaError::DeviceBusy(device_id.to_string()),
        _ => MediaError::Io(e),
    }
}

/// An mmap capture stream on one V4L2 node.
pub struct V4l2Stream {
    // Dropping the stream issues STREAMOFF and unmaps the buffers.
    stream: Option<Stream<'static>>,
    device_id: String,
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl CaptureStream for V4l2Stream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn next_frame(&mut self) -> Result<Frame, MediaError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| MediaError::Stream("stream already stopped".to_string()))?;
        let (buf, meta) =
            V4lCaptureStream::next(stream).map_err(|e| MediaError::Stream(e.to_string()))?;

        let used = (meta.bytesused as usize).min(buf.len());
        let row = self.width as usize * self.format.bytes_per_pixel();
        let data = if self.stride <= row {
            buf[..used].to_vec()
        } else {
            // Drop the per-row padding so rows are tightly packed.
            buf[..used]
                .chunks(self.stride)
                .take(self.height as usize)
                .flat_map(|line| &line[..row.min(line.len())])
                .copied()
                .collect()
        };

        Ok(Frame {
            width: self.width,
            height: self.height,
            format: self.format,
            data,
            sequence: u64::from(meta.sequence),
        })
    }

    fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Released {}", self.device_id);
        }
    }
}
