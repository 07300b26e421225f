// SPDX-License-Identifier: GPL-3.0-only
// Shared types for capture backend abstraction

//! Shared types for capture backends

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Capture backend type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GStreamer device monitor and capture pipelines (PipeWire, V4L2, PulseAudio)
    #[default]
    #[value(name = "gstreamer")]
    GStreamer,
    /// Generated devices and color bars, no hardware required
    Synthetic,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::GStreamer => write!(f, "GStreamer"),
            BackendKind::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Kind of media device reported by enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    VideoInput,
    AudioOutput,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::AudioInput => write!(f, "audioinput"),
            DeviceKind::VideoInput => write!(f, "videoinput"),
            DeviceKind::AudioOutput => write!(f, "audiooutput"),
        }
    }
}

/// One media device as reported by the platform
///
/// The label may be empty when the platform withholds device names
/// (e.g. before capture permission was granted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
    /// Devices sharing a group id belong to the same physical unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            group_id: None,
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Label for display, falling back to the identifier for unlabeled devices
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Video constraints passed to stream acquisition
///
/// Built in two layers: the selected device's own fields first, then the
/// fixed capture resolution via [`VideoConstraints::force_resolution`], which
/// replaces any width or height already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl VideoConstraints {
    /// Constraints carrying the device's identifying fields, or nothing
    pub fn from_device(device: Option<&DeviceDescriptor>) -> Self {
        match device {
            Some(device) => Self {
                device_id: Some(device.id.clone()),
                group_id: device.group_id.clone(),
                width: None,
                height: None,
            },
            None => Self::default(),
        }
    }

    /// Override width and height, whatever the device fields said
    pub fn force_resolution(mut self, resolution: Resolution) -> Self {
        self.width = Some(resolution.width);
        self.height = Some(resolution.height);
        self
    }

    pub fn resolution(&self) -> Option<Resolution> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(Resolution::new(w, h)),
            _ => None,
        }
    }

    /// True when no device is targeted, only a size
    pub fn is_resolution_only(&self) -> bool {
        self.device_id.is_none() && self.group_id.is_none()
    }
}

/// Everything a backend needs to open a capture stream
///
/// `audio: None` asks for the platform's default audio source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub audio: Option<DeviceDescriptor>,
    pub video: VideoConstraints,
}

/// Decoded RGB24 video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub stride: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl VideoFrame {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// RGB at (x, y), clamped to the frame; black if the buffer is short
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 3) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }
}

/// Frame sender type (used by streaming threads)
pub type FrameSender = futures::channel::mpsc::Sender<VideoFrame>;

/// Frame receiver type (owned by the stream handed to the UI)
pub type FrameReceiver = futures::channel::mpsc::Receiver<VideoFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Device enumeration failed
    EnumerationFailed(String),
    /// Requested device not found
    DeviceNotFound(String),
    /// Access to the device was refused
    PermissionDenied(String),
    /// Device cannot satisfy the requested constraints
    ConstraintNotSatisfied(String),
    /// Stream acquired but playback could not start
    PlaybackFailed(String),
    /// Operation aborted by an outer cancellation scope
    Cancelled,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::EnumerationFailed(msg) => {
                write!(f, "Device enumeration failed: {}", msg)
            }
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            BackendError::ConstraintNotSatisfied(msg) => {
                write!(f, "Constraints not satisfiable: {}", msg)
            }
            BackendError::PlaybackFailed(msg) => write!(f, "Playback failed: {}", msg),
            BackendError::Cancelled => write!(f, "Operation cancelled"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<gstreamer::glib::Error> for BackendError {
    fn from(err: gstreamer::glib::Error) -> Self {
        BackendError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::glib::BoolError> for BackendError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        BackendError::Other(err.to_string())
    }
}

impl From<gstreamer::StateChangeError> for BackendError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        BackendError::PlaybackFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_resolution_wins_over_device_fields() {
        let device = DeviceDescriptor::new("v1", "Webcam", DeviceKind::VideoInput).with_group("g1");
        let mut constraints = VideoConstraints::from_device(Some(&device));
        constraints.width = Some(640);
        constraints.height = Some(480);

        let constraints = constraints.force_resolution(Resolution::new(1920, 1080));

        assert_eq!(constraints.device_id.as_deref(), Some("v1"));
        assert_eq!(constraints.group_id.as_deref(), Some("g1"));
        assert_eq!(constraints.resolution(), Some(Resolution::new(1920, 1080)));
    }

    #[test]
    fn test_constraints_without_device_are_resolution_only() {
        let constraints =
            VideoConstraints::from_device(None).force_resolution(Resolution::new(1920, 1080));
        assert!(constraints.is_resolution_only());
        assert_eq!(
            serde_json::to_value(&constraints).unwrap(),
            serde_json::json!({ "width": 1920, "height": 1080 })
        );
    }

    #[test]
    fn test_device_kind_serializes_like_the_platform() {
        let device = DeviceDescriptor::new("a1", "Mic", DeviceKind::AudioInput);
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["kind"], "audioinput");
        assert!(value.get("group_id").is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let device = DeviceDescriptor::new("cam-0", "", DeviceKind::VideoInput);
        assert_eq!(device.display_name(), "cam-0");
    }

    #[test]
    fn test_pixel_is_clamped() {
        let frame = VideoFrame {
            width: 2,
            height: 1,
            stride: 6,
            data: Arc::from(vec![1u8, 2, 3, 4, 5, 6]),
            captured_at: Instant::now(),
        };
        assert_eq!(frame.pixel(0, 0), (1, 2, 3));
        assert_eq!(frame.pixel(10, 10), (4, 5, 6));
    }
}
