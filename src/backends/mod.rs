// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for device enumeration and stream acquisition
//!
//! The flow layer never touches hardware directly; it talks to a
//! [`MediaDevices`] implementation and receives a [`CaptureStream`] back.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Flow Layer                  │
//! │   DeviceSelector · CapturePreview · Flow    │
//! └────────────────────┬────────────────────────┘
//!                      │ MediaDevices
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌─────────────┐    ┌──────────────────┐    │
//! │  │  GStreamer  │    │    Synthetic     │    │
//! │  │ (PipeWire,  │    │  (color bars,    │    │
//! │  │  V4L2, ...) │    │   fixed devices) │    │
//! │  └─────────────┘    └──────────────────┘    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`gst`]: GStreamer device monitor enumeration and capture pipelines
//! - [`synthetic`]: hardware-free devices for demos
//! - [`types`]: descriptors, constraints, frames and errors

pub mod gst;
pub mod synthetic;
pub mod types;

pub use types::*;

use std::future::Future;

/// Platform media device access
///
/// Both operations may suspend. Neither retries on failure.
pub trait MediaDevices {
    /// Live stream handle produced by [`MediaDevices::get_user_media`]
    type Stream: CaptureStream;

    /// List every media device the platform exposes, in platform order
    ///
    /// The result may be empty, and labels may be blank when the platform
    /// withholds them.
    fn enumerate_devices(&self) -> impl Future<Output = BackendResult<Vec<DeviceDescriptor>>>;

    /// Open a live stream matching the request
    ///
    /// # Errors
    /// * [`BackendError::PermissionDenied`] - access refused
    /// * [`BackendError::DeviceNotFound`] - requested device is gone
    /// * [`BackendError::ConstraintNotSatisfied`] - device cannot deliver the size
    fn get_user_media(
        &self,
        request: CaptureRequest,
    ) -> impl Future<Output = BackendResult<Self::Stream>>;

    /// Get the backend type identifier
    fn backend_kind(&self) -> BackendKind;
}

/// A live capture stream bound to the devices it was requested with
///
/// Dropping the stream releases the devices.
pub trait CaptureStream {
    /// The request this stream was opened with
    fn request(&self) -> &CaptureRequest;

    /// Start delivering frames
    fn play(&mut self) -> BackendResult<()>;

    fn is_playing(&self) -> bool;

    /// Latest frame, if one arrived since the last call
    ///
    /// Never blocks. Older queued frames are skipped.
    fn try_next_frame(&mut self) -> Option<VideoFrame>;
}
