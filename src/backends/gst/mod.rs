// SPDX-License-Identifier: MPL-2.0

//! GStreamer capture backend
//!
//! Devices come from the GStreamer device monitor, so whatever providers are
//! installed (PipeWire, V4L2, PulseAudio) show up. Streams are GStreamer
//! pipelines built around each device's own source element.

mod enumeration;
mod pipeline;

pub use enumeration::{EnumeratedDevice, enumerate_gst_devices, is_gstreamer_available};
pub use pipeline::{CapturePipeline, classify_error};

use super::types::*;
use super::{CaptureStream, MediaDevices};
use crate::constants;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{debug, info};

/// GStreamer backend implementation
///
/// Remembers the monitor handles from the last enumeration so a confirmed
/// identifier can be turned back into a source element.
pub struct GstMediaDevices {
    known: RefCell<HashMap<String, gstreamer::Device>>,
    frame_capacity: usize,
}

impl GstMediaDevices {
    pub fn new(frame_capacity: usize) -> BackendResult<Self> {
        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;
        Ok(Self {
            known: RefCell::new(HashMap::new()),
            frame_capacity: frame_capacity.max(1),
        })
    }

    fn resolve(&self, id: &str) -> BackendResult<gstreamer::Device> {
        self.known
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound(id.to_string()))
    }
}

impl MediaDevices for GstMediaDevices {
    type Stream = GstCaptureStream;

    async fn enumerate_devices(&self) -> BackendResult<Vec<DeviceDescriptor>> {
        info!("Using GStreamer backend for device enumeration");

        let enumerated = enumerate_gst_devices()?;
        let mut known = self.known.borrow_mut();
        known.clear();

        let mut descriptors = Vec::with_capacity(enumerated.len());
        for EnumeratedDevice { descriptor, device } in enumerated {
            known.insert(descriptor.id.clone(), device);
            descriptors.push(descriptor);
        }
        Ok(descriptors)
    }

    async fn get_user_media(&self, request: CaptureRequest) -> BackendResult<GstCaptureStream> {
        info!(
            audio = ?request.audio.as_ref().map(|d| &d.id),
            video = ?request.video.device_id,
            resolution = ?request.video.resolution(),
            "Acquiring capture stream"
        );

        let video_device = request
            .video
            .device_id
            .as_deref()
            .map(|id| self.resolve(id))
            .transpose()?;
        let audio_device = request
            .audio
            .as_ref()
            .map(|d| self.resolve(&d.id))
            .transpose()?;

        let (sender, receiver) = futures::channel::mpsc::channel(self.frame_capacity);
        let pipeline = CapturePipeline::new(
            video_device.as_ref(),
            audio_device.as_ref(),
            &request.video,
            sender,
        )?;

        Ok(GstCaptureStream {
            pipeline,
            receiver,
            request,
            playing: false,
        })
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::GStreamer
    }
}

/// Live stream backed by a [`CapturePipeline`]
pub struct GstCaptureStream {
    pipeline: CapturePipeline,
    receiver: FrameReceiver,
    request: CaptureRequest,
    playing: bool,
}

impl CaptureStream for GstCaptureStream {
    fn request(&self) -> &CaptureRequest {
        &self.request
    }

    fn play(&mut self) -> BackendResult<()> {
        self.pipeline.play()?;
        self.playing = true;
        debug!(
            target_resolution = %constants::TARGET_RESOLUTION,
            "Capture stream playing"
        );
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn try_next_frame(&mut self) -> Option<VideoFrame> {
        let mut latest = None;
        while let Ok(frame) = self.receiver.try_recv() {
            latest = Some(frame);
        }
        latest
    }
}
