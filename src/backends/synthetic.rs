// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic capture backend
//!
//! Reports a fixed device list and serves SMPTE-style color bars at the
//! requested size. Useful for trying the flow on machines without cameras.

use super::types::*;
use super::{CaptureStream, MediaDevices};
use crate::constants::{TARGET_RESOLUTION, timing};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Bar colors, left to right
const BARS: [(u8, u8, u8); 7] = [
    (192, 192, 192),
    (192, 192, 0),
    (0, 192, 192),
    (0, 192, 0),
    (192, 0, 192),
    (192, 0, 0),
    (0, 0, 192),
];

/// Backend with generated devices and frames
#[derive(Debug, Clone)]
pub struct SyntheticMediaDevices {
    devices: Vec<DeviceDescriptor>,
}

impl SyntheticMediaDevices {
    /// `count` microphones and `count` cameras plus one speaker
    pub fn new(count: usize) -> Self {
        let mut devices = Vec::with_capacity(count * 2 + 1);
        for i in 0..count {
            devices.push(
                DeviceDescriptor::new(
                    format!("synthetic-mic-{}", i),
                    format!("Synthetic Microphone {}", i + 1),
                    DeviceKind::AudioInput,
                )
                .with_group(format!("synthetic-unit-{}", i)),
            );
            devices.push(
                DeviceDescriptor::new(
                    format!("synthetic-cam-{}", i),
                    format!("Synthetic Camera {}", i + 1),
                    DeviceKind::VideoInput,
                )
                .with_group(format!("synthetic-unit-{}", i)),
            );
        }
        devices.push(DeviceDescriptor::new(
            "synthetic-speaker",
            "Synthetic Speaker",
            DeviceKind::AudioOutput,
        ));
        Self { devices }
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    fn knows(&self, id: &str) -> bool {
        self.devices.iter().any(|d| d.id == id)
    }
}

impl Default for SyntheticMediaDevices {
    fn default() -> Self {
        Self::new(2)
    }
}

impl MediaDevices for SyntheticMediaDevices {
    type Stream = SyntheticStream;

    async fn enumerate_devices(&self) -> BackendResult<Vec<DeviceDescriptor>> {
        info!(count = self.devices.len(), "Synthetic devices enumerated");
        Ok(self.devices.clone())
    }

    async fn get_user_media(&self, request: CaptureRequest) -> BackendResult<SyntheticStream> {
        if let Some(id) = request.video.device_id.as_deref()
            && !self.knows(id)
        {
            return Err(BackendError::DeviceNotFound(id.to_string()));
        }
        if let Some(audio) = request.audio.as_ref()
            && !self.knows(&audio.id)
        {
            return Err(BackendError::DeviceNotFound(audio.id.clone()));
        }

        debug!(request = ?request, "Synthetic stream acquired");
        Ok(SyntheticStream {
            request,
            bars: None,
            last_frame: None,
        })
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Synthetic
    }
}

/// Color bar stream
pub struct SyntheticStream {
    request: CaptureRequest,
    bars: Option<Arc<[u8]>>,
    last_frame: Option<Instant>,
}

impl SyntheticStream {
    fn resolution(&self) -> Resolution {
        self.request.video.resolution().unwrap_or(TARGET_RESOLUTION)
    }
}

impl CaptureStream for SyntheticStream {
    fn request(&self) -> &CaptureRequest {
        &self.request
    }

    fn play(&mut self) -> BackendResult<()> {
        let resolution = self.resolution();
        if resolution.width == 0 || resolution.height == 0 {
            return Err(BackendError::PlaybackFailed(format!(
                "Cannot render {} frames",
                resolution
            )));
        }
        self.bars = Some(color_bars(resolution));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.bars.is_some()
    }

    fn try_next_frame(&mut self) -> Option<VideoFrame> {
        let bars = self.bars.clone()?;
        let now = Instant::now();
        if let Some(last) = self.last_frame
            && now.duration_since(last) < timing::SYNTHETIC_FRAME_INTERVAL
        {
            return None;
        }
        self.last_frame = Some(now);

        let resolution = self.resolution();
        Some(VideoFrame {
            width: resolution.width,
            height: resolution.height,
            stride: resolution.width * 3,
            data: bars,
            captured_at: now,
        })
    }
}

fn color_bars(resolution: Resolution) -> Arc<[u8]> {
    let width = resolution.width as usize;
    let row: Vec<u8> = (0..width)
        .flat_map(|x| {
            let (r, g, b) = BARS[x * BARS.len() / width];
            [r, g, b]
        })
        .collect();
    row.repeat(resolution.height as usize).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device_list() {
        let backend = SyntheticMediaDevices::default();
        let devices = pollster::block_on(backend.enumerate_devices()).unwrap();
        let cameras = devices
            .iter()
            .filter(|d| d.kind == DeviceKind::VideoInput)
            .count();
        assert_eq!(cameras, 2);
        assert_eq!(devices.last().unwrap().kind, DeviceKind::AudioOutput);
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        let backend = SyntheticMediaDevices::default();
        let request = CaptureRequest {
            audio: None,
            video: VideoConstraints {
                device_id: Some("missing".to_string()),
                ..Default::default()
            },
        };
        let result = pollster::block_on(backend.get_user_media(request));
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[test]
    fn test_frames_have_requested_size() {
        let backend = SyntheticMediaDevices::new(1);
        let request = CaptureRequest {
            audio: None,
            video: VideoConstraints::default().force_resolution(Resolution::new(64, 36)),
        };
        let mut stream = pollster::block_on(backend.get_user_media(request)).unwrap();
        assert!(stream.try_next_frame().is_none());

        stream.play().unwrap();
        let frame = stream.try_next_frame().unwrap();
        assert_eq!(frame.resolution(), Resolution::new(64, 36));
        assert_eq!(frame.data.len(), 64 * 36 * 3);
        assert_eq!(frame.pixel(0, 0), BARS[0]);
        assert_eq!(frame.pixel(63, 35), BARS[6]);
    }
}
