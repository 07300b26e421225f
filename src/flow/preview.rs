// SPDX-License-Identifier: GPL-3.0-only

//! Live capture preview for a confirmed device pair

use super::scope::CancelScope;
use crate::backends::{
    BackendError, BackendResult, CaptureRequest, CaptureStream, DeviceDescriptor, MediaDevices,
    VideoConstraints, VideoFrame,
};
use crate::constants::{TARGET_RESOLUTION, preview};
use tracing::{error, info};

/// How the preview occupies the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    /// Stretch across the full viewport width
    pub full_width: bool,
    /// Width to height ratio of the preview box
    pub aspect_ratio: (u32, u32),
    /// Fill around the picture
    pub background: (u8, u8, u8),
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            full_width: true,
            aspect_ratio: preview::ASPECT_RATIO,
            background: (0, 0, 0),
        }
    }
}

/// Rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Presentation {
    /// Preview box inside an available area
    ///
    /// Takes the full width and derives the height from the aspect ratio.
    /// When that height does not fit, the box shrinks keeping its ratio.
    pub fn preview_box(&self, available_width: u32, available_height: u32) -> Viewport {
        let (rw, rh) = self.aspect_ratio;
        if rw == 0 || rh == 0 || available_width == 0 || available_height == 0 {
            return Viewport {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            };
        }

        let width = if self.full_width {
            available_width
        } else {
            available_width.min(available_height * rw / rh)
        };
        let height = width * rh / rw;
        if height <= available_height {
            return Viewport {
                x: 0,
                y: 0,
                width,
                height,
            };
        }

        let width = available_height * rw / rh;
        Viewport {
            x: (available_width - width) / 2,
            y: 0,
            width,
            height: available_height,
        }
    }

    /// Picture area inside the box for a frame of the given size
    ///
    /// The frame keeps its intrinsic ratio; the rest of the box is background.
    pub fn letterbox(&self, container: Viewport, frame_width: u32, frame_height: u32) -> Viewport {
        if frame_width == 0 || frame_height == 0 || container.width == 0 || container.height == 0
        {
            return Viewport {
                width: 0,
                height: 0,
                ..container
            };
        }

        let scaled_height =
            (container.width as u64 * frame_height as u64 / frame_width as u64) as u32;
        if scaled_height <= container.height {
            Viewport {
                x: container.x,
                y: container.y + (container.height - scaled_height) / 2,
                width: container.width,
                height: scaled_height,
            }
        } else {
            let scaled_width =
                (container.height as u64 * frame_width as u64 / frame_height as u64) as u32;
            Viewport {
                x: container.x + (container.width - scaled_width) / 2,
                y: container.y,
                width: scaled_width,
                height: container.height,
            }
        }
    }
}

/// Build the capture request for a device pair
///
/// The audio device is passed as-is. Video constraints start from the video
/// device's fields and then take the fixed target resolution, which wins over
/// anything the device supplied.
pub fn capture_request(
    audio: Option<&DeviceDescriptor>,
    video: Option<&DeviceDescriptor>,
) -> CaptureRequest {
    CaptureRequest {
        audio: audio.cloned(),
        video: VideoConstraints::from_device(video).force_resolution(TARGET_RESOLUTION),
    }
}

/// A mounted preview owning its live stream
pub struct CapturePreview<S> {
    stream: S,
    presentation: Presentation,
    frame: Option<VideoFrame>,
    frames_received: u64,
}

impl<S: CaptureStream> CapturePreview<S> {
    /// Acquire a stream for the pair and start playback
    ///
    /// # Errors
    /// * [`BackendError::Cancelled`] - `root` was cancelled before acquisition
    /// * any acquisition error from the backend, unchanged
    ///
    /// A failure to start playback is logged and the preview is still returned.
    pub async fn initialize<B>(
        backend: &B,
        audio: Option<&DeviceDescriptor>,
        video: Option<&DeviceDescriptor>,
        root: &CancelScope,
    ) -> BackendResult<Self>
    where
        B: MediaDevices<Stream = S>,
    {
        if root.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let request = capture_request(audio, video);
        info!(
            audio = ?request.audio.as_ref().map(|d| &d.id),
            video = ?request.video.device_id,
            resolution = ?request.video.resolution(),
            "Mounting capture preview"
        );

        let mut stream = backend.get_user_media(request).await?;
        if let Err(e) = stream.play() {
            error!(error = %e, "Preview playback did not start");
        }

        Ok(Self {
            stream,
            presentation: Presentation::default(),
            frame: None,
            frames_received: 0,
        })
    }

    /// Pull the newest frame from the stream, if any
    pub fn poll_frame(&mut self) -> bool {
        match self.stream.try_next_frame() {
            Some(frame) => {
                self.frame = Some(frame);
                self.frames_received += 1;
                true
            }
            None => false,
        }
    }

    pub fn frame(&self) -> Option<&VideoFrame> {
        self.frame.as_ref()
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn request(&self) -> &CaptureRequest {
        self.stream.request()
    }

    pub fn is_playing(&self) -> bool {
        self.stream.is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{DeviceKind, Resolution};

    #[test]
    fn test_request_with_pair() {
        let audio = DeviceDescriptor::new("a1", "Mic", DeviceKind::AudioInput);
        let video = DeviceDescriptor::new("v1", "Cam", DeviceKind::VideoInput).with_group("g");
        let request = capture_request(Some(&audio), Some(&video));

        assert_eq!(request.audio, Some(audio));
        assert_eq!(request.video.device_id.as_deref(), Some("v1"));
        assert_eq!(request.video.group_id.as_deref(), Some("g"));
        assert_eq!(request.video.resolution(), Some(Resolution::new(1920, 1080)));
    }

    #[test]
    fn test_request_without_devices() {
        let request = capture_request(None, None);
        assert!(request.audio.is_none());
        assert!(request.video.is_resolution_only());
        assert_eq!(request.video.resolution(), Some(TARGET_RESOLUTION));
    }

    #[test]
    fn test_preview_box_uses_full_width() {
        let presentation = Presentation::default();
        let viewport = presentation.preview_box(160, 200);
        assert_eq!((viewport.width, viewport.height), (160, 90));
        assert_eq!((viewport.x, viewport.y), (0, 0));
    }

    #[test]
    fn test_preview_box_shrinks_when_too_tall() {
        let presentation = Presentation::default();
        let viewport = presentation.preview_box(320, 90);
        assert_eq!((viewport.width, viewport.height), (160, 90));
        assert_eq!(viewport.x, 80);
    }

    #[test]
    fn test_letterbox_pillarboxes_narrow_frames() {
        let presentation = Presentation::default();
        let container = presentation.preview_box(160, 90);
        let picture = presentation.letterbox(container, 640, 480);
        assert_eq!((picture.width, picture.height), (120, 90));
        assert_eq!(picture.x, 20);
    }

    #[test]
    fn test_letterbox_matching_ratio_fills_box() {
        let presentation = Presentation::default();
        let container = presentation.preview_box(160, 90);
        assert_eq!(presentation.letterbox(container, 1920, 1080), container);
    }
}
