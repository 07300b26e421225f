// SPDX-License-Identifier: MPL-2.0

//! GStreamer pipeline for live capture preview
//!
//! ```text
//! video source ─ decodebin ─ videoconvert ─ videoscale ─ RGB 1920x1080 ─ appsink
//! audio source ─ audioconvert ─ audioresample ─ autoaudiosink
//! ```
//!
//! The width and height in the request are treated the way browsers treat
//! plain numeric constraints: the device is opened in whatever mode it offers
//! and the picture is scaled to the requested size.

use crate::backends::types::*;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Frames seen by one pipeline's appsink, numbered from 0
#[derive(Debug, Clone, Default)]
struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Capture pipeline for one confirmed device pair
pub struct CapturePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    frames: FrameCounter,
}

impl CapturePipeline {
    /// Build the pipeline and open the devices
    ///
    /// The pipeline is left in PAUSED, which is where sources acquire their
    /// device. Frames only flow after [`CapturePipeline::play`].
    pub fn new(
        video_device: Option<&gstreamer::Device>,
        audio_device: Option<&gstreamer::Device>,
        constraints: &VideoConstraints,
        frame_sender: FrameSender,
    ) -> BackendResult<Self> {
        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let pipeline = gstreamer::Pipeline::with_name("device-preview");

        let video_source = match video_device {
            Some(device) => device.create_element(Some("video-source"))?,
            None => gstreamer::ElementFactory::make("autovideosrc")
                .name("video-source")
                .build()?,
        };
        let video_chain = gstreamer::parse::bin_from_description(
            &video_chain_description(constraints),
            true,
        )?;
        pipeline.add_many([&video_source, video_chain.upcast_ref()])?;
        video_source.link(&video_chain)?;

        let audio_source = match audio_device {
            Some(device) => device.create_element(Some("audio-source"))?,
            None => gstreamer::ElementFactory::make("autoaudiosrc")
                .name("audio-source")
                .build()?,
        };
        let audio_chain = gstreamer::parse::bin_from_description(
            "audioconvert ! audioresample ! autoaudiosink sync=false",
            true,
        )?;
        pipeline.add_many([&audio_source, audio_chain.upcast_ref()])?;
        audio_source.link(&audio_chain)?;

        let appsink = video_chain
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let frames = FrameCounter::default();
        let callback_frames = frames.clone();
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = callback_frames.next();

                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = VideoFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: Arc::from(map.as_slice()),
                        captured_at: Instant::now(),
                    };

                    let mut sender = frame_sender.clone();
                    if let Err(e) = sender.try_send(frame) {
                        if e.is_disconnected() {
                            return Err(gstreamer::FlowError::Flushing);
                        }
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            debug!(frame = frame_num, "Frame dropped (channel full)");
                        }
                    } else if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = video_info.width(),
                            height = video_info.height(),
                            "Frame delivered"
                        );
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        let capture = Self {
            pipeline,
            appsink,
            frames,
        };
        capture.transition(gstreamer::State::Paused)?;
        info!(constraints = ?constraints, "Capture pipeline opened");
        Ok(capture)
    }

    /// Set the pipeline to PLAYING
    pub fn play(&self) -> BackendResult<()> {
        self.transition(gstreamer::State::Playing)
            .map_err(|e| match e {
                BackendError::PlaybackFailed(msg) => BackendError::PlaybackFailed(msg),
                other => BackendError::PlaybackFailed(other.to_string()),
            })
    }

    /// Request a state and surface the first bus error if it fails
    fn transition(&self, state: gstreamer::State) -> BackendResult<()> {
        debug!(?state, "Setting capture pipeline state");
        if self.pipeline.set_state(state).is_ok() {
            let (result, current, pending) = self.pipeline.state(
                gstreamer::ClockTime::from_seconds(timing::START_TIMEOUT_SECS),
            );
            debug!(?result, ?current, ?pending, "Capture pipeline state");
            if result.is_ok() {
                return Ok(());
            }
        }

        let err = self.pop_bus_error().unwrap_or_else(|| {
            BackendError::InitializationFailed(format!("Pipeline refused state {:?}", state))
        });
        error!(error = %err, "Capture pipeline state change failed");
        let _ = self.pipeline.set_state(gstreamer::State::Null);
        Err(err)
    }

    fn pop_bus_error(&self) -> Option<BackendError> {
        let bus = self.pipeline.bus()?;
        let message = bus.timed_pop_filtered(
            gstreamer::ClockTime::ZERO,
            &[gstreamer::MessageType::Error],
        )?;
        match message.view() {
            gstreamer::MessageView::Error(err) => Some(classify_error(err.error())),
            _ => None,
        }
    }
}

/// Map a GStreamer error domain onto the acquisition taxonomy
pub fn classify_error(err: gstreamer::glib::Error) -> BackendError {
    let message = err.message().to_string();
    if let Some(kind) = err.kind::<gstreamer::ResourceError>() {
        return match kind {
            gstreamer::ResourceError::NotFound => BackendError::DeviceNotFound(message),
            gstreamer::ResourceError::NotAuthorized
            | gstreamer::ResourceError::OpenRead
            | gstreamer::ResourceError::OpenReadWrite
            | gstreamer::ResourceError::Busy => BackendError::PermissionDenied(message),
            gstreamer::ResourceError::Settings => BackendError::ConstraintNotSatisfied(message),
            _ => BackendError::InitializationFailed(message),
        };
    }
    if let Some(gstreamer::CoreError::Negotiation) = err.kind::<gstreamer::CoreError>() {
        return BackendError::ConstraintNotSatisfied(message);
    }
    if let Some(gstreamer::StreamError::Format) = err.kind::<gstreamer::StreamError>() {
        return BackendError::ConstraintNotSatisfied(message);
    }
    BackendError::InitializationFailed(message)
}

fn video_chain_description(constraints: &VideoConstraints) -> String {
    let mut caps = String::from("video/x-raw,format=RGB");
    if let Some(width) = constraints.width {
        caps.push_str(&format!(",width=(int){}", width));
    }
    if let Some(height) = constraints.height {
        caps.push_str(&format!(",height=(int){}", height));
    }
    format!(
        "decodebin ! videoconvert ! videoscale ! {} ! appsink name=sink",
        caps
    )
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        debug!(
            frames = self.frames.count(),
            "Dropping capture pipeline - releasing devices"
        );
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        if self.pipeline.set_state(gstreamer::State::Null).is_err() {
            warn!("Capture pipeline did not reach NULL");
            return;
        }
        let _ = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
    }
}
