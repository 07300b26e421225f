// SPDX-License-Identifier: GPL-3.0-only

//! Device enumeration through the GStreamer device monitor
//!
//! The monitor aggregates every installed device provider (PipeWire, V4L2,
//! PulseAudio, ALSA), so one probe covers cameras, microphones and speakers.

use crate::backends::types::{BackendError, BackendResult, DeviceDescriptor, DeviceKind};
use crate::constants::pipeline;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Property keys tried, in order, for a stable device identifier
const ID_PROPERTIES: &[&str] = &[
    "object.serial",
    "node.name",
    "device.path",
    "api.alsa.path",
    "udev.id",
];

/// Property keys tried, in order, for the physical-unit group
const GROUP_PROPERTIES: &[&str] = &["device.id", "device.bus-path", "device.bus_path"];

/// One enumerated device together with the monitor handle that creates its source
pub struct EnumeratedDevice {
    pub descriptor: DeviceDescriptor,
    pub device: gstreamer::Device,
}

/// Enumerate audio sources, video sources and audio sinks
pub fn enumerate_gst_devices() -> BackendResult<Vec<EnumeratedDevice>> {
    debug!("Enumerating devices via GStreamer device monitor");

    gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    for class in [
        pipeline::AUDIO_SOURCE_CLASS,
        pipeline::VIDEO_SOURCE_CLASS,
        pipeline::AUDIO_SINK_CLASS,
    ] {
        if monitor.add_filter(Some(class), None).is_none() {
            warn!(class, "Device monitor rejected filter");
        }
    }

    monitor
        .start()
        .map_err(|e| BackendError::EnumerationFailed(e.to_string()))?;
    let devices = monitor.devices();
    monitor.stop();

    let mut enumerated = Vec::new();
    for (index, device) in devices.into_iter().enumerate() {
        let Some(kind) = classify(&device) else {
            debug!(class = %device.device_class(), "Skipping device of unrelated class");
            continue;
        };

        let properties = device.properties();
        let id = properties
            .as_ref()
            .and_then(|p| first_string(p, ID_PROPERTIES))
            .unwrap_or_else(|| format!("{}-{}", kind, index));
        let group_id = properties
            .as_ref()
            .and_then(|p| first_string(p, GROUP_PROPERTIES));

        let descriptor = DeviceDescriptor {
            id,
            label: device.display_name().to_string(),
            kind,
            group_id,
        };

        debug!(
            id = %descriptor.id,
            label = %descriptor.label,
            kind = %descriptor.kind,
            "Found device"
        );
        enumerated.push(EnumeratedDevice { descriptor, device });
    }

    info!(count = enumerated.len(), "GStreamer devices enumerated");
    Ok(enumerated)
}

/// Check if GStreamer can be initialized on this system
pub fn is_gstreamer_available() -> bool {
    gstreamer::init().is_ok()
}

fn classify(device: &gstreamer::Device) -> Option<DeviceKind> {
    if device.has_classes(pipeline::VIDEO_SOURCE_CLASS) {
        Some(DeviceKind::VideoInput)
    } else if device.has_classes(pipeline::AUDIO_SOURCE_CLASS) {
        Some(DeviceKind::AudioInput)
    } else if device.has_classes(pipeline::AUDIO_SINK_CLASS) {
        Some(DeviceKind::AudioOutput)
    } else {
        None
    }
}

fn first_string(properties: &gstreamer::StructureRef, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let value = properties.value(*key).ok()?;
        match value.get::<String>() {
            Ok(s) if !s.is_empty() => Some(s),
            Ok(_) => None,
            // PipeWire reports some ids as integers
            Err(_) => value.serialize().ok().map(|s| s.to_string()),
        }
    })
}
