// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for device operations
//!
//! This module provides command-line functionality for:
//! - Listing available devices
//! - Probing a capture without the interactive selector

use device_preview::backends::{BackendError, DeviceDescriptor, DeviceKind, MediaDevices};
use device_preview::errors::{AppError, AppResult};
use device_preview::flow::{CancelScope, DeviceSelector, FlowController};
use std::time::{Duration, Instant};

/// List all devices the backend reports
pub fn list_devices<B: MediaDevices>(backend: &B, json: bool) -> AppResult<()> {
    let devices = pollster::block_on(backend.enumerate_devices())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    for (title, kind) in [
        ("Audio inputs", DeviceKind::AudioInput),
        ("Video inputs", DeviceKind::VideoInput),
        ("Audio outputs", DeviceKind::AudioOutput),
    ] {
        let matching: Vec<&DeviceDescriptor> = devices.iter().filter(|d| d.kind == kind).collect();
        println!("{}:", title);
        if matching.is_empty() {
            println!("  (none)");
        }
        for (index, device) in matching.iter().enumerate() {
            println!("  [{}] {}", index, device.display_name());
            println!("      id: {}", device.id);
            if let Some(group) = &device.group_id {
                println!("      group: {}", group);
            }
        }
        println!();
    }

    Ok(())
}

/// Dispatch a change event for an id the selector lists
///
/// Unlisted ids fail with [`BackendError::DeviceNotFound`].
fn select_device(selector: &DeviceSelector, kind: DeviceKind, id: &str) -> AppResult<()> {
    let listed = match kind {
        DeviceKind::AudioInput => selector.audio().options().iter().any(|d| d.id == id),
        DeviceKind::VideoInput => selector.video().options().iter().any(|d| d.id == id),
        DeviceKind::AudioOutput => false,
    };
    if !listed {
        return Err(BackendError::DeviceNotFound(format!(
            "no {} with id '{}' (see 'device-preview list')",
            kind, id
        ))
        .into());
    }
    selector.change(kind, id);
    Ok(())
}

/// Run the flow without a terminal UI: select, confirm, count frames
pub fn probe<B: MediaDevices>(
    backend: B,
    audio: Option<String>,
    video: Option<String>,
    duration: u64,
    poll_interval: Duration,
) -> AppResult<()> {
    let mut flow = pollster::block_on(FlowController::mount(backend, CancelScope::new()))?;

    if let Some(selector) = flow.container().selector().cloned() {
        for (kind, id) in [(DeviceKind::AudioInput, audio), (DeviceKind::VideoInput, video)] {
            if let Some(id) = id {
                select_device(&selector, kind, &id)?;
            }
        }
    }
    flow.pump();

    let selection = flow.selection().clone();
    println!(
        "Audio: {}",
        selection
            .audio
            .as_ref()
            .map_or("(default)", |d| d.display_name())
    );
    println!(
        "Video: {}",
        selection
            .video
            .as_ref()
            .map_or("(default)", |d| d.display_name())
    );

    pollster::block_on(flow.confirm())?;

    let preview = flow
        .container_mut()
        .preview_mut()
        .ok_or_else(|| AppError::Config("preview was not mounted".to_string()))?;
    if !preview.is_playing() {
        println!("Playback did not start; see log output.");
    }

    println!("Previewing for {} seconds...", duration);
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(duration) {
        preview.poll_frame();
        std::thread::sleep(poll_interval);
    }

    let frames = preview.frames_received();
    let elapsed = start.elapsed().as_secs_f64();
    match preview.frame() {
        Some(frame) => println!(
            "Received {} frames at {}x{} ({:.1} fps)",
            frames,
            frame.width,
            frame.height,
            frames as f64 / elapsed
        ),
        None => println!("No frames received."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_preview::backends::synthetic::SyntheticMediaDevices;

    fn mounted_selector() -> (FlowController<SyntheticMediaDevices>, DeviceSelector) {
        let flow = pollster::block_on(FlowController::mount(
            SyntheticMediaDevices::new(2),
            CancelScope::new(),
        ))
        .unwrap();
        let selector = flow.container().selector().cloned().unwrap();
        (flow, selector)
    }

    #[test]
    fn test_select_listed_device() {
        let (mut flow, selector) = mounted_selector();

        select_device(&selector, DeviceKind::VideoInput, "synthetic-cam-1").unwrap();
        flow.pump();

        let video = flow.selection().video.as_ref().unwrap();
        assert_eq!(video.id, "synthetic-cam-1");
    }

    #[test]
    fn test_unknown_device_id_is_rejected() {
        let (mut flow, selector) = mounted_selector();

        let result = select_device(&selector, DeviceKind::AudioInput, "missing-mic");
        assert!(matches!(
            result,
            Err(AppError::Backend(BackendError::DeviceNotFound(_)))
        ));

        flow.pump();
        let audio = flow.selection().audio.as_ref().unwrap();
        assert_eq!(audio.id, "synthetic-mic-0");
    }
}
