// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use device_preview::constants::{TARGET_RESOLUTION, pipeline, preview, timing};

#[test]
fn test_target_resolution_is_full_hd() {
    assert_eq!((TARGET_RESOLUTION.width, TARGET_RESOLUTION.height), (1920, 1080));
}

#[test]
fn test_preview_ratio_is_widescreen() {
    let (w, h) = preview::ASPECT_RATIO;
    assert_eq!(w * 9, h * 16);
}

#[test]
fn test_frame_buffering_is_bounded() {
    // Preview only needs the newest frame, so buffering must stay small
    assert!(pipeline::MAX_BUFFERS >= 1);
    assert!(pipeline::FRAME_CHANNEL_CAPACITY >= pipeline::MAX_BUFFERS as usize);
}

#[test]
fn test_synthetic_frames_slower_than_ui_poll() {
    assert!(timing::SYNTHETIC_FRAME_INTERVAL > timing::UI_POLL_INTERVAL);
}
