// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use crate::backends::Resolution;
use std::time::Duration;

/// Every capture is requested at this size, regardless of the device's own fields
pub const TARGET_RESOLUTION: Resolution = Resolution::new(1920, 1080);

/// Preview presentation settings
pub mod preview {
    /// Fixed preview aspect ratio (width, height)
    pub const ASPECT_RATIO: (u32, u32) = (16, 9);

    /// Label on the confirmation control
    pub const CONFIRM_LABEL: &str = "Confirm";
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffers queued in the appsink before old frames are dropped
    pub const MAX_BUFFERS: u32 = 2;

    /// Capacity of the frame channel between the streaming thread and the UI
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;

    /// Device monitor class filters
    pub const AUDIO_SOURCE_CLASS: &str = "Audio/Source";
    pub const VIDEO_SOURCE_CLASS: &str = "Video/Source";
    pub const AUDIO_SINK_CLASS: &str = "Audio/Sink";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Seconds to wait for the pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Seconds to wait for the pipeline to reach NULL
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 120;

    /// UI input poll interval (roughly 60 redraws per second)
    pub const UI_POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Synthetic backend frame interval
    pub const SYNTHETIC_FRAME_INTERVAL: Duration = Duration::from_millis(33);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_matches_preview_aspect() {
        let (w, h) = preview::ASPECT_RATIO;
        assert_eq!(TARGET_RESOLUTION.width * h, TARGET_RESOLUTION.height * w);
    }
}
