// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::BackendKind;
use crate::constants::{pipeline, timing};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Runtime settings for one session
///
/// Built from command-line flags over [`Config::default`]. Nothing is read
/// from or written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which backend provides devices and streams
    pub backend: BackendKind,
    /// Frames buffered between the streaming thread and the UI
    pub frame_channel_capacity: usize,
    /// Input poll interval in milliseconds
    pub ui_poll_interval_ms: u64,
    /// Number of microphone/camera pairs the synthetic backend reports
    pub synthetic_devices: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            frame_channel_capacity: pipeline::FRAME_CHANNEL_CAPACITY,
            ui_poll_interval_ms: timing::UI_POLL_INTERVAL.as_millis() as u64,
            synthetic_devices: 2,
        }
    }
}

impl Config {
    /// Reject settings the flow cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.frame_channel_capacity == 0 {
            return Err(AppError::Config(
                "frame channel capacity must be at least 1".to_string(),
            ));
        }
        if self.ui_poll_interval_ms == 0 {
            return Err(AppError::Config(
                "UI poll interval must be at least 1 ms".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ui_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ui_poll_interval_ms)
    }
}
