// SPDX-License-Identifier: MPL-2.0

//! Device Preview - pick an audio/video input pair and preview the capture
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Platform device enumeration and stream acquisition
//! - [`flow`]: Device selector, capture preview and the flow controller
//! - [`terminal`]: Terminal rendering surface for the flow
//! - [`config`]: Runtime settings
//!
//! # Example
//!
//! ```ignore
//! use device_preview::backends::synthetic::SyntheticMediaDevices;
//! use device_preview::flow::{CancelScope, FlowController};
//!
//! let backend = SyntheticMediaDevices::default();
//! let mut flow = pollster::block_on(FlowController::mount(backend, CancelScope::new()))?;
//! pollster::block_on(flow.confirm())?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flow;
pub mod terminal;

// Re-export commonly used types
pub use backends::{BackendError, BackendKind, DeviceDescriptor, DeviceKind, MediaDevices};
pub use config::Config;
pub use errors::{AppError, AppResult};
pub use flow::{CancelScope, FlowController, Phase};
