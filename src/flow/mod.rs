// SPDX-License-Identifier: GPL-3.0-only

//! Device selection and preview flow
//!
//! - [`selector`]: audio/video option lists and change events
//! - [`preview`]: stream acquisition and presentation
//! - [`controller`]: the session state machine tying both together
//! - [`scope`]: cancellation scopes and subscription handles

pub mod controller;
pub mod preview;
pub mod scope;
pub mod selector;

pub use controller::{ConfirmButton, Container, FlowController, Phase, SelectionState, View};
pub use preview::{CapturePreview, Presentation, Viewport, capture_request};
pub use scope::{CancelScope, Subscription};
pub use selector::{DeviceList, DeviceSelector, SelectionChanged, SelectionEvents};
