// SPDX-License-Identifier: GPL-3.0-only

//! Top-level selection-to-preview flow
//!
//! ```text
//! Selecting ──confirm──▶ Previewing
//! ```
//!
//! `Previewing` is terminal. Confirming again stays in `Previewing` and
//! replaces the mounted preview.

use super::preview::CapturePreview;
use super::scope::{CancelScope, Subscription};
use super::selector::{DeviceSelector, SelectionChanged, SelectionEvents};
use crate::backends::{BackendResult, DeviceDescriptor, MediaDevices};
use crate::constants::preview;
use tracing::{debug, info};

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selecting,
    Previewing,
}

/// Devices chosen so far, last write wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub audio: Option<DeviceDescriptor>,
    pub video: Option<DeviceDescriptor>,
}

impl SelectionState {
    fn apply(&mut self, event: SelectionChanged) {
        self.audio = event.audio;
        self.video = event.video;
    }
}

/// Confirmation control shown beside the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmButton {
    pub label: &'static str,
}

/// One child of the flow's container
pub enum View<S> {
    Selector(DeviceSelector),
    ConfirmButton(ConfirmButton),
    Preview(CapturePreview<S>),
}

/// The single container the flow renders into
pub struct Container<S> {
    children: Vec<View<S>>,
}

impl<S> Container<S> {
    fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    fn append(&mut self, view: View<S>) {
        self.children.push(view);
    }

    fn clear(&mut self) {
        self.children.clear();
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[View<S>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [View<S>] {
        &mut self.children
    }

    pub fn selector(&self) -> Option<&DeviceSelector> {
        self.children.iter().find_map(|v| match v {
            View::Selector(selector) => Some(selector),
            _ => None,
        })
    }

    pub fn preview(&self) -> Option<&CapturePreview<S>> {
        self.children.iter().find_map(|v| match v {
            View::Preview(preview) => Some(preview),
            _ => None,
        })
    }

    pub fn preview_mut(&mut self) -> Option<&mut CapturePreview<S>> {
        self.children.iter_mut().find_map(|v| match v {
            View::Preview(preview) => Some(preview),
            _ => None,
        })
    }
}

/// Owns the session: selector first, preview after confirmation
pub struct FlowController<B: MediaDevices> {
    backend: B,
    /// Outer scope; never cancelled by the flow itself
    root: CancelScope,
    /// Selection phase only, child of `root`
    selection_scope: CancelScope,
    subscription: Subscription,
    selection: SelectionState,
    events: SelectionEvents,
    container: Container<B::Stream>,
    phase: Phase,
}

impl<B: MediaDevices> FlowController<B> {
    /// Enumerate devices and render the selector with its confirm button
    ///
    /// # Errors
    /// Enumeration failure, unchanged.
    pub async fn mount(backend: B, root: CancelScope) -> BackendResult<Self> {
        let selection_scope = root.child();
        let selector = DeviceSelector::initialize(&backend).await?;
        let (subscription, events) = selector.subscribe(&selection_scope);

        let defaults = selector.current();
        let mut selection = SelectionState::default();
        selection.apply(defaults);

        let mut container = Container::new();
        container.append(View::Selector(selector));
        container.append(View::ConfirmButton(ConfirmButton {
            label: preview::CONFIRM_LABEL,
        }));

        info!(
            audio = ?selection.audio.as_ref().map(|d| &d.id),
            video = ?selection.video.as_ref().map(|d| &d.id),
            "Flow mounted in selection phase"
        );

        Ok(Self {
            backend,
            root,
            selection_scope,
            subscription,
            selection,
            events,
            container,
            phase: Phase::Selecting,
        })
    }

    /// Apply every selection event dispatched so far; returns how many
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.selection.apply(event);
            applied += 1;
        }
        if applied > 0 {
            debug!(
                applied,
                audio = ?self.selection.audio.as_ref().map(|d| &d.id),
                video = ?self.selection.video.as_ref().map(|d| &d.id),
                "Selection updated"
            );
        }
        applied
    }

    /// Leave the selection phase and mount a preview of the current pair
    ///
    /// Safe to call again: the container is cleared and a fresh preview
    /// mounted each time.
    ///
    /// # Errors
    /// Stream acquisition failure, unchanged. The selector is already gone
    /// by then and the container stays empty.
    pub async fn confirm(&mut self) -> BackendResult<()> {
        self.pump();
        self.selection_scope.cancel();
        self.container.clear();
        self.phase = Phase::Previewing;

        info!(
            audio = ?self.selection.audio.as_ref().map(|d| &d.id),
            video = ?self.selection.video.as_ref().map(|d| &d.id),
            "Selection confirmed"
        );

        let preview = CapturePreview::initialize(
            &self.backend,
            self.selection.audio.as_ref(),
            self.selection.video.as_ref(),
            &self.root,
        )
        .await?;

        self.container.append(View::Preview(preview));
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The selector listener; inactive once confirmed
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn container(&self) -> &Container<B::Stream> {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container<B::Stream> {
        &mut self.container
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
