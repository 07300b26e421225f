// SPDX-License-Identifier: GPL-3.0-only

//! Audio and video input selection
//!
//! The selector holds one option list per input kind and the device currently
//! chosen in each. Every change is published as a [`SelectionChanged`]
//! carrying both devices, so a consumer never has to merge partial updates.

use super::scope::{CancelScope, Subscription};
use crate::backends::{BackendResult, DeviceDescriptor, DeviceKind, MediaDevices};
use futures::channel::mpsc;
use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

/// The full selected pair after a change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChanged {
    pub audio: Option<DeviceDescriptor>,
    pub video: Option<DeviceDescriptor>,
}

/// Receiving end of a selector subscription
pub type SelectionEvents = mpsc::UnboundedReceiver<SelectionChanged>;

/// Options for one input kind, in enumeration order
#[derive(Debug, Clone)]
pub struct DeviceList {
    kind: DeviceKind,
    options: Vec<DeviceDescriptor>,
    lookup: HashMap<String, DeviceDescriptor>,
    current: Option<DeviceDescriptor>,
    /// Option row of `current`
    selected: Option<usize>,
}

impl DeviceList {
    fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            options: Vec::new(),
            lookup: HashMap::new(),
            current: None,
            selected: None,
        }
    }

    fn push(&mut self, device: DeviceDescriptor) {
        if self.current.is_none() {
            self.current = Some(device.clone());
            self.selected = Some(self.options.len());
        }
        self.lookup.insert(device.id.clone(), device.clone());
        self.options.push(device);
    }

    /// Resolve `id` and make it current
    ///
    /// A duplicated id resolves to its last registered row.
    fn select(&mut self, id: &str) {
        self.current = self.lookup.get(id).cloned();
        self.selected = self
            .current
            .as_ref()
            .and_then(|_| self.options.iter().rposition(|d| d.id == id));
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn options(&self) -> &[DeviceDescriptor] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn current(&self) -> Option<&DeviceDescriptor> {
        self.current.as_ref()
    }

    /// Option row of the current device
    pub fn current_index(&self) -> Option<usize> {
        self.selected
    }
}

struct Listener {
    sender: mpsc::UnboundedSender<SelectionChanged>,
    scope: CancelScope,
}

struct SelectorState {
    audio: DeviceList,
    video: DeviceList,
    listeners: Vec<Listener>,
}

impl SelectorState {
    fn pair(&self) -> SelectionChanged {
        SelectionChanged {
            audio: self.audio.current.clone(),
            video: self.video.current.clone(),
        }
    }
}

/// Device selection widget model
///
/// Cloning yields another handle to the same selector, the way a rendered
/// element stays reachable from both its container and whoever holds a
/// reference to it.
#[derive(Clone)]
pub struct DeviceSelector {
    state: Rc<RefCell<SelectorState>>,
}

impl DeviceSelector {
    /// Enumerate devices and build the selector
    ///
    /// # Errors
    /// Enumeration failures are returned as-is; nothing is retried.
    pub async fn initialize<B: MediaDevices>(backend: &B) -> BackendResult<Self> {
        let devices = backend.enumerate_devices().await?;
        info!(
            count = devices.len(),
            backend = %backend.backend_kind(),
            "Building device selector"
        );
        Ok(Self::from_devices(devices))
    }

    /// Build the selector from an already enumerated device list
    ///
    /// Devices other than audio and video inputs are ignored. The first
    /// device of each kind becomes that kind's current device.
    pub fn from_devices(devices: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        let mut audio = DeviceList::new(DeviceKind::AudioInput);
        let mut video = DeviceList::new(DeviceKind::VideoInput);

        for device in devices {
            match device.kind {
                DeviceKind::AudioInput => audio.push(device),
                DeviceKind::VideoInput => video.push(device),
                DeviceKind::AudioOutput => {}
            }
        }

        debug!(
            audio = audio.options.len(),
            video = video.options.len(),
            default_audio = ?audio.current.as_ref().map(|d| &d.id),
            default_video = ?video.current.as_ref().map(|d| &d.id),
            "Device lists built"
        );

        Self {
            state: Rc::new(RefCell::new(SelectorState {
                audio,
                video,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener scoped to a child of `scope`
    ///
    /// Events arrive in dispatch order. The listener detaches when either the
    /// returned handle or `scope` is cancelled.
    pub fn subscribe(&self, scope: &CancelScope) -> (Subscription, SelectionEvents) {
        let (sender, receiver) = mpsc::unbounded();
        let subscription = Subscription::new(scope.child());
        self.state.borrow_mut().listeners.push(Listener {
            sender,
            scope: subscription.scope().clone(),
        });
        (subscription, receiver)
    }

    /// Deliver a change event for one list
    ///
    /// `id` is resolved through the list's lookup table; an unknown id clears
    /// the current device of that kind. Returns `false` when no listener is
    /// attached, in which case nothing changes.
    pub fn change(&self, kind: DeviceKind, id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state
            .listeners
            .retain(|l| !l.scope.is_cancelled() && !l.sender.is_closed());
        if state.listeners.is_empty() {
            debug!(%kind, id, "Change event ignored, no listener attached");
            return false;
        }

        let list = match kind {
            DeviceKind::AudioInput => &mut state.audio,
            DeviceKind::VideoInput => &mut state.video,
            DeviceKind::AudioOutput => return false,
        };
        list.select(id);

        let pair = state.pair();
        debug!(
            %kind,
            id,
            audio = ?pair.audio.as_ref().map(|d| &d.id),
            video = ?pair.video.as_ref().map(|d| &d.id),
            "Selection changed"
        );
        for listener in &state.listeners {
            let _ = listener.sender.unbounded_send(pair.clone());
        }
        true
    }

    /// Move the current device of `kind` by `delta` options, clamped to the list
    pub fn step(&self, kind: DeviceKind, delta: isize) -> bool {
        let target = {
            let state = self.state.borrow();
            let list = match kind {
                DeviceKind::AudioInput => &state.audio,
                DeviceKind::VideoInput => &state.video,
                DeviceKind::AudioOutput => return false,
            };
            if list.is_empty() {
                return false;
            }
            let last = list.options.len() as isize - 1;
            let index = list.selected.map_or(0, |i| i as isize);
            let next = (index + delta).clamp(0, last) as usize;
            if Some(next) == list.selected {
                return false;
            }
            list.options[next].id.clone()
        };
        self.change(kind, &target)
    }

    /// Current pair as tracked by the selector
    pub fn current(&self) -> SelectionChanged {
        self.state.borrow().pair()
    }

    pub fn audio(&self) -> Ref<'_, DeviceList> {
        Ref::map(self.state.borrow(), |s| &s.audio)
    }

    pub fn video(&self) -> Ref<'_, DeviceList> {
        Ref::map(self.state.borrow(), |s| &s.video)
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|l| !l.scope.is_cancelled() && !l.sender.is_closed())
            .count()
    }
}

impl std::fmt::Debug for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("DeviceSelector")
            .field("audio", &state.audio.options.len())
            .field("video", &state.video.options.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(id: &str, kind: DeviceKind) -> DeviceDescriptor {
        DeviceDescriptor::new(id, id.to_uppercase(), kind)
    }

    fn ids(list: &DeviceList) -> Vec<&str> {
        list.options().iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_lists_are_partitioned_in_order() {
        let selector = DeviceSelector::from_devices([
            dev("v1", DeviceKind::VideoInput),
            dev("a1", DeviceKind::AudioInput),
            dev("out", DeviceKind::AudioOutput),
            dev("a2", DeviceKind::AudioInput),
            dev("v2", DeviceKind::VideoInput),
        ]);
        assert_eq!(ids(&selector.audio()), ["a1", "a2"]);
        assert_eq!(ids(&selector.video()), ["v1", "v2"]);
    }

    #[test]
    fn test_first_device_wins_default() {
        let selector = DeviceSelector::from_devices([
            dev("a1", DeviceKind::AudioInput),
            dev("a2", DeviceKind::AudioInput),
        ]);
        let current = selector.current();
        assert_eq!(current.audio.unwrap().id, "a1");
        assert!(current.video.is_none());
        assert!(selector.video().is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_all_listed() {
        let selector = DeviceSelector::from_devices([
            DeviceDescriptor::new("dup", "first", DeviceKind::AudioInput),
            DeviceDescriptor::new("dup", "second", DeviceKind::AudioInput),
        ]);
        assert_eq!(selector.audio().options().len(), 2);
        assert_eq!(selector.current().audio.unwrap().label, "first");

        let (_sub, mut events) = selector.subscribe(&CancelScope::new());
        assert!(selector.change(DeviceKind::AudioInput, "dup"));
        assert_eq!(events.try_recv().unwrap().audio.unwrap().label, "second");
    }

    #[test]
    fn test_change_emits_full_pair() {
        let selector = DeviceSelector::from_devices([
            dev("a1", DeviceKind::AudioInput),
            dev("a2", DeviceKind::AudioInput),
            dev("v1", DeviceKind::VideoInput),
            dev("v2", DeviceKind::VideoInput),
        ]);
        let (_sub, mut events) = selector.subscribe(&CancelScope::new());

        selector.change(DeviceKind::AudioInput, "a2");
        let event = events.try_recv().unwrap();
        assert_eq!(event.audio.unwrap().id, "a2");
        assert_eq!(event.video.unwrap().id, "v1");

        selector.change(DeviceKind::VideoInput, "v2");
        let event = events.try_recv().unwrap();
        assert_eq!(event.audio.unwrap().id, "a2");
        assert_eq!(event.video.unwrap().id, "v2");
    }

    #[test]
    fn test_unknown_id_clears_that_kind_only() {
        let selector = DeviceSelector::from_devices([
            dev("a1", DeviceKind::AudioInput),
            dev("v1", DeviceKind::VideoInput),
        ]);
        let (_sub, mut events) = selector.subscribe(&CancelScope::new());

        selector.change(DeviceKind::VideoInput, "nope");
        let event = events.try_recv().unwrap();
        assert_eq!(event.audio.unwrap().id, "a1");
        assert!(event.video.is_none());
    }

    #[test]
    fn test_cancelled_scope_detaches_listener() {
        let selector = DeviceSelector::from_devices([
            dev("a1", DeviceKind::AudioInput),
            dev("a2", DeviceKind::AudioInput),
        ]);
        let scope = CancelScope::new();
        let (sub, mut events) = selector.subscribe(&scope);
        assert!(sub.is_active());

        scope.cancel();
        assert!(!sub.is_active());
        assert!(!selector.change(DeviceKind::AudioInput, "a2"));
        assert!(events.try_recv().is_err());
        assert_eq!(selector.current().audio.unwrap().id, "a1");
        assert_eq!(selector.listener_count(), 0);
    }

    #[test]
    fn test_step_clamps_to_list() {
        let selector = DeviceSelector::from_devices([
            dev("v1", DeviceKind::VideoInput),
            dev("v2", DeviceKind::VideoInput),
        ]);
        let (_sub, mut events) = selector.subscribe(&CancelScope::new());

        assert!(!selector.step(DeviceKind::VideoInput, -1));
        assert!(selector.step(DeviceKind::VideoInput, 1));
        assert!(!selector.step(DeviceKind::VideoInput, 1));
        assert_eq!(events.try_recv().unwrap().video.unwrap().id, "v2");
        assert!(events.try_recv().is_err());
        assert!(!selector.step(DeviceKind::AudioInput, 1));
    }

    #[test]
    fn test_step_moves_past_duplicate_ids() {
        let selector = DeviceSelector::from_devices([
            DeviceDescriptor::new("dup", "first", DeviceKind::AudioInput),
            DeviceDescriptor::new("dup", "second", DeviceKind::AudioInput),
            DeviceDescriptor::new("x", "third", DeviceKind::AudioInput),
        ]);
        let (_sub, _events) = selector.subscribe(&CancelScope::new());
        assert_eq!(selector.audio().current_index(), Some(0));

        assert!(selector.step(DeviceKind::AudioInput, 1));
        assert_eq!(selector.audio().current_index(), Some(1));
        assert_eq!(selector.current().audio.unwrap().label, "second");

        for _ in 0..4 {
            selector.step(DeviceKind::AudioInput, 1);
        }
        assert_eq!(selector.current().audio.unwrap().id, "x");
        assert_eq!(selector.audio().current_index(), Some(2));

        assert!(selector.step(DeviceKind::AudioInput, -1));
        assert_eq!(selector.audio().current_index(), Some(1));
    }

    #[test]
    fn test_unknown_id_clears_selected_row() {
        let selector = DeviceSelector::from_devices([dev("v1", DeviceKind::VideoInput)]);
        let (_sub, _events) = selector.subscribe(&CancelScope::new());

        selector.change(DeviceKind::VideoInput, "gone");
        assert_eq!(selector.video().current_index(), None);
        assert!(selector.step(DeviceKind::VideoInput, 1));
        assert_eq!(selector.video().current_index(), Some(0));
    }
}
