// SPDX-License-Identifier: GPL-3.0-only

//! Cancellation scopes and subscription handles
//!
//! A [`CancelScope`] is a one-way flag. A child scope reads as cancelled as
//! soon as any ancestor is. Cancelling never interrupts work already in
//! flight; consumers check the flag when they are about to act.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
pub struct CancelScope {
    flags: Arc<[Arc<AtomicBool>]>,
}

impl CancelScope {
    /// A fresh root scope
    pub fn new() -> Self {
        Self {
            flags: Arc::from(vec![Arc::new(AtomicBool::new(false))]),
        }
    }

    /// A scope cancelled by either itself or `self`
    pub fn child(&self) -> Self {
        let mut flags: Vec<_> = self.flags.iter().cloned().collect();
        flags.push(Arc::new(AtomicBool::new(false)));
        Self {
            flags: Arc::from(flags),
        }
    }

    /// Cancel this scope and every child derived from it. Idempotent.
    pub fn cancel(&self) {
        if let Some(own) = self.flags.last() {
            own.store(true, Ordering::Release);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flags.iter().any(|f| f.load(Ordering::Acquire))
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one registered listener
///
/// The listener stays attached until [`Subscription::cancel`] is called or the
/// scope it was registered under is cancelled. Dropping the handle does not
/// detach anything.
#[derive(Debug, Clone)]
pub struct Subscription {
    scope: CancelScope,
}

impl Subscription {
    pub(crate) fn new(scope: CancelScope) -> Self {
        Self { scope }
    }

    pub fn cancel(&self) {
        self.scope.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.scope.is_cancelled()
    }

    pub(crate) fn scope(&self) -> &CancelScope {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_one_way_and_idempotent() {
        let scope = CancelScope::new();
        assert!(!scope.is_cancelled());
        scope.cancel();
        scope.cancel();
        assert!(scope.is_cancelled());
    }

    #[test]
    fn test_parent_cancels_child_but_not_reverse() {
        let root = CancelScope::new();
        let child = root.child();
        let sibling = root.child();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!root.is_cancelled());
        assert!(!sibling.is_cancelled());

        root.cancel();
        assert!(sibling.is_cancelled());
    }

    #[test]
    fn test_subscription_cancel_detaches_only_itself() {
        let scope = CancelScope::new();
        let first = Subscription::new(scope.child());
        let second = Subscription::new(scope.child());

        first.cancel();
        assert!(!first.is_active());
        assert!(second.is_active());
    }
}
