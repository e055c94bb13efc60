// ============================================================================
// catalog-signals - Subscriptions
//
// Unsubscribe handles and the per-component subscription registry.
// ============================================================================
//
// Every transient component (list, modal, edit form) that subscribes to a
// signal must release exactly the subscriptions it made when it is destroyed.
// A leaked subscriber keeps firing against a view that is no longer mounted.
//
// - `Unsubscribe` - one registration; `unsubscribe()` is idempotent
// - `Subscriptions` - a bag of handles torn down once, explicitly or on drop
//
// An `Unsubscribe` does NOT detach when dropped. Dropping it is how a
// page-lifetime subscriber opts out of teardown; components that have a
// lifetime keep their handles in a `Subscriptions`.
// ============================================================================

use std::fmt;
use std::rc::Weak;

use crate::core::subscribers::{Detach, SubscriberId};

// =============================================================================
// UNSUBSCRIBE
// =============================================================================

/// Handle returned by `Signal::subscribe` and `CollectionSignal::subscribe_delta`.
///
/// Holds only a weak reference to the signal, so an outstanding handle never
/// keeps a signal alive.
///
/// # Example
///
/// ```
/// use catalog_signals::Signal;
///
/// let count = Signal::new(0);
/// let mut handle = count.subscribe(|n| println!("count = {n}"));
/// assert_eq!(count.subscriber_count(), 1);
///
/// assert!(handle.unsubscribe());
/// assert!(!handle.unsubscribe()); // second call is a no-op
/// assert_eq!(count.subscriber_count(), 0);
/// ```
#[must_use = "dropping an Unsubscribe leaves the callback registered; keep it in a Subscriptions or call unsubscribe()"]
pub struct Unsubscribe {
    target: Option<(Weak<dyn Detach>, SubscriberId)>,
}

impl Unsubscribe {
    pub(crate) fn new(source: Weak<dyn Detach>, id: SubscriberId) -> Self {
        Self {
            target: Some((source, id)),
        }
    }

    /// Remove the callback from its signal.
    ///
    /// Returns true only for the call that actually removed it. Calling again,
    /// or calling after the signal cleared its subscribers or was dropped,
    /// returns false and has no other effect.
    pub fn unsubscribe(&mut self) -> bool {
        match self.target.take() {
            Some((source, id)) => source.upgrade().is_some_and(|source| source.detach(id)),
            None => false,
        }
    }

    /// Whether `unsubscribe()` has already been called on this handle.
    pub fn is_spent(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some((source, id)) => f
                .debug_struct("Unsubscribe")
                .field("id", id)
                .field("source_alive", &(source.strong_count() > 0))
                .finish(),
            None => f.debug_struct("Unsubscribe").field("spent", &true).finish(),
        }
    }
}

// =============================================================================
// SUBSCRIPTIONS (registry)
// =============================================================================

/// The subscriptions owned by one component.
///
/// Add every handle the component receives; call `teardown()` when the
/// component is destroyed (or just drop the registry). Each handle is invoked
/// exactly once. Handles added after teardown are released immediately, so a
/// destroyed component can never pick up a live subscriber.
///
/// # Example
///
/// ```
/// use catalog_signals::{Signal, Subscriptions};
///
/// let selected = Signal::new(None::<u32>);
/// let mut subs = Subscriptions::new();
/// subs.add(selected.subscribe(|_| { /* show or hide modal */ }));
/// assert_eq!(selected.subscriber_count(), 1);
///
/// subs.teardown();
/// assert_eq!(selected.subscriber_count(), 0);
/// ```
#[derive(Default)]
pub struct Subscriptions {
    handles: Vec<Unsubscribe>,
    torn_down: bool,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a handle. After teardown the handle is released right away.
    pub fn add(&mut self, mut handle: Unsubscribe) {
        if self.torn_down {
            tracing::debug!("subscription added after teardown, releasing it");
            handle.unsubscribe();
            return;
        }
        self.handles.push(handle);
    }

    /// Number of handles waiting for teardown.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Invoke every tracked handle once.
    ///
    /// Returns how many callbacks were actually removed (handles whose signal
    /// was already dropped or cleared don't count). Later calls return 0.
    pub fn teardown(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        self.torn_down = true;

        let total = self.handles.len();
        let removed = self
            .handles
            .drain(..)
            .map(|mut handle| handle.unsubscribe())
            .filter(|removed| *removed)
            .count();
        tracing::trace!(total, removed, "subscriptions torn down");
        removed
    }
}

impl Extend<Unsubscribe> for Subscriptions {
    fn extend<I: IntoIterator<Item = Unsubscribe>>(&mut self, iter: I) {
        for handle in iter {
            self.add(handle);
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Subscriptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("len", &self.handles.len())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
