// ============================================================================
// catalog-signals - Observer List
// Ordered subscriber storage and type-erased detach for every signal type
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

// =============================================================================
// SUBSCRIBER ID
// =============================================================================

/// Identifies one registration inside a `SubscriberList`.
///
/// Ids are never reused within a list, so a stale handle can never remove a
/// registration made after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// DETACH - type-erased removal
// =============================================================================
//
// An `Unsubscribe` handle must be able to remove its callback without knowing
// the value type of the signal it came from. Signals and collection signals
// implement `Detach`, and handles hold a `Weak<dyn Detach>` so a forgotten
// handle never keeps a signal alive.
// =============================================================================

/// Type-erased removal of one registration.
pub trait Detach {
    /// Remove the registration with this id.
    ///
    /// Returns false if it was already removed (or cleared).
    fn detach(&self, id: SubscriberId) -> bool;
}

// =============================================================================
// SUBSCRIBER LIST
// =============================================================================

/// An ordered list of callbacks keyed by `SubscriberId`.
///
/// Delivery walks a snapshot of the list and re-checks membership before each
/// call (collect-then-check), so callbacks can subscribe, unsubscribe, or
/// write to the owning signal while a notification is in progress without
/// hitting a `RefCell` borrow panic:
///
/// - a callback removed mid-notification is not called afterwards,
/// - a callback added mid-notification is not called by that notification.
pub struct SubscriberList<F: ?Sized> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(SubscriberId, Rc<F>)>>,
}

impl<F: ?Sized> SubscriberList<F> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Append a callback, returning its id.
    pub fn insert(&self, callback: Rc<F>) -> SubscriberId {
        let id = SubscriberId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    /// Remove one callback. Returns false if the id is not registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        // The removed callback is dropped after the borrow is released:
        // dropping captured state may itself detach from this list.
        let removed = {
            let mut entries = self.entries.borrow_mut();
            entries
                .iter()
                .position(|(entry, _)| *entry == id)
                .map(|index| entries.remove(index))
        };
        removed.is_some()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries.borrow().iter().any(|(entry, _)| *entry == id)
    }

    /// Remove every callback, returning how many were registered.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.borrow_mut());
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Clone out the current registrations in subscription order.
    pub fn snapshot(&self) -> Vec<(SubscriberId, Rc<F>)> {
        self.entries
            .borrow()
            .iter()
            .map(|(id, callback)| (*id, callback.clone()))
            .collect()
    }

    /// Call `deliver` once for every callback that was registered when the
    /// call started and is still registered when its turn comes.
    ///
    /// Returns the number of callbacks that were invoked.
    pub fn for_each_live(&self, mut deliver: impl FnMut(&F)) -> usize {
        let mut delivered = 0;
        for (id, callback) in self.snapshot() {
            if self.contains(id) {
                deliver(&callback);
                delivered += 1;
            }
        }
        delivered
    }
}

impl<F: ?Sized> Default for SubscriberList<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for SubscriberList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Callback = dyn Fn(&i32);

    fn recorder(log: &Rc<RefCell<Vec<(char, i32)>>>, tag: char) -> Rc<Callback> {
        let log = log.clone();
        Rc::new(move |v: &i32| log.borrow_mut().push((tag, *v)))
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let list: SubscriberList<Callback> = SubscriberList::new();
        let a = list.insert(Rc::new(|_: &i32| {}));
        let b = list.insert(Rc::new(|_: &i32| {}));
        assert!(a < b);

        assert!(list.remove(a));
        let c = list.insert(Rc::new(|_: &i32| {}));
        assert_ne!(a, c);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn remove_is_idempotent() {
        let list: SubscriberList<Callback> = SubscriberList::new();
        let id = list.insert(Rc::new(|_: &i32| {}));

        assert!(list.remove(id));
        assert!(!list.remove(id));
        assert!(list.is_empty());
    }

    #[test]
    fn delivers_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list: SubscriberList<Callback> = SubscriberList::new();
        list.insert(recorder(&log, 'a'));
        list.insert(recorder(&log, 'b'));
        list.insert(recorder(&log, 'c'));

        let delivered = list.for_each_live(|f| f(&7));

        assert_eq!(delivered, 3);
        assert_eq!(*log.borrow(), vec![('a', 7), ('b', 7), ('c', 7)]);
    }

    #[test]
    fn removal_during_delivery_skips_the_removed_callback() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list: Rc<SubscriberList<Callback>> = Rc::new(SubscriberList::new());
        let victim = Rc::new(Cell::new(None));

        let killer: Rc<Callback> = {
            let list = list.clone();
            let victim = victim.clone();
            Rc::new(move |_: &i32| {
                if let Some(id) = victim.get() {
                    list.remove(id);
                }
            })
        };
        list.insert(killer);
        victim.set(Some(list.insert(recorder(&log, 'v'))));

        let delivered = list.for_each_live(|f| f(&1));

        assert_eq!(delivered, 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn insertion_during_delivery_waits_for_next_round() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let list: Rc<SubscriberList<Callback>> = Rc::new(SubscriberList::new());

        let adder: Rc<Callback> = {
            let list = list.clone();
            let log = log.clone();
            Rc::new(move |_: &i32| {
                list.insert(recorder(&log, 'n'));
            })
        };
        list.insert(adder);

        list.for_each_live(|f| f(&1));
        assert!(log.borrow().is_empty());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn clear_reports_count() {
        let list: SubscriberList<Callback> = SubscriberList::new();
        list.insert(Rc::new(|_: &i32| {}));
        list.insert(Rc::new(|_: &i32| {}));

        assert_eq!(list.clear(), 2);
        assert_eq!(list.clear(), 0);
    }
}
