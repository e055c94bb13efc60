// ============================================================================
// catalog-signals - CollectionSignal
// An ordered sequence that reports only incremental add/remove deltas
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use super::delta::Delta;
use crate::core::subscribers::{Detach, SubscriberId, SubscriberList};
use crate::primitives::subscription::Unsubscribe;

/// Callback type stored by a `CollectionSignal<T>`.
pub type DeltaFn<T> = dyn Fn(&Delta<T>);

// =============================================================================
// COLLECTION INNER
// =============================================================================

struct CollectionInner<T> {
    items: RefCell<Vec<T>>,
    listeners: SubscriberList<DeltaFn<T>>,
    /// Deltas produced while another delta is being delivered.
    pending: RefCell<VecDeque<Delta<T>>>,
    emitting: Cell<bool>,
}

impl<T> CollectionInner<T> {
    /// Deliver `delta` to every listener.
    ///
    /// A mutation made by a listener queues its delta behind the one being
    /// delivered, so every listener sees deltas in mutation order.
    fn emit(&self, delta: Delta<T>) {
        self.pending.borrow_mut().push_back(delta);
        if self.emitting.replace(true) {
            tracing::trace!("collection delta queued behind delivery in progress");
            return;
        }

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(delta) = next else { break };
            let delivered = self.listeners.for_each_live(|listener| listener(&delta));
            tracing::trace!(kind = ?delta.kind(), delivered, "collection delta emitted");
        }
        self.emitting.set(false);
    }
}

impl<T> Detach for CollectionInner<T> {
    fn detach(&self, id: SubscriberId) -> bool {
        self.listeners.remove(id)
    }
}

// =============================================================================
// COLLECTION SIGNAL
// =============================================================================

/// A reactive ordered sequence with per-element change notification.
///
/// Unlike `Signal`, a collection never sends its full contents to listeners:
///
/// - every `add` / successful `remove` emits exactly one `Delta`,
/// - `subscribe_delta` does **not** replay existing elements; call `get()`
///   first to render the initial contents,
/// - `remove` drops the first element equal to the value; removing an absent
///   value emits nothing, even if equal values appear elsewhere,
/// - `get()` returns an independent copy,
/// - a listener may mutate the collection; the resulting delta is delivered
///   to everyone after the current one, keeping the stream in mutation order.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use catalog_signals::{CollectionSignal, Delta};
///
/// let images: CollectionSignal<&str> = CollectionSignal::from_vec(vec!["a.png"]);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = seen.clone();
/// let _handle = images.subscribe_delta(move |d| sink.borrow_mut().push(d.clone()));
///
/// images.add("b.png");
/// images.remove(&"a.png");
/// images.remove(&"missing.png");
///
/// assert_eq!(*seen.borrow(), vec![Delta::Add("b.png"), Delta::Remove("a.png")]);
/// assert_eq!(images.get(), vec!["b.png"]);
/// ```
pub struct CollectionSignal<T> {
    inner: Rc<CollectionInner<T>>,
}

impl<T> CollectionSignal<T> {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create a collection from an existing vec.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                items: RefCell::new(items),
                listeners: SubscriberList::new(),
                pending: RefCell::new(VecDeque::new()),
                emitting: Cell::new(false),
            }),
        }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// A copy of the current contents.
    pub fn get(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.inner.items.borrow().clone()
    }

    /// Access the contents with a closure (avoids cloning).
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.inner.items.borrow().contains(value)
    }

    // =========================================================================
    // MUTATE
    // =========================================================================

    /// Append a value and emit `Delta::Add`.
    pub fn add(&self, value: T)
    where
        T: Clone,
    {
        self.inner.items.borrow_mut().push(value.clone());
        self.inner.emit(Delta::Add(value));
    }

    /// Remove the first element equal to `value` and emit `Delta::Remove`.
    ///
    /// Returns false (and emits nothing) if no element matched.
    pub fn remove(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            items
                .iter()
                .position(|item| item == value)
                .map(|index| items.remove(index))
        };

        match removed {
            Some(removed) => {
                self.inner.emit(Delta::Remove(removed));
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // SUBSCRIBE
    // =========================================================================

    /// Register a delta listener. No replay of existing elements.
    pub fn subscribe_delta(&self, f: impl Fn(&Delta<T>) + 'static) -> Unsubscribe
    where
        T: 'static,
    {
        let listener: Rc<DeltaFn<T>> = Rc::new(f);
        let id = self.inner.listeners.insert(listener);

        let source: Weak<dyn Detach> = Rc::downgrade(&self.inner) as Weak<dyn Detach>;
        Unsubscribe::new(source, id)
    }

    /// Remove every delta listener, returning how many were removed.
    pub fn unsubscribe_all(&self) -> usize {
        self.inner.listeners.clear()
    }

    /// Number of currently registered delta listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Whether both handles point at the same collection.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for CollectionSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for CollectionSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for CollectionSignal<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: fmt::Debug> fmt::Debug for CollectionSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSignal")
            .field("items", &*self.inner.items.borrow())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
