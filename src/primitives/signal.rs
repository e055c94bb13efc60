// ============================================================================
// catalog-signals - Signal Primitive
// A single value cell with replay-on-subscribe change notification
// ============================================================================

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use crate::core::subscribers::{Detach, SubscriberId, SubscriberList};
use crate::primitives::pending::PendingWrite;
use crate::primitives::subscription::Unsubscribe;

/// Callback type stored by a `Signal<T>`.
pub type SubscriberFn<T> = dyn Fn(&T);

// =============================================================================
// SIGNAL INNER (the data behind Signal<T>)
// =============================================================================

/// The shared state of a signal.
///
/// Every write takes a sequence number from `issued` when it is issued;
/// `visible` holds the sequence of the write whose value is currently stored.
/// Writes are applied in completion order, so `visible` can move backwards
/// when a slow pending write finishes after a newer one.
pub struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: SubscriberList<SubscriberFn<T>>,
    issued: Cell<u64>,
    visible: Cell<u64>,
}

impl<T> SignalInner<T> {
    fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            subscribers: SubscriberList::new(),
            issued: Cell::new(0),
            visible: Cell::new(0),
        }
    }

    /// Take the next write sequence number.
    pub(crate) fn issue(&self) -> u64 {
        let sequence = self.issued.get() + 1;
        self.issued.set(sequence);
        sequence
    }

    /// Store `value` as the result of write `sequence` and notify.
    pub(crate) fn write(&self, sequence: u64, value: T)
    where
        T: Clone,
    {
        let previous = self.visible.replace(sequence);
        if sequence < previous {
            tracing::debug!(
                sequence,
                previous,
                "stale write completed last and overrides a newer value"
            );
        }
        // The old value is dropped only after the borrow is released.
        let _old = self.value.replace(value);
        self.notify();
    }

    fn notify(&self)
    where
        T: Clone,
    {
        // Each subscriber gets a fresh clone of the stored value, so one that
        // runs after a nested write sees that write rather than the old value.
        let delivered = self.subscribers.for_each_live(|subscriber| {
            let value = self.value.borrow().clone();
            subscriber(&value);
        });
        tracing::trace!(delivered, sequence = self.visible.get(), "signal notified");
    }
}

impl<T> Detach for SignalInner<T> {
    fn detach(&self, id: SubscriberId) -> bool {
        self.subscribers.remove(id)
    }
}

// =============================================================================
// SIGNAL<T> - The public signal handle
// =============================================================================

/// A reactive cell holding a value of type `T`.
///
/// - `subscribe` calls the new subscriber once with the current value before
///   returning (replay-on-subscribe).
/// - `set` stores the value and notifies every subscriber, in subscription
///   order, before returning. There is no equality check: every write notifies.
/// - `set_pending` defers a write until a future resolves; outstanding writes
///   land in completion order, so the last one to complete wins.
///
/// Cloning a `Signal` clones the handle; all clones share one value.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use catalog_signals::Signal;
///
/// let title = Signal::new(String::from("New"));
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let sink = seen.clone();
/// let _handle = title.subscribe(move |t: &String| sink.borrow_mut().push(t.clone()));
/// title.set(String::from("Lamp"));
///
/// assert_eq!(*seen.borrow(), vec!["New", "Lamp"]);
/// ```
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner::new(value)),
        }
    }

    /// Get the current value (cloning). No side effects.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Access the current value with a closure (avoids cloning).
    ///
    /// The closure must not write this signal.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_signals::Signal;
    ///
    /// let tags = Signal::new(vec!["lamp", "brass"]);
    /// assert_eq!(tags.with(|t| t.len()), 2);
    /// ```
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store a value and notify every subscriber before returning.
    ///
    /// A subscriber may call `set` again; the nested write notifies
    /// synchronously, then the outer notification resumes with the value
    /// stored now, so every subscriber ends on the latest value.
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        let sequence = self.inner.issue();
        self.inner.write(sequence, value);
    }

    /// Mutate the value in place, then notify.
    ///
    /// The closure must not read or write this signal.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_signals::Signal;
    ///
    /// let tags = Signal::new(vec![String::from("lamp")]);
    /// tags.update(|t| t.push(String::from("brass")));
    /// assert_eq!(tags.get().len(), 2);
    /// ```
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        let sequence = self.inner.issue();
        f(&mut self.inner.value.borrow_mut());
        self.inner.visible.set(sequence);
        self.inner.notify();
    }

    /// Defer a write until `computation` resolves.
    ///
    /// The value is unchanged and nobody is notified until then. The returned
    /// `PendingWrite` is a future that must be awaited or spawned on the local
    /// executor; it resolves after the value has been stored and subscribers
    /// notified. Abort it through its `AbortHandle` to drop the write.
    ///
    /// # Example
    ///
    /// ```
    /// use futures::executor::block_on;
    /// use catalog_signals::Signal;
    ///
    /// let count = Signal::new(0);
    /// let write = count.set_pending(async { 42 });
    /// assert_eq!(count.get(), 0);
    ///
    /// block_on(write).unwrap();
    /// assert_eq!(count.get(), 42);
    /// ```
    pub fn set_pending<F>(&self, computation: F) -> PendingWrite
    where
        T: Clone + 'static,
        F: Future<Output = T> + 'static,
    {
        let sequence = self.inner.issue();
        tracing::debug!(sequence, "pending write issued");
        PendingWrite::new(Rc::downgrade(&self.inner), sequence, computation)
    }

    /// Register a subscriber.
    ///
    /// The subscriber is called once with the current value before this
    /// returns, then once per write. Keep the returned handle to unsubscribe.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Unsubscribe
    where
        T: Clone + 'static,
    {
        let subscriber: Rc<SubscriberFn<T>> = Rc::new(f);
        let id = self.inner.subscribers.insert(subscriber.clone());

        let current = self.get();
        subscriber(&current);

        let source: Weak<dyn Detach> = Rc::downgrade(&self.inner) as Weak<dyn Detach>;
        Unsubscribe::new(source, id)
    }

    /// Remove every subscriber.
    ///
    /// Meant for page or form teardown; components release their own
    /// subscriptions through their handles instead. Returns the number removed.
    pub fn unsubscribe_all(&self) -> usize {
        let removed = self.inner.subscribers.clear();
        tracing::trace!(removed, "signal subscribers cleared");
        removed
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Sequence number of the write whose value is currently visible.
    ///
    /// 0 until the first write lands.
    pub fn sequence(&self) -> u64 {
        self.inner.visible.get()
    }

    /// Whether both handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
