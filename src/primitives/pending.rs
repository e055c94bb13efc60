// ============================================================================
// catalog-signals - Pending Writes
// Cancellable deferred writes for Signal::set_pending
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Weak;
use std::task::{Context, Poll};

use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture};
use futures::FutureExt;

use crate::primitives::signal::SignalInner;

/// A write that lands when its computation resolves.
///
/// Created by `Signal::set_pending`. Drive it by awaiting it or spawning it
/// on a local executor. It resolves to `Ok(())` once the value has been
/// stored and subscribers notified (or once it finds its signal dropped), and
/// to `Err(Aborted)` if it was aborted first.
///
/// Dropping an un-driven `PendingWrite` drops the write as well.
#[must_use = "a pending write does nothing unless it is awaited or spawned"]
pub struct PendingWrite {
    sequence: u64,
    handle: AbortHandle,
    task: LocalBoxFuture<'static, Result<(), Aborted>>,
}

impl PendingWrite {
    pub(crate) fn new<T, F>(target: Weak<SignalInner<T>>, sequence: u64, computation: F) -> Self
    where
        T: Clone + 'static,
        F: Future<Output = T> + 'static,
    {
        let (handle, registration) = AbortHandle::new_pair();
        let computation = Abortable::new(computation, registration);

        let task = async move {
            let value = computation.await?;
            match target.upgrade() {
                Some(signal) => {
                    tracing::debug!(sequence, "pending write resolved");
                    signal.write(sequence, value);
                }
                None => tracing::debug!(sequence, "pending write resolved after its signal was dropped"),
            }
            Ok::<(), Aborted>(())
        }
        .boxed_local();

        Self {
            sequence,
            handle,
            task,
        }
    }

    /// The write sequence number this write was issued with.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// A handle that can cancel this write from elsewhere.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.clone()
    }

    /// Cancel the write. Has no effect once the value has landed.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.handle.is_aborted()
    }
}

impl Future for PendingWrite {
    type Output = Result<(), Aborted>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.task.as_mut().poll(cx)
    }
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("sequence", &self.sequence)
            .field("aborted", &self.handle.is_aborted())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
