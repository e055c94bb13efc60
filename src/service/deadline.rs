// ============================================================================
// catalog-signals - Request Deadlines
// A fixed timeout for backend calls, independent of the timer in use
// ============================================================================
//
// The crate does not own a timer. Hosts hand in a function that turns a
// `Duration` into a future that completes when it elapses (a browser
// `setTimeout`, a tokio sleep, a test gate...). `with_deadline` races a call
// against such a future and `TimeoutBackend` applies it to every call of a
// wrapped service.
// ============================================================================

use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{select, Either, LocalBoxFuture};

use super::config::ServiceConfig;
use super::result::{ServiceError, ServiceResult};
use super::BackendService;
use crate::model::{BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemId, UploadedImage};

/// Race `call` against `deadline`.
///
/// If the deadline completes first the call is dropped (aborting whatever it
/// was waiting on) and a transport error with status 0 is returned.
///
/// # Example
///
/// ```
/// use futures::executor::block_on;
/// use futures::future::{pending, ready};
/// use catalog_signals::service::{with_deadline, Response, ServiceResult};
///
/// let slow = pending::<ServiceResult<u32>>();
/// let err = block_on(with_deadline(slow, ready(()))).unwrap_err();
/// assert_eq!(err.status(), 0);
///
/// let fast = ready(Ok(Response::ok(1)));
/// assert!(block_on(with_deadline(fast, pending())).is_ok());
/// ```
pub async fn with_deadline<T, C, D>(call: C, deadline: D) -> ServiceResult<T>
where
    C: Future<Output = ServiceResult<T>>,
    D: Future<Output = ()>,
{
    let call = pin!(call);
    let deadline = pin!(deadline);
    match select(call, deadline).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => {
            tracing::warn!("backend call exceeded its deadline");
            Err(ServiceError::timed_out())
        }
    }
}

/// Builds the deadline future for one call.
pub type TimerFn = dyn Fn(Duration) -> LocalBoxFuture<'static, ()>;

// =============================================================================
// TIMEOUT BACKEND
// =============================================================================

/// Wraps a `BackendService` so every call is subject to the configured timeout.
pub struct TimeoutBackend<B> {
    inner: B,
    timeout: Duration,
    timer: Rc<TimerFn>,
}

impl<B: BackendService> TimeoutBackend<B> {
    pub fn new(
        inner: B,
        config: &ServiceConfig,
        timer: impl Fn(Duration) -> LocalBoxFuture<'static, ()> + 'static,
    ) -> Self {
        Self {
            inner,
            timeout: config.timeout,
            timer: Rc::new(timer),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    async fn guarded<T>(&self, call: impl Future<Output = ServiceResult<T>>) -> ServiceResult<T> {
        with_deadline(call, (self.timer)(self.timeout)).await
    }
}

#[async_trait(?Send)]
impl<B: BackendService> BackendService for TimeoutBackend<B> {
    async fn list_items(&self) -> ServiceResult<Vec<Item>> {
        self.guarded(self.inner.list_items()).await
    }

    async fn get_item(&self, id: &ItemId) -> ServiceResult<Item> {
        self.guarded(self.inner.get_item(id)).await
    }

    async fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item> {
        self.guarded(self.inner.create_item(draft)).await
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemDraft) -> ServiceResult<Item> {
        self.guarded(self.inner.update_item(id, patch)).await
    }

    async fn delete_image(&self, id: &ImageId) -> ServiceResult<()> {
        self.guarded(self.inner.delete_image(id)).await
    }

    async fn upload_image(&self, file: &ImageUpload) -> ServiceResult<UploadedImage> {
        self.guarded(self.inner.upload_image(file)).await
    }

    async fn get_version(&self) -> ServiceResult<BackendInfo> {
        self.guarded(self.inner.get_version()).await
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryBackend;
    use futures::executor::block_on;
    use futures::future::{self, FutureExt};

    fn never(_: Duration) -> LocalBoxFuture<'static, ()> {
        future::pending().boxed_local()
    }

    fn immediately(_: Duration) -> LocalBoxFuture<'static, ()> {
        future::ready(()).boxed_local()
    }

    #[test]
    fn call_finishing_first_wins() {
        let backend = TimeoutBackend::new(
            MemoryBackend::with_items(vec![Item::new("1", "A")]),
            &ServiceConfig::default(),
            never,
        );
        let items = block_on(backend.list_items()).unwrap();
        assert_eq!(items.data.len(), 1);
    }

    #[test]
    fn elapsed_deadline_is_a_transport_error() {
        let backend = TimeoutBackend::new(MemoryBackend::new(), &ServiceConfig::default(), immediately);
        // The memory backend answers on first poll, so race it against a
        // call that never completes instead.
        let err = block_on(backend.guarded(future::pending::<ServiceResult<()>>())).unwrap_err();
        assert_eq!(err, ServiceError::timed_out());
        assert!(err.is_transport());
    }

    #[test]
    fn timer_receives_configured_timeout() {
        let seen = Rc::new(std::cell::Cell::new(Duration::ZERO));
        let config = ServiceConfig::default().with_timeout(Duration::from_millis(750));
        let backend = {
            let seen = seen.clone();
            TimeoutBackend::new(MemoryBackend::new(), &config, move |d| {
                seen.set(d);
                future::pending().boxed_local()
            })
        };

        block_on(backend.list_items()).unwrap();
        assert_eq!(seen.get(), Duration::from_millis(750));
        assert_eq!(backend.timeout(), Duration::from_millis(750));
    }
}
