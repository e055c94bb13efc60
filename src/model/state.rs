// ============================================================================
// catalog-signals - Application Model
// Page-lifetime state plus the backend operations that reconcile it
// ============================================================================
//
// The Model owns two signals:
//
// - `items`: the catalog list, replaced wholesale by every refresh
// - `selected_item`: what the modal is showing, `None` when it is closed
//
// Writes go to the backend first; a successful create or update is followed
// by a full refresh instead of a local patch, so the list is always a
// snapshot of server state. Concurrent refreshes are not sequenced: whichever
// finishes last decides the list.
// ============================================================================

use std::fmt;
use std::rc::Rc;

use crate::model::{BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemId, UploadedImage};
use crate::primitives::Signal;
use crate::service::{BackendService, ServiceResult};

/// What the modal is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// An existing item opened for editing.
    Item(Item),
    /// Any other modal view, identified by name (e.g. `"new-item"`).
    View(String),
}

impl Selection {
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::View(_) => None,
        }
    }
}

/// Shared application state.
///
/// Construct one per page and hand clones to every component; clones share
/// the same signals and service.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use futures::executor::block_on;
/// use catalog_signals::{Item, Model};
/// use catalog_signals::service::MemoryBackend;
///
/// let backend = Rc::new(MemoryBackend::with_items(vec![Item::new("1", "A")]));
/// let model = Model::new(backend);
///
/// block_on(model.refresh_items()).unwrap();
/// assert_eq!(model.items().get(), vec![Item::new("1", "A")]);
/// ```
#[derive(Clone)]
pub struct Model {
    items: Signal<Vec<Item>>,
    selected_item: Signal<Option<Selection>>,
    service: Rc<dyn BackendService>,
}

impl Model {
    pub fn new(service: Rc<dyn BackendService>) -> Self {
        Self {
            items: Signal::new(Vec::new()),
            selected_item: Signal::new(None),
            service,
        }
    }

    pub fn items(&self) -> &Signal<Vec<Item>> {
        &self.items
    }

    pub fn selected_item(&self) -> &Signal<Option<Selection>> {
        &self.selected_item
    }

    pub fn service(&self) -> &Rc<dyn BackendService> {
        &self.service
    }

    // =========================================================================
    // MODAL
    // =========================================================================

    pub fn open_modal(&self, view: impl Into<String>) {
        self.selected_item.set(Some(Selection::View(view.into())));
    }

    pub fn select_item(&self, item: Item) {
        self.selected_item.set(Some(Selection::Item(item)));
    }

    pub fn close_modal(&self) {
        self.selected_item.set(None);
    }

    pub fn is_modal_open(&self) -> bool {
        self.selected_item.with(Option::is_some)
    }

    // =========================================================================
    // BACKEND OPERATIONS
    // =========================================================================

    /// Re-fetch the list and replace `items` with it.
    ///
    /// On failure the current list stays as it is.
    pub async fn refresh_items(&self) -> ServiceResult<Vec<Item>> {
        tracing::debug!("refreshing items");
        match self.service.list_items().await {
            Ok(response) => {
                tracing::debug!(count = response.data.len(), "items refreshed");
                self.items.set(response.data.clone());
                Ok(response)
            }
            Err(err) => {
                tracing::error!(status = err.status(), error = %err, "failed to refresh items");
                Err(err)
            }
        }
    }

    /// Create an item, then refresh the list before returning.
    ///
    /// The refresh outcome does not affect the returned result; a failed
    /// refresh is logged and the old list kept.
    pub async fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item> {
        tracing::debug!(title = %draft.title, "creating item");
        let created = self.service.create_item(draft).await.inspect_err(|err| {
            tracing::warn!(status = err.status(), error = %err, "failed to create item");
        })?;
        let _ = self.refresh_items().await;
        Ok(created)
    }

    /// Update an item, then refresh the list before returning.
    pub async fn update_item(&self, id: &ItemId, patch: &ItemDraft) -> ServiceResult<Item> {
        tracing::debug!(%id, "updating item");
        let updated = self.service.update_item(id, patch).await.inspect_err(|err| {
            tracing::warn!(%id, status = err.status(), error = %err, "failed to update item");
        })?;
        let _ = self.refresh_items().await;
        Ok(updated)
    }

    pub async fn get_item(&self, id: &ItemId) -> ServiceResult<Item> {
        self.service.get_item(id).await.inspect_err(|err| {
            tracing::warn!(%id, status = err.status(), error = %err, "failed to load item");
        })
    }

    pub async fn upload_image(&self, file: &ImageUpload) -> ServiceResult<UploadedImage> {
        tracing::debug!(file = %file.file_name, len = file.bytes.len(), "uploading image");
        self.service.upload_image(file).await.inspect_err(|err| {
            tracing::warn!(file = %file.file_name, status = err.status(), error = %err, "failed to upload image");
        })
    }

    pub async fn delete_image(&self, id: &ImageId) -> ServiceResult<()> {
        tracing::debug!(%id, "deleting image");
        self.service.delete_image(id).await.inspect_err(|err| {
            tracing::warn!(%id, status = err.status(), error = %err, "failed to delete image");
        })
    }

    /// Backend name and version, for the footer.
    pub async fn get_version(&self) -> ServiceResult<BackendInfo> {
        self.service.get_version().await.inspect_err(|err| {
            tracing::warn!(status = err.status(), error = %err, "failed to fetch backend version");
        })
    }

    /// End of page lifetime: drop every subscriber of the Model's signals.
    pub fn teardown(&self) {
        let items = self.items.unsubscribe_all();
        let selection = self.selected_item.unsubscribe_all();
        tracing::debug!(items, selection, "model torn down");
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("items", &self.items)
            .field("selected_item", &self.selected_item)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Call, MemoryBackend, ServiceError};
    use futures::executor::block_on;
    use std::cell::RefCell;

    fn model_with(items: Vec<Item>) -> (Model, Rc<MemoryBackend>) {
        let backend = Rc::new(MemoryBackend::with_items(items));
        (Model::new(backend.clone()), backend)
    }

    #[test]
    fn starts_idle_and_empty() {
        let (model, _) = model_with(Vec::new());
        assert!(model.items().get().is_empty());
        assert!(!model.is_modal_open());
    }

    #[test]
    fn modal_transitions() {
        let (model, _) = model_with(Vec::new());
        model.open_modal("new-item");
        assert_eq!(model.selected_item().get(), Some(Selection::View("new-item".into())));

        let item = Item::new("1", "A");
        model.select_item(item.clone());
        assert_eq!(model.selected_item().get().and_then(|s| s.item().cloned()), Some(item));

        model.close_modal();
        assert!(!model.is_modal_open());
    }

    #[test]
    fn create_refreshes_before_returning() {
        let (model, backend) = model_with(Vec::new());
        let created = block_on(model.create_item(&ItemDraft::titled("Lamp"))).unwrap();

        assert_eq!(model.items().get(), vec![created.data]);
        assert_eq!(backend.calls(), vec![Call::CreateItem, Call::ListItems]);
    }

    #[test]
    fn failed_update_does_not_refresh() {
        let (model, backend) = model_with(vec![Item::new("1", "A")]);
        block_on(model.refresh_items()).unwrap();

        let err = block_on(model.update_item(&ItemId::from("2"), &ItemDraft::titled("B"))).unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(model.items().get(), vec![Item::new("1", "A")]);
        assert_eq!(backend.call_count(Call::ListItems), 1);
    }

    #[test]
    fn failed_refresh_after_write_still_returns_ok() {
        let (model, backend) = model_with(vec![Item::new("1", "A")]);
        block_on(model.refresh_items()).unwrap();

        let notified = Rc::new(RefCell::new(0));
        let _handle = {
            let notified = notified.clone();
            model.items().subscribe(move |_| *notified.borrow_mut() += 1)
        };
        backend.fail_next_call(Call::ListItems, ServiceError::timed_out());

        let updated = block_on(model.update_item(&ItemId::from("1"), &ItemDraft::titled("B")));

        assert_eq!(updated.unwrap().data.title, "B");
        assert_eq!(model.items().get()[0].title, "A");
        // Replay only; the failed refresh never wrote.
        assert_eq!(*notified.borrow(), 1);
    }

    #[test]
    fn version_passes_through_without_touching_state() {
        let (model, backend) = model_with(vec![Item::new("1", "A")]);
        let info = block_on(model.get_version()).unwrap().data;

        assert_eq!(info.name, crate::service::MEMORY_BACKEND_NAME);
        assert!(model.items().get().is_empty());
        assert_eq!(backend.calls(), vec![Call::GetVersion]);

        backend.fail_next(ServiceError::http(404, "HTTP error 404"));
        assert_eq!(block_on(model.get_version()).unwrap_err().status(), 404);
    }

    #[test]
    fn teardown_clears_subscribers() {
        let (model, _) = model_with(Vec::new());
        let _a = model.items().subscribe(|_| {});
        let _b = model.selected_item().subscribe(|_| {});
        model.teardown();
        assert_eq!(model.items().subscriber_count(), 0);
        assert_eq!(model.selected_item().subscriber_count(), 0);
    }
}
