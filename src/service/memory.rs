// ============================================================================
// catalog-signals - In-Memory Backend
// A BackendService kept entirely in process, for tests and offline hosts
// ============================================================================
//
// Validation mirrors the REST backend: a blank title is a 400, an unknown id
// is a 404 "key not found", and blank ids or empty uploads are rejected
// before the store is touched. `fail_next` queues errors that the next calls
// return instead of doing any work.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};

use async_trait::async_trait;
use chrono::Utc;

use super::result::{Response, ServiceError, ServiceResult};
use super::BackendService;
use crate::model::{BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemId, UploadedImage};

/// Name reported by `MemoryBackend::get_version`.
pub const MEMORY_BACKEND_NAME: &str = "memory";

/// Which `BackendService` method was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ListItems,
    GetItem,
    CreateItem,
    UpdateItem,
    DeleteImage,
    UploadImage,
    GetVersion,
}

/// A `BackendService` backed by plain in-memory collections.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: RefCell<Vec<Item>>,
    images: RefCell<BTreeSet<ImageId>>,
    next_id: Cell<u64>,
    failures: RefCell<VecDeque<(Option<Call>, ServiceError)>>,
    calls: RefCell<Vec<Call>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose store starts with `items`.
    pub fn with_items(items: Vec<Item>) -> Self {
        let backend = Self::new();
        backend.images.borrow_mut().extend(
            items
                .iter()
                .flat_map(|item| item.images.iter().cloned()),
        );
        *backend.items.borrow_mut() = items;
        backend
    }

    /// Make the next call (of any kind) fail with `error`.
    ///
    /// Errors queue up: calling this twice fails the next two calls.
    pub fn fail_next(&self, error: ServiceError) {
        self.failures.borrow_mut().push_back((None, error));
    }

    /// Make the next call of kind `call` fail with `error`; other calls
    /// pass through.
    pub fn fail_next_call(&self, call: Call, error: ServiceError) {
        self.failures.borrow_mut().push_back((Some(call), error));
    }

    /// Snapshot of the stored items.
    pub fn items(&self) -> Vec<Item> {
        self.items.borrow().clone()
    }

    /// Ids of the stored images, sorted.
    pub fn images(&self) -> Vec<ImageId> {
        self.images.borrow().iter().cloned().collect()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, call: Call) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    fn begin(&self, call: Call) -> Result<(), ServiceError> {
        self.calls.borrow_mut().push(call);
        let mut failures = self.failures.borrow_mut();
        let queued = failures
            .iter()
            .position(|(target, _)| target.is_none_or(|target| target == call))
            .and_then(|index| failures.remove(index));
        match queued {
            Some((_, err)) => {
                tracing::debug!(?call, error = %err, "memory backend failing call on request");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn generate(&self, prefix: &str) -> String {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        format!("{prefix}-{n}")
    }

    fn validate(draft: &ItemDraft) -> Result<(), ServiceError> {
        if draft.title.trim().is_empty() {
            return Err(ServiceError::http(400, "title is required"));
        }
        Ok(())
    }

    fn require_id(id: &str) -> Result<(), ServiceError> {
        if id.trim().is_empty() {
            return Err(ServiceError::precondition("ID is required"));
        }
        Ok(())
    }
}

fn not_found() -> ServiceError {
    ServiceError::http(404, "key not found")
}

#[async_trait(?Send)]
impl BackendService for MemoryBackend {
    async fn list_items(&self) -> ServiceResult<Vec<Item>> {
        self.begin(Call::ListItems)?;
        Ok(Response::ok(self.items()))
    }

    async fn get_item(&self, id: &ItemId) -> ServiceResult<Item> {
        Self::require_id(id.as_str())?;
        self.begin(Call::GetItem)?;
        self.items
            .borrow()
            .iter()
            .find(|item| item.id == *id)
            .cloned()
            .map(Response::ok)
            .ok_or_else(not_found)
    }

    async fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item> {
        self.begin(Call::CreateItem)?;
        Self::validate(draft)?;

        let now = Utc::now();
        let item = Item {
            id: ItemId::new(self.generate("item")),
            title: draft.title.clone(),
            description: draft.description.clone(),
            images: draft.images.clone(),
            tags: draft.tags.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        tracing::debug!(id = %item.id, "memory backend created item");
        self.items.borrow_mut().push(item.clone());
        Ok(Response::new(item, 201))
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemDraft) -> ServiceResult<Item> {
        Self::require_id(id.as_str())?;
        self.begin(Call::UpdateItem)?;
        Self::validate(patch)?;

        let mut items = self.items.borrow_mut();
        let item = items
            .iter_mut()
            .find(|item| item.id == *id)
            .ok_or_else(not_found)?;
        item.title = patch.title.clone();
        item.description = patch.description.clone();
        item.images = patch.images.clone();
        item.tags = patch.tags.clone();
        item.updated_at = Some(Utc::now());
        Ok(Response::ok(item.clone()))
    }

    async fn delete_image(&self, id: &ImageId) -> ServiceResult<()> {
        Self::require_id(id.as_str())?;
        self.begin(Call::DeleteImage)?;
        if self.images.borrow_mut().remove(id) {
            Ok(Response::new((), 204))
        } else {
            Err(not_found())
        }
    }

    async fn upload_image(&self, file: &ImageUpload) -> ServiceResult<UploadedImage> {
        if file.is_empty() {
            return Err(ServiceError::precondition("File is required"));
        }
        self.begin(Call::UploadImage)?;
        let id = ImageId::new(self.generate("img"));
        self.images.borrow_mut().insert(id.clone());
        Ok(Response::new(UploadedImage { id }, 201))
    }

    async fn get_version(&self) -> ServiceResult<BackendInfo> {
        self.begin(Call::GetVersion)?;
        Ok(Response::ok(BackendInfo {
            name: MEMORY_BACKEND_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }))
    }
}
