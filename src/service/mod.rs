// ============================================================================
// catalog-signals - Backend Service
// The contract the Model calls, plus result plumbing around it
// ============================================================================
//
// The crate never opens a socket itself. A host supplies a `BackendService`
// (usually `HttpBackend` over its own `HttpTransport`, `MemoryBackend` in
// tests) and can reuse:
//
// - `decode_response` to classify a raw `(status, body)` pair,
// - `with_deadline` / `TimeoutBackend` to apply the fixed request timeout,
// - `ServiceConfig` for the base URL and REST routes.
// ============================================================================

use async_trait::async_trait;

use crate::model::{BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemId, UploadedImage};

mod config;
mod deadline;
mod http;
mod memory;
mod result;

pub use config::{ServiceConfig, DEFAULT_TIMEOUT};
pub use deadline::{with_deadline, TimeoutBackend, TimerFn};
pub use http::{Body, HttpBackend, HttpRequest, HttpTransport, Method, RawResponse};
pub use memory::{Call, MemoryBackend, MEMORY_BACKEND_NAME};
pub use result::{
    decode_response, Response, ServiceError, ServiceResult, PRECONDITION_STATUS, TRANSPORT_STATUS,
};

/// Asynchronous catalog backend.
///
/// Every request-level failure (network, timeout, non-2xx, malformed body) is
/// returned as `Err`, never raised. A missing required argument (blank id,
/// empty file) yields `ServiceError::Precondition` before any I/O.
#[async_trait(?Send)]
pub trait BackendService {
    async fn list_items(&self) -> ServiceResult<Vec<Item>>;

    async fn get_item(&self, id: &ItemId) -> ServiceResult<Item>;

    async fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item>;

    async fn update_item(&self, id: &ItemId, patch: &ItemDraft) -> ServiceResult<Item>;

    async fn delete_image(&self, id: &ImageId) -> ServiceResult<()>;

    async fn upload_image(&self, file: &ImageUpload) -> ServiceResult<UploadedImage>;

    /// Name and version of the backend.
    async fn get_version(&self) -> ServiceResult<BackendInfo>;
}
