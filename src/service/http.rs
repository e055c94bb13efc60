// ============================================================================
// catalog-signals - HTTP Backend
// `BackendService` over the catalog REST routes, generic over the transport
// ============================================================================
//
// `HttpBackend` builds requests from `ServiceConfig` routes, encodes drafts as
// JSON and classifies every response with `decode_response`. Moving bytes is
// left to an `HttpTransport` the host provides (fetch, a native client, a
// canned transport in tests).
// ============================================================================

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::ServiceConfig;
use super::result::{decode_response, Response, ServiceError, ServiceResult};
use super::BackendService;
use crate::model::{BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemId, UploadedImage};

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    /// Serialized JSON, sent with `Content-Type: application/json`.
    Json(String),
    /// A multipart form with the file under the `file` field.
    File(ImageUpload),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: Body::Empty,
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

/// Status and body text of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Any response, 2xx or not, is `Ok`. `Err` is reserved for exchanges that
/// produced no response and should be a `ServiceError::Transport`.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, ServiceError>;
}

// =============================================================================
// HTTP BACKEND
// =============================================================================

pub struct HttpBackend<C> {
    config: ServiceConfig,
    transport: C,
}

impl<C: HttpTransport> HttpBackend<C> {
    pub fn new(config: ServiceConfig, transport: C) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    async fn exchange<T: DeserializeOwned>(&self, request: HttpRequest) -> ServiceResult<T> {
        tracing::debug!(method = ?request.method, url = %request.url, "backend request");
        let response = self.transport.send(request).await.inspect_err(|err| {
            tracing::warn!(error = %err, "backend request failed without a response");
        })?;
        decode_response(response.status, &response.body)
    }
}

fn json_body(draft: &ItemDraft) -> Result<Body, ServiceError> {
    serde_json::to_string(draft)
        .map(Body::Json)
        .map_err(|err| ServiceError::precondition(format!("invalid item: {err}")))
}

fn require_id(blank: bool) -> Result<(), ServiceError> {
    if blank {
        return Err(ServiceError::precondition("ID is required"));
    }
    Ok(())
}

/// The REST backend answers writes with an empty body; fall back to the
/// submitted fields under `id`.
fn item_or_draft(id: ItemId, draft: &ItemDraft) -> impl FnOnce(Option<Item>) -> Item + '_ {
    move |item| {
        item.unwrap_or_else(|| Item {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            images: draft.images.clone(),
            tags: draft.tags.clone(),
            created_at: None,
            updated_at: None,
        })
    }
}

#[async_trait(?Send)]
impl<C: HttpTransport> BackendService for HttpBackend<C> {
    async fn list_items(&self) -> ServiceResult<Vec<Item>> {
        let listed: Response<Option<Vec<Item>>> = self
            .exchange(HttpRequest::new(Method::Get, self.config.items_url()))
            .await?;
        Ok(listed.map(Option::unwrap_or_default))
    }

    async fn get_item(&self, id: &ItemId) -> ServiceResult<Item> {
        require_id(id.is_blank())?;
        self.exchange(HttpRequest::new(Method::Get, self.config.item_url(id)))
            .await
    }

    async fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item> {
        let request =
            HttpRequest::new(Method::Post, self.config.items_url()).with_body(json_body(draft)?);
        let created: Response<Option<Item>> = self.exchange(request).await?;
        Ok(created.map(item_or_draft(ItemId::new(""), draft)))
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemDraft) -> ServiceResult<Item> {
        require_id(id.is_blank())?;
        let request =
            HttpRequest::new(Method::Put, self.config.item_url(id)).with_body(json_body(patch)?);
        let updated: Response<Option<Item>> = self.exchange(request).await?;
        Ok(updated.map(item_or_draft(id.clone(), patch)))
    }

    async fn delete_image(&self, id: &ImageId) -> ServiceResult<()> {
        require_id(id.is_blank())?;
        let deleted: Response<Value> = self
            .exchange(HttpRequest::new(Method::Delete, self.config.image_url(id)))
            .await?;
        Ok(deleted.map(drop))
    }

    async fn upload_image(&self, file: &ImageUpload) -> ServiceResult<UploadedImage> {
        if file.is_empty() {
            return Err(ServiceError::precondition("File is required"));
        }
        let request = HttpRequest::new(Method::Post, self.config.upload_url())
            .with_body(Body::File(file.clone()));
        self.exchange(request).await
    }

    async fn get_version(&self) -> ServiceResult<BackendInfo> {
        self.exchange(HttpRequest::new(Method::Get, self.config.version_url()))
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
