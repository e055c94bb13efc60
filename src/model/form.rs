// ============================================================================
// catalog-signals - Item Form
// Field-level state for the new/edit item editor
// ============================================================================
//
// Each field is its own signal so inputs can bind to exactly one of them.
// Text fields are whole-value `Signal`s; the image list is a
// `CollectionSignal` because uploads and removals arrive one at a time.
//
// The form remembers which images the edited item already had, so cancelling
// can delete only the images uploaded during this edit.
// ============================================================================

use futures::future::join_all;

use crate::collections::CollectionSignal;
use crate::model::{ImageId, ImageUpload, Item, ItemDraft, ItemId, Model, UploadedImage};
use crate::primitives::Signal;
use crate::service::ServiceResult;

/// Title shown in a blank "new item" form.
pub const NEW_ITEM_TITLE: &str = "New";

/// Title used when editing an item that has none.
pub const UNTITLED: &str = "Untitled";

/// Split comma-separated tag text into trimmed, non-empty tags.
///
/// # Example
///
/// ```
/// use catalog_signals::model::parse_tags;
///
/// assert_eq!(parse_tags(" lamp, ,brass "), vec!["lamp", "brass"]);
/// ```
pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Editor state for creating a new item or editing an existing one.
#[derive(Debug, Clone)]
pub struct ItemForm {
    model: Model,
    id: Option<ItemId>,
    original_images: Vec<ImageId>,
    pub title: Signal<String>,
    pub description: Signal<String>,
    pub tags: Signal<String>,
    pub images: CollectionSignal<ImageId>,
}

impl ItemForm {
    /// A blank form that creates a new item on submit.
    pub fn new(model: &Model) -> Self {
        Self {
            model: model.clone(),
            id: None,
            original_images: Vec::new(),
            title: Signal::new(NEW_ITEM_TITLE.to_owned()),
            description: Signal::new(String::new()),
            tags: Signal::new(String::new()),
            images: CollectionSignal::new(),
        }
    }

    /// A form pre-filled from `item` that updates it on submit.
    pub fn edit(model: &Model, item: &Item) -> Self {
        let title = if item.title.is_empty() {
            UNTITLED.to_owned()
        } else {
            item.title.clone()
        };
        Self {
            model: model.clone(),
            id: Some(item.id.clone()),
            original_images: item.images.clone(),
            title: Signal::new(title),
            description: Signal::new(item.description.clone()),
            tags: Signal::new(item.tags.join(",")),
            images: CollectionSignal::from_vec(item.images.clone()),
        }
    }

    /// Id of the item being edited, `None` for a new item.
    pub fn id(&self) -> Option<&ItemId> {
        self.id.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Current field values as a draft.
    pub fn draft(&self) -> ItemDraft {
        ItemDraft {
            title: self.title.get(),
            description: self.description.get(),
            images: self.images.get(),
            tags: self.tags.with(|text| parse_tags(text)),
        }
    }

    /// Images attached during this edit.
    pub fn uploaded_images(&self) -> Vec<ImageId> {
        self.images.with(|images| {
            images
                .iter()
                .filter(|id| !self.original_images.contains(id))
                .cloned()
                .collect()
        })
    }

    // =========================================================================
    // IMAGES
    // =========================================================================

    /// Upload a file and attach the resulting image.
    pub async fn upload(&self, file: &ImageUpload) -> ServiceResult<UploadedImage> {
        let uploaded = self.model.upload_image(file).await?;
        self.images.add(uploaded.data.id.clone());
        Ok(uploaded)
    }

    /// Detach an image from the form. The stored file is left alone.
    pub fn remove_image(&self, id: &ImageId) -> bool {
        self.images.remove(id)
    }

    /// Delete every image uploaded during this edit.
    ///
    /// Returns how many deletions succeeded; failures are logged.
    pub async fn discard_uploads(&self) -> usize {
        let ids = self.uploaded_images();
        let results = join_all(ids.iter().map(|id| self.model.delete_image(id))).await;

        let mut deleted = 0;
        for (id, result) in ids.iter().zip(&results) {
            match result {
                Ok(_) => {
                    deleted += 1;
                    tracing::debug!(%id, "discarded uploaded image");
                }
                Err(err) => tracing::warn!(%id, error = %err, "could not discard uploaded image"),
            }
        }
        deleted
    }

    // =========================================================================
    // SUBMIT / CANCEL
    // =========================================================================

    /// Create or update the item.
    ///
    /// On success the modal is closed and the form destroyed. On failure both
    /// stay open so the user can retry or cancel.
    pub async fn submit(&self) -> ServiceResult<Item> {
        let draft = self.draft();
        let result = match &self.id {
            Some(id) => self.model.update_item(id, &draft).await,
            None => self.model.create_item(&draft).await,
        };
        if result.is_ok() {
            self.close();
        }
        result
    }

    /// Throw away uploads from this edit, then close.
    pub async fn cancel(&self) {
        self.discard_uploads().await;
        self.close();
    }

    /// Release every subscriber bound to the form's fields.
    pub fn destroy(&self) {
        self.title.unsubscribe_all();
        self.description.unsubscribe_all();
        self.tags.unsubscribe_all();
        self.images.unsubscribe_all();
    }

    fn close(&self) {
        self.model.close_modal();
        self.destroy();
    }
}
