// ============================================================================
// catalog-signals - Model Layer
// Catalog records, the page-lifetime Model, and the item editor form
// ============================================================================

mod form;
mod item;
mod state;

pub use form::{parse_tags, ItemForm, NEW_ITEM_TITLE, UNTITLED};
pub use item::{BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemId, UploadedImage};
pub use state::{Model, Selection};
