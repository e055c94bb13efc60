// ============================================================================
// catalog-signals - Reactive State for an Item Catalog
// ============================================================================
//
// Signals with replay-on-subscribe, delta-only collection signals, explicit
// subscription teardown, and a Model that keeps the catalog list in step with
// a backend through refresh-after-write.
//
// Everything is single-threaded (`Rc`/`RefCell`); async work runs on a local
// executor supplied by the host.
// ============================================================================

pub mod collections;
pub mod core;
pub mod model;
pub mod primitives;
pub mod service;

// Re-export the view-facing surface at crate root
pub use collections::{CollectionSignal, Delta, DeltaKind};
pub use crate::core::SubscriberId;
pub use model::{
    BackendInfo, ImageId, ImageUpload, Item, ItemDraft, ItemForm, ItemId, Model, Selection, UploadedImage,
};
pub use primitives::{PendingWrite, Signal, Subscriptions, Unsubscribe};
pub use service::{BackendService, Response, ServiceError, ServiceResult};

// =============================================================================
// TESTS
// =============================================================================
