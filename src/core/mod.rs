// ============================================================================
// catalog-signals - Core Module
// Observer bookkeeping shared by every signal type
// ============================================================================

pub mod subscribers;

pub use subscribers::{Detach, SubscriberId, SubscriberList};
