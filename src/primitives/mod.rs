// ============================================================================
// catalog-signals - Primitives Module
// Signal, pending writes, and subscription handles
// ============================================================================

pub mod pending;
pub mod signal;
pub mod subscription;

// Re-export for convenience
pub use pending::PendingWrite;
pub use signal::{Signal, SignalInner, SubscriberFn};
pub use subscription::{Subscriptions, Unsubscribe};
