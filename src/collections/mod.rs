// ============================================================================
// catalog-signals - Reactive Collections
// Ordered sequences with delta-only change notification
// ============================================================================
//
// A CollectionSignal is deliberately a different type from Signal<Vec<T>>:
//
// 1. Signal<Vec<T>> - whole-value replace, replays the full list on subscribe
// 2. CollectionSignal<T> - incremental add/remove, one Delta per mutation,
//    no replay
//
// List-level state that is refreshed wholesale uses the former; field-level
// state edited one element at a time (a form's image list) uses the latter.
// ============================================================================

mod collection;
mod delta;

pub use collection::{CollectionSignal, DeltaFn};
pub use delta::{Delta, DeltaKind};
