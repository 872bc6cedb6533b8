// ── Reactive light-state store ──
//
// Concurrent storage with push-based change notification.

mod collection;
mod light_store;

pub use light_store::LightStore;
