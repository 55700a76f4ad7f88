//! Infrastructure layer: stores, notification adapters.

pub mod notifier;
pub mod store;

pub use notifier::{NoopNotifier, RecordingNotifier};
pub use store::InMemoryStockStore;
