//! Stock record stores.

pub mod in_memory;

pub use in_memory::InMemoryStockStore;
