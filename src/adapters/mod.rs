// Adapters layer: concrete implementations for external systems (monitor storage, outbound http).

pub mod http;
pub mod storage;

pub use http::HttpProber;
pub use storage::{open_store, JsonFileStore, MemoryStore};
