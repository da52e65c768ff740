//! Result and bundle caches.
/// Two-tier bundle cache
pub mod persistent;
/// Bounded cache of resolved strings
pub mod result;
/// Durable storage backends
pub mod storage;

pub use persistent::PersistentBundleCache;
pub use result::{
    CacheStats,
    ResultCache,
};
pub use storage::{
    FileStorage,
    KeyValueStorage,
    MemoryStorage,
    StorageKind,
    open_storage,
};
