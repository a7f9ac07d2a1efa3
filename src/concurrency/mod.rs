//! Cross-process coordination for the on-disk stores.

mod store_lock;

pub use store_lock::{StoreLock, StoreLockGuard};
