//! Mutex-wrapped handle for hosts that touch the cache from several threads.

use std::sync::{Arc, Mutex, MutexGuard};

use super::display_info::{ClearReason, DisplayInfoCache};

/// Cloneable handle to one [`DisplayInfoCache`].
///
/// Every operation takes the lock for its whole duration, so compound
/// updates across the tables are never interleaved.
pub struct SharedDisplayInfoCache<M> {
    inner: Arc<Mutex<DisplayInfoCache<M>>>,
}

impl<M> Clone for SharedDisplayInfoCache<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> SharedDisplayInfoCache<M> {
    pub fn new(cache: DisplayInfoCache<M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Run `f` with exclusive access to the cache.
    pub fn with<R>(&self, f: impl FnOnce(&mut DisplayInfoCache<M>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    pub fn clear_cache(&self) {
        self.lock().clear_cache();
    }

    pub fn clear_for(&self, reason: ClearReason) {
        self.lock().clear_for(reason);
    }

    // The cache holds plain data, so a panic mid-operation leaves nothing
    // worse than a partially filled table.
    fn lock(&self) -> MutexGuard<'_, DisplayInfoCache<M>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
