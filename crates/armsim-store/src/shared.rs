use std::sync::{Arc, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::store::ResourceStore;

/// A [`ResourceStore`] shared between threads.
///
/// Each closure runs under one lock acquisition, so a lookup chain plus the
/// mutation and stamping that follow it are observed atomically by other
/// callers.
#[derive(Clone, Debug, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<ResourceStore>>,
}

impl SharedStore {
    pub fn new(store: ResourceStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&ResourceStore) -> R) -> StoreResult<R> {
        let guard = self
            .inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(f(&guard))
    }

    /// Run `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut ResourceStore) -> R) -> StoreResult<R> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(f(&mut guard))
    }

    /// Recover the store if this is the last handle.
    pub fn try_into_inner(self) -> Result<ResourceStore, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => lock
                .into_inner()
                .map_err(|e| Self::new(e.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}
