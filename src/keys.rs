use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::any_map::AnyMap;

/// The per-request key/value store.
///
/// This is the only state of a [`Ctx`](crate::ctx::Ctx) that may be touched
/// from more than one task at a time, so every access goes through a single
/// reader/writer lock. Writers take it exclusively, readers share it.
///
/// Values are handed out as clones: a reference into the map cannot outlive
/// the lock guard.
#[derive(Default)]
pub struct Keys {
    inner: RwLock<AnyMap>,
}

impl Keys {
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(AnyMap::new()),
        }
    }

    // A panic while the lock is held can only come from a value's `Clone` or
    // `Drop`; the map itself is still consistent, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, AnyMap> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AnyMap> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites `key`.
    pub fn set<T: Clone + Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.write().insert(key, value);
    }

    /// Returns a clone of the value under `key`.
    ///
    /// A value stored with a different type is reported as absent.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.read().get::<T>(key).cloned()
    }

    /// Like [`get`](Self::get), but panics when the key is absent.
    ///
    /// Meant for keys that an earlier, mandatory middleware is known to set.
    pub fn must_get<T: Clone + 'static>(&self, key: &str) -> T {
        match self.get(key) {
            Some(value) => value,
            None => panic!("Key \"{key}\" does not exist!"),
        }
    }

    /// Removes `key` if it holds a `T`; a value of another type is kept.
    pub fn remove<T: 'static>(&self, key: &str) -> Option<T> {
        self.write().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Materializes an independent store holding the same entries.
    ///
    /// The read lock is released before this returns; the two stores share no
    /// mutable state afterwards.
    pub fn snapshot(&self) -> Keys {
        let map = self.read().clone();
        Keys {
            inner: RwLock::new(map),
        }
    }
}

impl std::fmt::Debug for Keys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Keys").field(&*self.read()).finish()
    }
}
