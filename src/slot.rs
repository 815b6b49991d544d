//! Caller-visible storage for option values
//!
//! A [`Slot`] is created by the caller and handed to the registry at
//! registration time. From then on only the registry writes to it; the caller
//! keeps a clone for reading.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

pub struct Slot<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Slot<T> {
    pub fn new(initial: T) -> Self {
        Self { inner: Arc::new(RwLock::new(initial)) }
    }

    /// Borrow the current value without cloning it.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when both handles refer to the same storage.
    pub fn same_as(&self, other: &Slot<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn set(&self, value: T) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> T {
        self.read().clone()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Slot;

    #[test]
    fn clones_share_storage() {
        let slot = Slot::new(4i64);
        let reader = slot.clone();
        slot.set(7);
        assert_eq!(reader.get(), 7);
        assert!(reader.same_as(&slot));
    }

    #[test]
    fn distinct_slots_are_not_the_same() {
        let a: Slot<String> = Slot::default();
        let b: Slot<String> = Slot::default();
        assert!(!a.same_as(&b));
        assert_eq!(*a.read(), "");
    }
}
