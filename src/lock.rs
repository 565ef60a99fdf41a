//! The reader-writer lock guarding a table.
//!
//! `loom` model tests swap the standard lock for the `loom` one; both report poisoning through
//! [`LockResult`](std::sync::LockResult).

#[cfg(feature = "loom")]
pub(crate) use loom::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use std::sync::PoisonError;

/// Acquires a shared lock.
///
/// A table is structurally valid at every point where user code can panic, therefore a
/// poisoned lock is recovered instead of being propagated.
#[inline]
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        log::warn!("recovering a poisoned table lock for reading");
        PoisonError::into_inner(poisoned)
    })
}

/// Acquires an exclusive lock.
#[inline]
pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        log::warn!("recovering a poisoned table lock for writing");
        PoisonError::into_inner(poisoned)
    })
}
