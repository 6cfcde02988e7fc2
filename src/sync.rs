//! Poison recovery for the std locks guarding in-memory settings
//!
//! A panic while a store mutation holds the lock must not make the store
//! unusable, so guards are taken back from the poison error with a warning.

use crate::error::Result;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Extension trait for Mutex with poison recovery
pub trait MutexExt<T> {
    /// Lock the mutex, recovering from poison errors
    fn lock_recovered(&self) -> Result<MutexGuard<'_, T>>;
}

/// Extension trait for RwLock with poison recovery
pub trait RwLockExt<T> {
    /// Acquire a read lock, recovering from poison errors
    fn read_recovered(&self) -> Result<RwLockReadGuard<'_, T>>;

    /// Acquire a write lock, recovering from poison errors
    fn write_recovered(&self) -> Result<RwLockWriteGuard<'_, T>>;
}

impl<T> MutexExt<T> for Mutex<T> {
    fn lock_recovered(&self) -> Result<MutexGuard<'_, T>> {
        Ok(self.lock().unwrap_or_else(|poisoned| {
            log::warn!("Connection mutex was poisoned, recovering");
            poisoned.into_inner()
        }))
    }
}

impl<T> RwLockExt<T> for RwLock<T> {
    fn read_recovered(&self) -> Result<RwLockReadGuard<'_, T>> {
        Ok(self.read().unwrap_or_else(|poisoned| {
            log::warn!("Settings lock was poisoned (read), recovering");
            poisoned.into_inner()
        }))
    }

    fn write_recovered(&self) -> Result<RwLockWriteGuard<'_, T>> {
        Ok(self.write().unwrap_or_else(|poisoned| {
            log::warn!("Settings lock was poisoned (write), recovering");
            poisoned.into_inner()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_recovers_poisoned_rwlock() {
        let lock = Arc::new(RwLock::new(1));
        let clone = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = clone.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(lock.is_poisoned());
        *lock.write_recovered().unwrap() += 1;
        assert_eq!(*lock.read_recovered().unwrap(), 2);
    }
}
