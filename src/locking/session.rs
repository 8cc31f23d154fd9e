//! Account locks and the two-lock locking session

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

use super::error::LockError;
use crate::core_types::AccountId;

#[derive(Debug, Clone, Copy)]
struct Holder {
    thread: ThreadId,
    depth: usize,
}

/// Per-account mutual-exclusion primitive
///
/// Owner-tracking and reentrant: the holding thread may enter again, and
/// only the holding thread may unlock. An unlock from any other thread is
/// reported as [`LockError::NotHeld`] instead of corrupting the lock.
#[derive(Debug)]
pub(crate) struct AccountLock {
    account_id: AccountId,
    holder: Mutex<Option<Holder>>,
    released: Condvar,
}

impl AccountLock {
    pub(crate) fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            holder: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    pub(crate) fn account_id(&self) -> AccountId {
        self.account_id
    }

    fn holder(&self) -> MutexGuard<'_, Option<Holder>> {
        self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the lock is free (or already ours), then take it.
    pub(crate) fn acquire(&self, timeout: Option<Duration>) -> Result<(), LockError> {
        let me = thread::current().id();
        let busy = |h: &mut Option<Holder>| matches!(h, Some(holder) if holder.thread != me);

        let guard = self.holder();
        let mut guard = match timeout {
            None => self
                .released
                .wait_while(guard, busy)
                .unwrap_or_else(PoisonError::into_inner),
            Some(limit) => {
                let (mut guard, _) = self
                    .released
                    .wait_timeout_while(guard, limit, busy)
                    .unwrap_or_else(PoisonError::into_inner);
                if busy(&mut *guard) {
                    return Err(LockError::Timeout {
                        account_id: self.account_id,
                        waited: limit,
                    });
                }
                guard
            }
        };

        match guard.as_mut() {
            Some(holder) => holder.depth += 1,
            None => *guard = Some(Holder { thread: me, depth: 1 }),
        }
        Ok(())
    }

    /// Give back one level of ownership held by the calling thread.
    pub(crate) fn release(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut guard = self.holder();
        match guard.as_mut() {
            Some(holder) if holder.thread == me => {
                holder.depth -= 1;
                if holder.depth == 0 {
                    *guard = None;
                    self.released.notify_one();
                }
                Ok(())
            }
            _ => Err(LockError::NotHeld(self.account_id)),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        self.holder().is_some()
    }
}

/// Pair of account locks in canonical (ascending account id) order
///
/// Obtained from [`LockCoordinator::acquire_session`](super::LockCoordinator::acquire_session)
/// and handed back through
/// [`LockCoordinator::release_session`](super::LockCoordinator::release_session).
/// Two sessions over the same pair compare equal whatever order the
/// accounts were given in, because they wrap the very same lock objects.
#[derive(Debug)]
pub struct LockingSession {
    first: Arc<AccountLock>,
    second: Arc<AccountLock>,
    wait_timeout: Option<Duration>,
}

impl LockingSession {
    pub(crate) fn new(
        first: Arc<AccountLock>,
        second: Arc<AccountLock>,
        wait_timeout: Option<Duration>,
    ) -> Self {
        debug_assert!(first.account_id() < second.account_id());
        Self {
            first,
            second,
            wait_timeout,
        }
    }

    /// Take both locks, lower account id first.
    ///
    /// Blocks until both are held. With a configured wait timeout, a lock
    /// that stays busy past the bound fails the call and the first lock is
    /// given back if it had been taken.
    pub fn enter(&self) -> Result<(), LockError> {
        self.first.acquire(self.wait_timeout)?;
        if let Err(e) = self.second.acquire(self.wait_timeout) {
            if let Err(undo) = self.first.release() {
                tracing::warn!(error = %undo, "Failed to undo half-entered session");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Account ids in canonical order
    pub fn accounts(&self) -> (AccountId, AccountId) {
        (self.first.account_id(), self.second.account_id())
    }

    #[cfg(test)]
    pub(crate) fn locks(&self) -> (&AccountLock, &AccountLock) {
        (&*self.first, &*self.second)
    }
}

impl PartialEq for LockingSession {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.first, &other.first) && Arc::ptr_eq(&self.second, &other.second)
    }
}

impl Eq for LockingSession {}
