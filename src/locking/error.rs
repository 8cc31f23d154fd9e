//! Locking Error Types

use std::time::Duration;

use thiserror::Error;

use crate::core_types::AccountId;

/// Errors raised by the lock coordinator and its sessions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// A session needs two distinct accounts
    #[error("Cannot lock account {0} against itself")]
    SameAccount(AccountId),

    /// Bounded wait expired before the account lock became free
    #[error("Timed out after {waited:?} waiting for the lock of account {account_id}")]
    Timeout {
        account_id: AccountId,
        waited: Duration,
    },

    /// Unlock requested by a thread that does not hold the lock.
    ///
    /// Never propagated to transfer callers: the coordinator logs and
    /// counts it instead.
    #[error("Account {0} lock is not held by the calling thread")]
    NotHeld(AccountId),
}

impl LockError {
    /// Get the error code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            LockError::SameAccount(_) => "LOCK_SAME_ACCOUNT",
            LockError::Timeout { .. } => "LOCK_TIMEOUT",
            LockError::NotHeld(_) => "LOCK_NOT_HELD",
        }
    }
}
