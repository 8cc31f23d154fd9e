//! Transfer FSM State Definitions
//!
//! One transfer walks these states inside a single call. They are not
//! persisted; the orchestrator logs every transition.

use std::fmt;

/// Transfer FSM States
///
/// Success path: `VALIDATING → LOCK_ACQUIRED → TRANSACTION_OPEN → MUTATED →
/// RECORD_PERSISTED → COMMITTED → LOCKS_RELEASED`.
/// Any failure after `LOCK_ACQUIRED` goes through `ABORTED`, then
/// `LOCKS_RELEASED`. A session that could not be entered within the lock
/// wait timeout goes straight from `VALIDATING` to `LOCKS_RELEASED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Request arguments are being checked; nothing is held yet
    Validating,

    /// Locking session acquired and entered, both account locks held
    LockAcquired,

    /// Unit of work opened against the balance store
    TransactionOpen,

    /// Both balances updated inside the unit
    Mutated,

    /// Transfer record staged inside the unit
    RecordPersisted,

    /// Unit committed, balances and record visible
    Committed,

    /// Unit rolled back (or never opened), failure propagated to the caller
    Aborted,

    /// Terminal: locking session handed back to the coordinator
    LocksReleased,
}

impl TransferState {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::LocksReleased)
    }

    /// Check if the account locks are held in this state
    #[inline]
    pub fn holds_locks(&self) -> bool {
        matches!(
            self,
            TransferState::LockAcquired
                | TransferState::TransactionOpen
                | TransferState::Mutated
                | TransferState::RecordPersisted
                | TransferState::Committed
                | TransferState::Aborted
        )
    }

    /// Check whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        match (self, next) {
            (Validating, LockAcquired) => true,
            (LockAcquired, TransactionOpen) => true,
            (TransactionOpen, Mutated) => true,
            (Mutated, RecordPersisted) => true,
            (RecordPersisted, Committed) => true,
            (Committed, LocksReleased) | (Aborted, LocksReleased) => true,
            // Entering the session timed out
            (Validating, LocksReleased) => true,
            (LockAcquired | TransactionOpen | Mutated | RecordPersisted, Aborted) => true,
            _ => false,
        }
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Validating => "VALIDATING",
            TransferState::LockAcquired => "LOCK_ACQUIRED",
            TransferState::TransactionOpen => "TRANSACTION_OPEN",
            TransferState::Mutated => "MUTATED",
            TransferState::RecordPersisted => "RECORD_PERSISTED",
            TransferState::Committed => "COMMITTED",
            TransferState::Aborted => "ABORTED",
            TransferState::LocksReleased => "LOCKS_RELEASED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
