//! Account-to-account Transfers
//!
//! Moves money between two accounts of the balance store under the
//! account-pair lock handed out by the [`LockCoordinator`](crate::locking::LockCoordinator).
//!
//! # State Machine
//!
//! ```text
//! VALIDATING → LOCK_ACQUIRED → TRANSACTION_OPEN → MUTATED → RECORD_PERSISTED → COMMITTED
//!                    ↓                ↓              ↓              ↓              ↓
//!                    └────────────────┴─── ABORTED ──┴──────────────┘              │
//!                                             ↓                                   │
//!                                       LOCKS_RELEASED ←──────────────────────────┘
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Validate First**: bad arguments fail before any lock or unit of work is taken
//! 2. **Rollback Before Release**: a failed unit is rolled back while the pair is still held
//! 3. **Always Release**: the locking session is handed back on every exit path
//! 4. **Errors Unchanged**: the caller sees the original failure, never a rollback error

pub mod orchestrator;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use orchestrator::TransferOrchestrator;
pub use state::TransferState;
pub use types::{TransferRequest, ValidatedTransfer};
