//! Account-level locking
//!
//! # Architecture
//!
//! A process-wide [`LockCoordinator`] maps each account involved in a
//! transfer to a lock entry (lock + reference count). A transfer asks for a
//! [`LockingSession`] over its two accounts, enters it right before the
//! balance mutation and releases it in a guaranteed cleanup step.
//!
//! ```text
//! acquire_session(a, b) ── registry guard ──▶ retain(low), retain(high)
//!        │
//!   session.enter()      ── blocks ─────────▶ lock(low) then lock(high)
//!        │
//! release_session(a, b)  ── registry guard ──▶ release(high), release(low)
//!                                              (entry dropped at count 0)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Canonical Order**: locks are always taken lower account id first,
//!    so no two sessions can wait on each other in a cycle
//! 2. **Counted Lifetime**: an entry's count is never below the number of
//!    sessions holding or waiting for its lock
//! 3. **Single Authority**: one coordinator per running system

pub mod coordinator;
pub mod error;
pub mod session;

pub use coordinator::{LockCoordinator, canonical_pair};
pub use error::LockError;
pub use session::LockingSession;
