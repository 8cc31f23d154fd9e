//! Account Transfer Service
//!
//! Moves money between accounts held in a balance store, serializing
//! transfers that share an account through reference-counted account locks.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (AccountId, TransferId)
//! - [`locking`] - Account lock coordinator and locking sessions
//! - [`account`] - Account and transfer-record models, account operations
//! - [`store`] - Balance store traits and the in-memory store
//! - [`transfer`] - Transfer orchestrator and its state machine
//! - [`error`] - Service error taxonomy
//! - [`gateway`] - HTTP surface (axum)
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing subscriber set-up

// Core types - must be first!
pub mod core_types;

pub mod account;
pub mod error;
pub mod locking;
pub mod store;
pub mod transfer;

// Service surface
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use account::{Account, AccountService, NewAccount, TransferRecord};
pub use core_types::{AccountId, TransferId};
pub use error::{ErrorKind, ParameterCondition, ServiceError};
pub use locking::{LockCoordinator, LockError, LockingSession};
pub use store::{BalanceStore, InMemoryStore, StoreError, UnitOfWork};
pub use transfer::{TransferOrchestrator, TransferRequest, TransferState};
