//! Account management module
//!
//! Account and transfer-record models plus the pass-through account
//! operations.

pub mod models;
pub mod service;

// Re-export commonly used types
pub use models::{Account, NewAccount, NewTransfer, TransferRecord};
pub use service::AccountService;
