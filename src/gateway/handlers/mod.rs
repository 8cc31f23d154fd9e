//! HTTP handlers

pub mod account;
pub mod health;
pub mod helpers;
pub mod transfer;

pub use account::{clean_all, create_account, get_account, list_accounts};
pub use health::health_check;
pub use transfer::{create_transfer, list_transfers, transfer_by_path};
