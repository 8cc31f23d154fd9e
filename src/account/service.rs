//! Account pass-through operations
//!
//! Thin wrappers over the [`BalanceStore`] with the same validation
//! pattern as transfers. No locking is involved.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::models::{Account, NewAccount};
use crate::core_types::AccountId;
use crate::error::{ParameterCondition, ServiceError};
use crate::store::{BalanceStore, within_unit};

pub struct AccountService {
    store: Arc<dyn BalanceStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn BalanceStore>) -> Self {
        Self { store }
    }

    /// Returns the account identified by `id`
    pub fn get_account(&self, id: Option<AccountId>) -> Result<Account, ServiceError> {
        let id =
            id.ok_or_else(|| ServiceError::bad_parameter("accountId", ParameterCondition::NotNull))?;
        self.store
            .find_account(id)?
            .ok_or(ServiceError::AccountNotFound { account_id: id })
    }

    /// Create an account, returning it with its store-assigned id
    pub fn create_account(&self, new: NewAccount) -> Result<Account, ServiceError> {
        let balance = new
            .balance
            .ok_or_else(|| ServiceError::bad_parameter("balance", ParameterCondition::NotNull))?;
        if balance < Decimal::ZERO {
            return Err(ServiceError::bad_parameter(
                "balance",
                ParameterCondition::NonNegative,
            ));
        }

        let account = within_unit(self.store.as_ref(), |unit| {
            Ok::<_, ServiceError>(unit.insert_account(new)?)
        })?;
        info!(account_id = account.id, balance = %account.balance, "Account created");
        Ok(account)
    }

    /// All accounts known by the system
    pub fn list_accounts(&self) -> Result<Vec<Account>, ServiceError> {
        Ok(self.store.find_all_accounts()?)
    }

    /// Delete every transfer record and account. Meant for test resets.
    ///
    /// Not coordinated with the account locks: a transfer committing after
    /// this call writes its two account rows back into the emptied store.
    pub fn clean_all(&self) -> Result<(), ServiceError> {
        within_unit(self.store.as_ref(), |unit| Ok::<_, ServiceError>(unit.delete_all()?))?;
        info!("Store cleaned");
        Ok(())
    }
}
