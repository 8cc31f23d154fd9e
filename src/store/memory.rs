//! In-memory balance and record store
//!
//! Committed state lives behind one `RwLock`. A unit of work stages its
//! writes privately and applies them in a single write-locked step on
//! commit, which gives atomic multi-row commits with read-committed
//! visibility for concurrent readers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;
use tracing::debug;

use super::{BalanceStore, StoreError, UnitOfWork};
use crate::account::models::{Account, NewAccount, NewTransfer, TransferRecord};
use crate::core_types::{AccountId, TransferId};

#[derive(Debug, Default)]
struct StoreState {
    accounts: BTreeMap<AccountId, Account>,
    transfers: Vec<TransferRecord>,
}

/// Memory-resident [`BalanceStore`]
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    /// Account id sequence, first id is 1
    next_account_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            next_account_id: AtomicI64::new(1),
        }
    }

    /// Store pre-loaded with accounts of the given balances, ids 1..=n
    pub fn with_balances(balances: &[Decimal]) -> Result<Self, StoreError> {
        let store = Self::new();
        let mut unit = store.begin()?;
        for balance in balances {
            unit.insert_account(NewAccount::new(*balance))?;
        }
        unit.commit()?;
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceStore for InMemoryStore {
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, StoreError> {
        Ok(Box::new(MemoryUnitOfWork {
            store: self,
            accounts: BTreeMap::new(),
            created: Vec::new(),
            transfers: Vec::new(),
            clear_all: false,
        }))
    }

    fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    fn find_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.read()?.accounts.values().cloned().collect())
    }

    fn find_all_transfers(&self) -> Result<Vec<TransferRecord>, StoreError> {
        Ok(self.read()?.transfers.clone())
    }
}

/// Unit of work over an [`InMemoryStore`]
pub struct MemoryUnitOfWork<'a> {
    store: &'a InMemoryStore,
    /// Staged account rows (updated or created), by id
    accounts: BTreeMap<AccountId, Account>,
    /// Ids staged by `insert_account`
    created: Vec<AccountId>,
    transfers: Vec<TransferRecord>,
    clear_all: bool,
}

impl MemoryUnitOfWork<'_> {
    fn is_known(&self, id: AccountId) -> Result<bool, StoreError> {
        if self.accounts.contains_key(&id) {
            return Ok(true);
        }
        if self.clear_all {
            return Ok(false);
        }
        Ok(self.store.read()?.accounts.contains_key(&id))
    }
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        if let Some(staged) = self.accounts.get(&id) {
            return Ok(Some(staged.clone()));
        }
        if self.clear_all {
            return Ok(None);
        }
        self.store.find_account(id)
    }

    fn update_account(&mut self, account: &Account) -> Result<(), StoreError> {
        if !self.is_known(account.id)? {
            return Err(StoreError::UnknownAccount(account.id));
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
        let id = self.store.next_account_id.fetch_add(1, Ordering::SeqCst);
        let account = Account {
            id,
            reference: new.reference,
            balance: new.balance.unwrap_or_default(),
        };
        self.accounts.insert(id, account.clone());
        self.created.push(id);
        Ok(account)
    }

    fn save_transfer(&mut self, new: NewTransfer) -> Result<TransferRecord, StoreError> {
        for id in [new.origin_account_id, new.destination_account_id] {
            if !self.is_known(id)? {
                return Err(StoreError::UnknownAccount(id));
            }
        }
        let record = new.into_record(TransferId::new());
        self.transfers.push(record.clone());
        Ok(record)
    }

    fn delete_all(&mut self) -> Result<(), StoreError> {
        self.accounts.clear();
        self.created.clear();
        self.transfers.clear();
        self.clear_all = true;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let store = self.store;
        let mut state = store.write()?;
        if self.clear_all {
            state.accounts.clear();
            state.transfers.clear();
        }
        let staged = self.accounts.len();
        state.accounts.extend(self.accounts);
        state.transfers.extend(self.transfers);
        debug!(
            accounts = staged,
            created = self.created.len(),
            cleared = self.clear_all,
            "Unit of work committed"
        );
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(
            accounts = self.accounts.len(),
            transfers = self.transfers.len(),
            "Unit of work rolled back"
        );
        Ok(())
    }
}
