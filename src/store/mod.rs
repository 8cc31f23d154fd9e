//! Balance and record stores
//!
//! The transfer core only talks to storage through these traits: a
//! [`BalanceStore`] opens a [`UnitOfWork`] in which account rows are read
//! and written and transfer records are appended. Everything staged in a
//! unit becomes visible together on [`UnitOfWork::commit`], or not at all.

pub mod memory;

pub use memory::InMemoryStore;

use thiserror::Error;

use crate::account::models::{Account, NewAccount, NewTransfer, TransferRecord};
use crate::core_types::AccountId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store state is poisoned by a panicked writer")]
    Poisoned,

    #[error("Account {0} does not exist in the store")]
    UnknownAccount(AccountId),

    #[error("Unit of work failed: {0}")]
    Unit(String),
}

/// Store-side transactional scope
///
/// Dropping an unfinished unit discards everything it staged.
pub trait UnitOfWork {
    /// Read an account, seeing this unit's own staged writes first
    fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Stage the new state of an existing account
    fn update_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Stage a new account; the id is assigned immediately
    fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError>;

    /// Append a transfer record (record store)
    fn save_transfer(&mut self, new: NewTransfer) -> Result<TransferRecord, StoreError>;

    /// Stage removal of every account and transfer record
    fn delete_all(&mut self) -> Result<(), StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Account store with transactional units and an append-only record store
pub trait BalanceStore: Send + Sync {
    /// Open a unit of work
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, StoreError>;

    /// Read committed state of one account
    fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// All committed accounts, ordered by id
    fn find_all_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// All committed transfer records, in append order
    fn find_all_transfers(&self) -> Result<Vec<TransferRecord>, StoreError>;
}

/// Run `work` in a fresh unit of work: commit on success, roll back on error.
///
/// The error of `work` is returned unchanged; a failing rollback is only
/// logged. A failing commit drops the unit, which discards what it staged.
pub fn within_unit<T, E>(
    store: &dyn BalanceStore,
    work: impl FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StoreError>,
{
    let mut unit = store.begin()?;
    match work(unit.as_mut()) {
        Ok(value) => {
            unit.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = unit.rollback() {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

/// Recording store for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Wraps an [`InMemoryStore`] and counts unit-of-work lifecycle calls
    pub struct RecordingStore {
        inner: InMemoryStore,
        begin_count: AtomicUsize,
        commit_count: AtomicUsize,
        rollback_count: AtomicUsize,
        save_transfer_count: AtomicUsize,
        /// Configured behavior
        fail_save_transfer: AtomicBool,
        fail_commit: AtomicBool,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self {
                inner: InMemoryStore::new(),
                begin_count: AtomicUsize::new(0),
                commit_count: AtomicUsize::new(0),
                rollback_count: AtomicUsize::new(0),
                save_transfer_count: AtomicUsize::new(0),
                fail_save_transfer: AtomicBool::new(false),
                fail_commit: AtomicBool::new(false),
            }
        }

        pub fn inner(&self) -> &InMemoryStore {
            &self.inner
        }

        pub fn set_fail_save_transfer(&self, fail: bool) {
            self.fail_save_transfer.store(fail, Ordering::SeqCst);
        }

        /// Commit fails and the unit is dropped without being applied
        pub fn set_fail_commit(&self, fail: bool) {
            self.fail_commit.store(fail, Ordering::SeqCst);
        }

        pub fn begin_count(&self) -> usize {
            self.begin_count.load(Ordering::SeqCst)
        }

        pub fn commit_count(&self) -> usize {
            self.commit_count.load(Ordering::SeqCst)
        }

        pub fn rollback_count(&self) -> usize {
            self.rollback_count.load(Ordering::SeqCst)
        }

        pub fn save_transfer_count(&self) -> usize {
            self.save_transfer_count.load(Ordering::SeqCst)
        }
    }

    struct RecordingUnit<'a> {
        store: &'a RecordingStore,
        inner: Box<dyn UnitOfWork + 'a>,
    }

    impl UnitOfWork for RecordingUnit<'_> {
        fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
            self.inner.find_account(id)
        }

        fn update_account(&mut self, account: &Account) -> Result<(), StoreError> {
            self.inner.update_account(account)
        }

        fn insert_account(&mut self, new: NewAccount) -> Result<Account, StoreError> {
            self.inner.insert_account(new)
        }

        fn save_transfer(&mut self, new: NewTransfer) -> Result<TransferRecord, StoreError> {
            self.store.save_transfer_count.fetch_add(1, Ordering::SeqCst);
            if self.store.fail_save_transfer.load(Ordering::SeqCst) {
                return Err(StoreError::Unit("Mock save_transfer failure".to_string()));
            }
            self.inner.save_transfer(new)
        }

        fn delete_all(&mut self) -> Result<(), StoreError> {
            self.inner.delete_all()
        }

        fn commit(self: Box<Self>) -> Result<(), StoreError> {
            self.store.commit_count.fetch_add(1, Ordering::SeqCst);
            let RecordingUnit { store, inner } = *self;
            if store.fail_commit.load(Ordering::SeqCst) {
                return Err(StoreError::Unit("Mock commit failure".to_string()));
            }
            inner.commit()
        }

        fn rollback(self: Box<Self>) -> Result<(), StoreError> {
            self.store.rollback_count.fetch_add(1, Ordering::SeqCst);
            let RecordingUnit { inner, .. } = *self;
            inner.rollback()
        }
    }

    impl BalanceStore for RecordingStore {
        fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>, StoreError> {
            self.begin_count.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(RecordingUnit {
                store: self,
                inner: self.inner.begin()?,
            }))
        }

        fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
            self.inner.find_account(id)
        }

        fn find_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
            self.inner.find_all_accounts()
        }

        fn find_all_transfers(&self) -> Result<Vec<TransferRecord>, StoreError> {
            self.inner.find_all_transfers()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use rust_decimal::Decimal;

        #[test]
        fn test_recording_store_counts() {
            let store = RecordingStore::new();

            let mut unit = store.begin().unwrap();
            unit.insert_account(NewAccount::new(Decimal::ONE)).unwrap();
            unit.commit().unwrap();

            let unit = store.begin().unwrap();
            unit.rollback().unwrap();

            assert_eq!(store.begin_count(), 2);
            assert_eq!(store.commit_count(), 1);
            assert_eq!(store.rollback_count(), 1);
            assert_eq!(store.find_all_accounts().unwrap().len(), 1);
        }

        #[test]
        fn test_recording_store_failure() {
            let store = RecordingStore::new();
            store.set_fail_save_transfer(true);

            let mut unit = store.begin().unwrap();
            let new = NewTransfer {
                origin_account_id: 1,
                destination_account_id: 2,
                amount: Decimal::ONE,
                created_at: chrono::Utc::now(),
            };
            assert!(matches!(unit.save_transfer(new), Err(StoreError::Unit(_))));
            assert_eq!(store.save_transfer_count(), 1);
        }

        #[test]
        fn test_within_unit_commit_failure_discards_writes() {
            let store = RecordingStore::new();
            store.set_fail_commit(true);

            let result: Result<Account, StoreError> =
                within_unit(&store, |unit| unit.insert_account(NewAccount::new(Decimal::ONE)));

            assert!(matches!(result, Err(StoreError::Unit(_))));
            assert_eq!(store.commit_count(), 1);
            assert_eq!(store.rollback_count(), 0);
            assert!(store.find_all_accounts().unwrap().is_empty());
        }

        #[test]
        fn test_within_unit_rolls_back_on_error() {
            let store = RecordingStore::new();

            let result: Result<(), StoreError> = within_unit(&store, |unit| {
                unit.insert_account(NewAccount::new(Decimal::ONE))?;
                Err(StoreError::UnknownAccount(9))
            });

            assert_eq!(result, Err(StoreError::UnknownAccount(9)));
            assert_eq!(store.rollback_count(), 1);
            assert!(store.find_all_accounts().unwrap().is_empty());
        }
    }
}

#[cfg(test)]
pub use mock::RecordingStore;
