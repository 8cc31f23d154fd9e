//! Transfer Orchestrator
//!
//! Runs one transfer end-to-end on the calling thread:
//! validate, lock the account pair, mutate both balances and append the
//! record inside one unit of work, then release the pair.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::state::TransferState;
use super::types::{TransferRequest, ValidatedTransfer};
use crate::account::models::{NewTransfer, TransferRecord};
use crate::core_types::AccountId;
use crate::error::ServiceError;
use crate::locking::LockCoordinator;
use crate::store::{BalanceStore, UnitOfWork, within_unit};

/// Hands the locking session back to the coordinator when dropped, so the
/// pair is released on every exit path, panics included.
struct SessionGuard<'a> {
    coordinator: &'a LockCoordinator,
    origin: AccountId,
    destination: AccountId,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.coordinator
            .release_session(self.origin, self.destination);
    }
}

/// Per-call state tracker; every transition is logged at debug level
struct TransferFsm {
    state: TransferState,
    origin: AccountId,
    destination: AccountId,
}

impl TransferFsm {
    fn new(transfer: &ValidatedTransfer) -> Self {
        Self {
            state: TransferState::Validating,
            origin: transfer.origin,
            destination: transfer.destination,
        }
    }

    fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transfer transition {} -> {}",
            self.state,
            next
        );
        debug!(
            origin = self.origin,
            destination = self.destination,
            from = %self.state,
            state = %next,
            "Transfer state transition"
        );
        self.state = next;
    }
}

/// Transfer orchestrator
///
/// Holds the process-wide [`LockCoordinator`] and the balance store. Clone
/// the `Arc`s, never build a second coordinator for the same store.
pub struct TransferOrchestrator {
    coordinator: Arc<LockCoordinator>,
    store: Arc<dyn BalanceStore>,
}

impl TransferOrchestrator {
    pub fn new(coordinator: Arc<LockCoordinator>, store: Arc<dyn BalanceStore>) -> Self {
        Self { coordinator, store }
    }

    pub fn coordinator(&self) -> &Arc<LockCoordinator> {
        &self.coordinator
    }

    /// Move `amount` from the origin account to the destination account.
    ///
    /// Blocks while another transfer holds either account. Returns the
    /// committed record. Any failure is returned unchanged after the unit
    /// of work (if opened) has been rolled back and the pair released.
    pub fn transfer(&self, request: &TransferRequest) -> Result<TransferRecord, ServiceError> {
        let transfer = request.validate()?;
        let ValidatedTransfer {
            origin,
            destination,
            amount,
        } = transfer;
        info!(origin, destination, amount = %amount, "Transfer requested");

        let mut fsm = TransferFsm::new(&transfer);
        let session = self.coordinator.acquire_session(origin, destination)?;
        let guard = SessionGuard {
            coordinator: &self.coordinator,
            origin,
            destination,
        };

        let result = match session.enter() {
            Ok(()) => {
                fsm.advance(TransferState::LockAcquired);
                let result = self.run_unit(&transfer, &mut fsm);
                if result.is_err() {
                    fsm.advance(TransferState::Aborted);
                }
                result
            }
            Err(e) => Err(e.into()),
        };

        drop(guard);
        fsm.advance(TransferState::LocksReleased);

        match &result {
            Ok(record) => info!(
                origin,
                destination,
                amount = %amount,
                transfer_id = %record.id,
                "Transfer committed"
            ),
            Err(e) => info!(
                origin,
                destination,
                amount = %amount,
                code = e.code(),
                error = %e,
                "Transfer failed"
            ),
        }
        result
    }

    /// All committed transfer records
    pub fn list_transfers(&self) -> Result<Vec<TransferRecord>, ServiceError> {
        Ok(self.store.find_all_transfers()?)
    }

    /// Open the unit, apply the transfer, commit; roll back on failure
    fn run_unit(
        &self,
        transfer: &ValidatedTransfer,
        fsm: &mut TransferFsm,
    ) -> Result<TransferRecord, ServiceError> {
        let record = within_unit(self.store.as_ref(), |unit| {
            fsm.advance(TransferState::TransactionOpen);
            Self::apply(unit, transfer, fsm).inspect_err(|e| {
                error!(
                    origin = transfer.origin,
                    destination = transfer.destination,
                    state = %fsm.state,
                    error = %e,
                    "Rolling back transfer"
                );
            })
        })?;
        fsm.advance(TransferState::Committed);
        Ok(record)
    }

    fn apply(
        unit: &mut dyn UnitOfWork,
        transfer: &ValidatedTransfer,
        fsm: &mut TransferFsm,
    ) -> Result<TransferRecord, ServiceError> {
        let mut origin = unit
            .find_account(transfer.origin)?
            .ok_or(ServiceError::AccountNotFound {
                account_id: transfer.origin,
            })?;
        if !origin.can_cover(transfer.amount) {
            return Err(ServiceError::InsufficientFunds {
                account_id: origin.id,
                current_funds: origin.balance,
            });
        }
        let mut destination = unit
            .find_account(transfer.destination)?
            .ok_or(ServiceError::AccountNotFound {
                account_id: transfer.destination,
            })?;

        origin.balance = origin.balance.checked_sub(transfer.amount).ok_or(
            ServiceError::BalanceOverflow {
                account_id: origin.id,
            },
        )?;
        destination.balance = destination
            .balance
            .checked_add(transfer.amount)
            .ok_or(ServiceError::BalanceOverflow {
                account_id: destination.id,
            })?;
        unit.update_account(&origin)?;
        unit.update_account(&destination)?;
        fsm.advance(TransferState::Mutated);

        let record = unit.save_transfer(NewTransfer::now(&origin, &destination, transfer.amount))?;
        fsm.advance(TransferState::RecordPersisted);
        Ok(record)
    }
}
