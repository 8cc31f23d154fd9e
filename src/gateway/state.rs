use std::sync::Arc;

use crate::account::AccountService;
use crate::locking::LockCoordinator;
use crate::store::BalanceStore;
use crate::transfer::TransferOrchestrator;

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Account pass-through operations
    pub accounts: Arc<AccountService>,
    /// Transfer orchestrator, blocking; call through `spawn_blocking`
    pub transfers: Arc<TransferOrchestrator>,
    /// The one lock coordinator of this process
    pub coordinator: Arc<LockCoordinator>,
}

impl AppState {
    pub fn new(store: Arc<dyn BalanceStore>, coordinator: Arc<LockCoordinator>) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(store.clone())),
            transfers: Arc::new(TransferOrchestrator::new(coordinator.clone(), store)),
            coordinator,
        }
    }
}
