//! Lock Coordinator
//!
//! Serializes access to pairs of accounts without deadlock, and keeps the
//! number of live locks bounded by the number of accounts currently
//! involved in a transfer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::error::LockError;
use super::session::{AccountLock, LockingSession};
use crate::core_types::AccountId;

/// Registry slot: the account lock plus the number of sessions referencing it
struct LockEntry {
    lock: Arc<AccountLock>,
    ref_count: usize,
}

type Registry = FxHashMap<AccountId, LockEntry>;

/// Order an account pair ascending by id
#[inline]
pub fn canonical_pair(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Account-level lock coordinator
///
/// Locking is done with in-memory structures, so a running system must
/// share exactly ONE coordinator across every code path that can start a
/// transfer (inject it as `Arc<LockCoordinator>`). Two coordinators in the
/// same process hand out unrelated locks for the same account and the
/// race protection is gone.
///
/// An account that takes part in several transfers (running or waiting)
/// has a single lock entry whose reference count tracks those transfers.
/// When the last one releases, the entry is dropped from the registry.
pub struct LockCoordinator {
    registry: Mutex<Registry>,
    wait_timeout: Option<Duration>,
    release_anomalies: AtomicU64,
}

impl LockCoordinator {
    /// Create a coordinator whose sessions wait for locks without bound
    pub fn new() -> Self {
        Self::with_wait_timeout(None)
    }

    /// Create a coordinator whose sessions give up entering after `wait_timeout`
    pub fn with_wait_timeout(wait_timeout: Option<Duration>) -> Self {
        Self {
            registry: Mutex::new(FxHashMap::default()),
            wait_timeout,
            release_anomalies: AtomicU64::new(0),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or reuse the locks of both accounts and wrap them in a session.
    ///
    /// Only the registry bookkeeping is synchronized here; the account locks
    /// themselves are taken by [`LockingSession::enter`].
    pub fn acquire_session(
        &self,
        a: AccountId,
        b: AccountId,
    ) -> Result<LockingSession, LockError> {
        if a == b {
            return Err(LockError::SameAccount(a));
        }
        let (low, high) = canonical_pair(a, b);

        let (first, second) = {
            let mut registry = self.registry();
            (
                Self::retain(&mut registry, low),
                Self::retain(&mut registry, high),
            )
        };

        debug!(low, high, "Locking session acquired");
        Ok(LockingSession::new(first, second, self.wait_timeout))
    }

    /// Hand back the session of an account pair.
    ///
    /// MUST be called once per [`acquire_session`](Self::acquire_session),
    /// whether the transfer succeeded or not, or the entries leak.
    /// Accounts are processed higher id first. Releasing a pair that holds
    /// no entry, or unlocking a lock the calling thread does not hold, is
    /// logged and counted in [`release_anomalies`](Self::release_anomalies)
    /// but never raised.
    ///
    /// A second release of the same pair still decrements the entries. While
    /// another session references the pair, that takes the count below the
    /// number of live sessions: the entry can be removed under a holder, and
    /// the next acquire creates a fresh lock for the same account.
    pub fn release_session(&self, a: AccountId, b: AccountId) {
        if a == b {
            self.record_anomaly(a, "release requested for a single-account pair");
            return;
        }
        let (low, high) = canonical_pair(a, b);

        let mut registry = self.registry();
        self.release_one(&mut registry, high);
        self.release_one(&mut registry, low);
        drop(registry);

        debug!(low, high, "Locking session released");
    }

    fn retain(registry: &mut Registry, account_id: AccountId) -> Arc<AccountLock> {
        let entry = registry.entry(account_id).or_insert_with(|| LockEntry {
            lock: Arc::new(AccountLock::new(account_id)),
            ref_count: 0,
        });
        entry.ref_count += 1;
        Arc::clone(&entry.lock)
    }

    fn release_one(&self, registry: &mut Registry, account_id: AccountId) {
        let Some(entry) = registry.get_mut(&account_id) else {
            self.record_anomaly(account_id, "release for an account with no live lock entry");
            return;
        };

        entry.ref_count -= 1;
        let lock = if entry.ref_count == 0 {
            match registry.remove(&account_id) {
                Some(removed) => removed.lock,
                None => return,
            }
        } else {
            Arc::clone(&entry.lock)
        };

        if let Err(e) = lock.release() {
            self.record_anomaly(account_id, &e.to_string());
        }
    }

    fn record_anomaly(&self, account_id: AccountId, reason: &str) {
        self.release_anomalies.fetch_add(1, Ordering::Relaxed);
        warn!(account_id, reason, "Trying to unlock a lock that is not locked");
    }

    /// Number of accounts that currently have a lock entry
    pub fn live_entries(&self) -> usize {
        self.registry().len()
    }

    /// Reference count of an account's lock entry, if it has one
    pub fn ref_count(&self, account_id: AccountId) -> Option<usize> {
        self.registry().get(&account_id).map(|e| e.ref_count)
    }

    /// Total tolerated release anomalies since start-up
    pub fn release_anomalies(&self) -> u64 {
        self.release_anomalies.load(Ordering::Relaxed)
    }

    /// Configured bound on [`LockingSession::enter`], if any
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout
    }
}

impl Default for LockCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    const ORIGIN: AccountId = 1;
    const DESTINATION: AccountId = 2;

    #[test]
    fn test_canonical_pair() {
        assert_eq!(canonical_pair(5, 2), (2, 5));
        assert_eq!(canonical_pair(2, 5), (2, 5));
    }

    #[test]
    fn test_lock_clean_up_single_case() {
        let coordinator = LockCoordinator::new();
        assert_eq!(coordinator.live_entries(), 0);

        let session = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        session.enter().unwrap();
        assert_eq!(coordinator.live_entries(), 2);

        coordinator.release_session(ORIGIN, DESTINATION);
        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 0);
    }

    #[test]
    fn test_lock_clean_up_multiple_case() {
        let coordinator = LockCoordinator::new();

        let session1 = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        let _session2 = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        let _session3 = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();

        assert_eq!(coordinator.live_entries(), 2);
        assert_eq!(coordinator.ref_count(ORIGIN), Some(3));
        assert_eq!(coordinator.ref_count(DESTINATION), Some(3));

        for remaining in [2, 1] {
            session1.enter().unwrap();
            coordinator.release_session(ORIGIN, DESTINATION);
            assert_eq!(coordinator.live_entries(), 2);
            assert_eq!(coordinator.ref_count(ORIGIN), Some(remaining));
            assert_eq!(coordinator.ref_count(DESTINATION), Some(remaining));
        }

        session1.enter().unwrap();
        coordinator.release_session(ORIGIN, DESTINATION);
        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 0);
    }

    #[test]
    fn test_release_without_acquire_exits_smoothly() {
        let coordinator = LockCoordinator::new();

        coordinator.release_session(ORIGIN, DESTINATION);

        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 2);
    }

    #[test]
    fn test_release_without_enter_exits_smoothly() {
        let coordinator = LockCoordinator::new();
        let _session = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();

        coordinator.release_session(ORIGIN, DESTINATION);

        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 2);
    }

    #[test]
    fn test_double_release_exits_smoothly() {
        let coordinator = LockCoordinator::new();
        let session = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        session.enter().unwrap();

        coordinator.release_session(ORIGIN, DESTINATION);
        assert_eq!(coordinator.release_anomalies(), 0);

        coordinator.release_session(DESTINATION, ORIGIN);
        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 2);
    }

    #[test]
    fn test_same_account_is_rejected() {
        let coordinator = LockCoordinator::new();
        assert_eq!(
            coordinator.acquire_session(ORIGIN, ORIGIN),
            Err(LockError::SameAccount(ORIGIN))
        );
        assert_eq!(coordinator.live_entries(), 0);

        coordinator.release_session(ORIGIN, ORIGIN);
        assert_eq!(coordinator.release_anomalies(), 1);
    }

    #[test]
    fn test_lock_ordering_is_guaranteed_to_avoid_deadlock() {
        let coordinator = LockCoordinator::new();

        let session1 = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        let session2 = coordinator.acquire_session(DESTINATION, ORIGIN).unwrap();

        assert_eq!(session1, session2);
        assert_eq!(session1.accounts(), (ORIGIN, DESTINATION));
        assert_eq!(session2.accounts(), (ORIGIN, DESTINATION));
    }

    #[test]
    fn test_disjoint_pairs_do_not_share_locks() {
        let coordinator = LockCoordinator::new();
        let a = coordinator.acquire_session(1, 2).unwrap();
        let b = coordinator.acquire_session(3, 4).unwrap();
        assert_ne!(a, b);
        assert_eq!(coordinator.live_entries(), 4);
    }

    #[test]
    fn test_session_locks_released_on_release() {
        let coordinator = LockCoordinator::new();
        let session = coordinator.acquire_session(DESTINATION, ORIGIN).unwrap();
        session.enter().unwrap();
        {
            let (first, second) = session.locks();
            assert!(first.is_held() && second.is_held());
        }

        coordinator.release_session(ORIGIN, DESTINATION);
        let (first, second) = session.locks();
        assert!(!first.is_held() && !second.is_held());
    }

    #[test]
    fn test_concurrent_reference_counting() {
        const WORKERS: usize = 32;
        let coordinator = LockCoordinator::new();
        let acquired = Barrier::new(WORKERS + 1);
        let checked = Barrier::new(WORKERS + 1);

        thread::scope(|s| {
            for i in 0..WORKERS {
                let coordinator = &coordinator;
                let acquired = &acquired;
                let checked = &checked;
                s.spawn(move || {
                    let (a, b) = if i % 2 == 0 {
                        (ORIGIN, DESTINATION)
                    } else {
                        (DESTINATION, ORIGIN)
                    };
                    let session = coordinator.acquire_session(a, b).unwrap();
                    acquired.wait();
                    checked.wait();
                    session.enter().unwrap();
                    coordinator.release_session(a, b);
                });
            }

            acquired.wait();
            assert_eq!(coordinator.live_entries(), 2);
            assert_eq!(coordinator.ref_count(ORIGIN), Some(WORKERS));
            assert_eq!(coordinator.ref_count(DESTINATION), Some(WORKERS));
            checked.wait();
        });

        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 0);
    }

    #[test]
    fn test_timeout_is_propagated_to_sessions() {
        let coordinator = LockCoordinator::with_wait_timeout(Some(Duration::from_millis(10)));
        assert_eq!(coordinator.wait_timeout(), Some(Duration::from_millis(10)));

        let holder = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        holder.enter().unwrap();

        let result = thread::scope(|s| {
            s.spawn(|| {
                let session = coordinator.acquire_session(DESTINATION, ORIGIN).unwrap();
                let entered = session.enter();
                coordinator.release_session(DESTINATION, ORIGIN);
                entered
            })
            .join()
            .unwrap()
        });

        assert!(matches!(result, Err(LockError::Timeout { account_id: 1, .. })));
        coordinator.release_session(ORIGIN, DESTINATION);
        assert_eq!(coordinator.live_entries(), 0);
    }

    #[test]
    fn test_double_release_under_overlap_drops_shared_entry() {
        let coordinator = LockCoordinator::new();
        let first = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        let second = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        assert_eq!(coordinator.ref_count(ORIGIN), Some(2));

        first.enter().unwrap();
        coordinator.release_session(ORIGIN, DESTINATION);
        assert_eq!(coordinator.ref_count(ORIGIN), Some(1));

        // The repeat consumes the count still owned by `second`
        coordinator.release_session(ORIGIN, DESTINATION);
        assert_eq!(coordinator.live_entries(), 0);
        assert_eq!(coordinator.release_anomalies(), 2);

        let fresh = coordinator.acquire_session(ORIGIN, DESTINATION).unwrap();
        assert!(fresh != second);
        coordinator.release_session(ORIGIN, DESTINATION);
    }
}
