//! Core types used throughout the system
//!
//! These are fundamental identifiers shared by the locking, store and
//! transfer layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account ID - assigned by the balance store, immutable after assignment.
///
/// # Ordering:
/// The natural `i64` order is the canonical pair order used for lock
/// acquisition. Any change to this type must keep it totally ordered.
pub type AccountId = i64;

/// Transfer ID - ULID-based unique identifier of a committed transfer
///
/// Monotonic and sortable, so listing records by id lists them by
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    /// Generate a new unique TransferId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}
