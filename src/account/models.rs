//! Data models for accounts and transfer records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, TransferId};

/// Account holding a monetary balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// External reference (e.g. IBAN or customer key), free-form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub balance: Decimal,
}

impl Account {
    /// Whether the balance covers `amount`
    #[inline]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// Account creation request
///
/// Fields are optional so that missing values reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

impl NewAccount {
    pub fn new(balance: Decimal) -> Self {
        Self {
            reference: None,
            balance: Some(balance),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Immutable record of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: TransferId,
    pub origin_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Transfer record before it is appended to the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    pub origin_account_id: AccountId,
    pub destination_account_id: AccountId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl NewTransfer {
    /// Stamp a new transfer with the current time
    pub fn now(origin: &Account, destination: &Account, amount: Decimal) -> Self {
        Self {
            origin_account_id: origin.id,
            destination_account_id: destination.id,
            amount,
            created_at: Utc::now(),
        }
    }

    /// Assign the record id
    pub fn into_record(self, id: TransferId) -> TransferRecord {
        TransferRecord {
            id,
            origin_account_id: self.origin_account_id,
            destination_account_id: self.destination_account_id,
            amount: self.amount,
            created_at: self.created_at,
        }
    }
}
