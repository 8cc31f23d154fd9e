//! Service Error Types
//!
//! One taxonomy for every service operation. Error codes and HTTP status
//! suggestions are stable and used as-is by the gateway.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::core_types::AccountId;
use crate::locking::LockError;
use crate::store::StoreError;

/// Property keys carried by structured errors
pub mod property {
    pub const PARAMETER_NAME: &str = "PARAMETER_NAME";
    pub const EXPECTED_CONDITION: &str = "EXPECTED_CONDITION";
    pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
    pub const CURRENT_FUNDS: &str = "CURRENT_FUNDS";
}

/// Condition a request parameter failed to meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterCondition {
    NotNull,
    Different,
    Positive,
    NotEqualToZero,
    NonNegative,
    WellFormed,
}

impl ParameterCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterCondition::NotNull => "NOT_NULL",
            ParameterCondition::Different => "DIFFERENT",
            ParameterCondition::Positive => "POSITIVE",
            ParameterCondition::NotEqualToZero => "NOT_EQUAL_TO_ZERO",
            ParameterCondition::NonNegative => "NON_NEGATIVE",
            ParameterCondition::WellFormed => "WELL_FORMED",
        }
    }
}

impl fmt::Display for ParameterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Abstract failure kind, decides rollback and the boundary response class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request argument, detected before any lock or unit of work
    ParameterValidation,
    /// Referenced entity does not exist
    ResourceNotFound,
    /// Business rule violated (insufficient funds)
    PreconditionFailed,
    /// Anything else
    Internal,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bad parameter {parameter}: expected {condition}")]
    BadParameter {
        parameter: &'static str,
        condition: ParameterCondition,
    },

    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: AccountId },

    #[error("Insufficient funds in account {account_id}: current funds {current_funds}")]
    InsufficientFunds {
        account_id: AccountId,
        current_funds: Decimal,
    },

    #[error("Balance of account {account_id} would overflow")]
    BalanceOverflow { account_id: AccountId },

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl ServiceError {
    pub fn bad_parameter(parameter: &'static str, condition: ParameterCondition) -> Self {
        ServiceError::BadParameter {
            parameter,
            condition,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::BadParameter { .. } => ErrorKind::ParameterValidation,
            ServiceError::AccountNotFound { .. } => ErrorKind::ResourceNotFound,
            ServiceError::InsufficientFunds { .. } => ErrorKind::PreconditionFailed,
            ServiceError::BalanceOverflow { .. }
            | ServiceError::Lock(_)
            | ServiceError::Store(_)
            | ServiceError::SystemError(_) => ErrorKind::Internal,
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadParameter { .. } => "transfer.error.bad_parameter",
            ServiceError::AccountNotFound { .. } => "transfer.error.account_not_found",
            ServiceError::InsufficientFunds { .. } => "transfer.error.insufficient_funds",
            ServiceError::BalanceOverflow { .. }
            | ServiceError::Lock(_)
            | ServiceError::Store(_)
            | ServiceError::SystemError(_) => "transfer.error.generic",
        }
    }

    /// Variant name, reported as `className` in error bodies
    pub fn class_name(&self) -> &'static str {
        match self {
            ServiceError::BadParameter { .. } => "BadParameter",
            ServiceError::AccountNotFound { .. } => "AccountNotFound",
            ServiceError::InsufficientFunds { .. } => "InsufficientFunds",
            ServiceError::BalanceOverflow { .. } => "BalanceOverflow",
            ServiceError::Lock(_) => "Lock",
            ServiceError::Store(_) => "Store",
            ServiceError::SystemError(_) => "SystemError",
        }
    }

    /// Structured properties of the failing condition
    pub fn properties(&self) -> BTreeMap<&'static str, Value> {
        let mut props = BTreeMap::new();
        match self {
            ServiceError::BadParameter {
                parameter,
                condition,
            } => {
                props.insert(property::PARAMETER_NAME, Value::from(*parameter));
                props.insert(property::EXPECTED_CONDITION, Value::from(condition.as_str()));
            }
            ServiceError::AccountNotFound { account_id }
            | ServiceError::BalanceOverflow { account_id } => {
                props.insert(property::ACCOUNT_ID, Value::from(*account_id));
            }
            ServiceError::InsufficientFunds {
                account_id,
                current_funds,
            } => {
                props.insert(property::ACCOUNT_ID, Value::from(*account_id));
                props.insert(property::CURRENT_FUNDS, Value::from(current_funds.to_string()));
            }
            ServiceError::Lock(_) | ServiceError::Store(_) | ServiceError::SystemError(_) => {}
        }
        props
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::ParameterValidation => 400,
            ErrorKind::ResourceNotFound => 404,
            ErrorKind::PreconditionFailed => 406,
            ErrorKind::Internal => 500,
        }
    }
}
