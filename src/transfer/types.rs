//! Transfer request types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::AccountId;
use crate::error::{ParameterCondition, ServiceError};

/// Parameter name reported when origin and destination are the same account
pub const ACCOUNT_PAIR_PARAMETER: &str = "originAccountId, destinationAccountId";

/// Transfer request as received from a caller
///
/// Every field is optional so that a missing value is reported as a
/// `NOT_NULL` violation rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(default)]
    pub origin_account_id: Option<AccountId>,
    #[serde(default)]
    pub destination_account_id: Option<AccountId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Request that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub origin: AccountId,
    pub destination: AccountId,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(origin: AccountId, destination: AccountId, amount: Decimal) -> Self {
        Self {
            origin_account_id: Some(origin),
            destination_account_id: Some(destination),
            amount: Some(amount),
        }
    }

    /// Check the request before any lock or unit of work is taken.
    ///
    /// Order: origin, destination, distinct ids, amount presence, sign, zero.
    pub fn validate(&self) -> Result<ValidatedTransfer, ServiceError> {
        let origin = self.origin_account_id.ok_or_else(|| {
            ServiceError::bad_parameter("originAccountId", ParameterCondition::NotNull)
        })?;
        let destination = self.destination_account_id.ok_or_else(|| {
            ServiceError::bad_parameter("destinationAccountId", ParameterCondition::NotNull)
        })?;
        if origin == destination {
            return Err(ServiceError::bad_parameter(
                ACCOUNT_PAIR_PARAMETER,
                ParameterCondition::Different,
            ));
        }

        let amount = self
            .amount
            .ok_or_else(|| ServiceError::bad_parameter("amount", ParameterCondition::NotNull))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ServiceError::bad_parameter(
                "amount",
                ParameterCondition::Positive,
            ));
        }
        if amount.is_zero() {
            return Err(ServiceError::bad_parameter(
                "amount",
                ParameterCondition::NotEqualToZero,
            ));
        }

        Ok(ValidatedTransfer {
            origin,
            destination,
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition_of(req: &TransferRequest) -> (&'static str, ParameterCondition) {
        match req.validate() {
            Err(ServiceError::BadParameter {
                parameter,
                condition,
            }) => (parameter, condition),
            other => panic!("expected BadParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request() {
        let v = TransferRequest::new(1, 2, Decimal::new(1000, 2)).validate().unwrap();
        assert_eq!(v.origin, 1);
        assert_eq!(v.destination, 2);
        assert_eq!(v.amount, Decimal::new(10, 0));
    }

    #[test]
    fn test_missing_fields() {
        let req = TransferRequest {
            origin_account_id: None,
            destination_account_id: Some(2),
            amount: Some(Decimal::TEN),
        };
        assert_eq!(
            condition_of(&req),
            ("originAccountId", ParameterCondition::NotNull)
        );

        let req = TransferRequest {
            origin_account_id: Some(1),
            destination_account_id: None,
            amount: None,
        };
        assert_eq!(
            condition_of(&req),
            ("destinationAccountId", ParameterCondition::NotNull)
        );

        let req = TransferRequest {
            amount: None,
            ..TransferRequest::new(1, 2, Decimal::ONE)
        };
        assert_eq!(condition_of(&req), ("amount", ParameterCondition::NotNull));
    }

    #[test]
    fn test_same_account() {
        let req = TransferRequest::new(1, 1, Decimal::TEN);
        assert_eq!(
            condition_of(&req),
            (ACCOUNT_PAIR_PARAMETER, ParameterCondition::Different)
        );
    }

    #[test]
    fn test_zero_and_negative_amounts() {
        let req = TransferRequest::new(1, 2, Decimal::ZERO);
        assert_eq!(
            condition_of(&req),
            ("amount", ParameterCondition::NotEqualToZero)
        );

        // -0.00 is still zero
        let req = TransferRequest::new(1, 2, "-0.00".parse().unwrap());
        assert_eq!(
            condition_of(&req),
            ("amount", ParameterCondition::NotEqualToZero)
        );

        let req = TransferRequest::new(1, 2, Decimal::new(-5, 0));
        assert_eq!(condition_of(&req), ("amount", ParameterCondition::Positive));
    }

    #[test]
    fn test_same_account_checked_before_amount() {
        let req = TransferRequest {
            amount: None,
            ..TransferRequest::new(3, 3, Decimal::ONE)
        };
        assert_eq!(condition_of(&req).1, ParameterCondition::Different);
    }

    #[test]
    fn test_deserialize_camel_case_with_nulls() {
        let req: TransferRequest =
            serde_json::from_str(r#"{"originAccountId":1,"amount":"0.56"}"#).unwrap();
        assert_eq!(req.origin_account_id, Some(1));
        assert_eq!(req.destination_account_id, None);
        assert_eq!(req.amount, Some(Decimal::new(56, 2)));
    }
}
