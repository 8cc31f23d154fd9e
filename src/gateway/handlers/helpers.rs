//! Handler helper functions
//!
//! Shared utilities used by multiple handlers.

use std::str::FromStr;

use crate::error::{ParameterCondition, ServiceError};

use super::super::types::ApiError;

/// Run a blocking service call on the tokio blocking pool.
///
/// Transfers block on account locks, so they must never run on a
/// runtime worker thread.
pub async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// Parse a raw path segment, reporting failure as a `WELL_FORMED` violation
pub fn parse_segment<T: FromStr>(raw: &str, parameter: &'static str) -> Result<T, ServiceError> {
    raw.trim()
        .parse()
        .map_err(|_| ServiceError::bad_parameter(parameter, ParameterCondition::WellFormed))
}
