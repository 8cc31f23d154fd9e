//! Gateway response types
//!
//! Failures leave the gateway as `{code, className, properties, stacktrace}`
//! with the status suggested by [`ServiceError::http_status`].

use std::collections::BTreeMap;
use std::error::Error as _;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::error::ServiceError;

/// Structured error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `transfer.error.insufficient_funds`
    pub code: &'static str,
    pub class_name: &'static str,
    pub properties: BTreeMap<&'static str, Value>,
    /// Error message followed by its source chain
    pub stacktrace: Vec<String>,
}

impl ErrorBody {
    pub fn from_error(err: &ServiceError) -> Self {
        let mut stacktrace = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            stacktrace.push(cause.to_string());
            source = cause.source();
        }
        Self {
            code: err.code(),
            class_name: err.class_name(),
            properties: err.properties(),
            stacktrace,
        }
    }
}

/// Handler error, rendered as an [`ErrorBody`]
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Wrap a successful payload
#[inline]
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(data))
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError(ServiceError::SystemError(format!(
            "Blocking task failed: {}",
            err
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        }
        (status, Json(ErrorBody::from_error(&self.0))).into_response()
    }
}
