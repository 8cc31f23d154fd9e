//! Account handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use super::helpers::{parse_segment, run_blocking};
use crate::account::{Account, NewAccount};
use crate::core_types::AccountId;

/// Create account
///
/// PUT /account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewAccount>,
) -> ApiResult<Account> {
    let accounts = state.accounts.clone();
    ok(run_blocking(move || accounts.create_account(req)).await?)
}

/// List all accounts
///
/// GET /account
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Account>> {
    let accounts = state.accounts.clone();
    ok(run_blocking(move || accounts.list_accounts()).await?)
}

/// Get one account
///
/// GET /account/{account_id}
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> ApiResult<Account> {
    let account_id: AccountId = parse_segment(&account_id, "accountId")?;
    let accounts = state.accounts.clone();
    ok(run_blocking(move || accounts.get_account(Some(account_id))).await?)
}

/// Delete every transfer record and account
///
/// POST /account/clean
pub async fn clean_all(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let accounts = state.accounts.clone();
    run_blocking(move || accounts.clean_all()).await?;
    Ok(StatusCode::NO_CONTENT)
}
