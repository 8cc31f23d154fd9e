//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use super::helpers::{parse_segment, run_blocking};
use crate::account::TransferRecord;
use crate::core_types::AccountId;
use crate::transfer::TransferRequest;

/// Transfer with every argument in the path
///
/// POST /account/{origin}/transfer/{destination}/{amount}
pub async fn transfer_by_path(
    State(state): State<Arc<AppState>>,
    Path((origin, destination, amount)): Path<(String, String, String)>,
) -> ApiResult<TransferRecord> {
    let origin: AccountId = parse_segment(&origin, "originAccountId")?;
    let destination: AccountId = parse_segment(&destination, "destinationAccountId")?;
    let amount: Decimal = parse_segment(&amount, "amount")?;

    execute(state, TransferRequest::new(origin, destination, amount)).await
}

/// Transfer from a JSON body
///
/// POST /transfer
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferRecord> {
    execute(state, req).await
}

/// List committed transfer records
///
/// GET /transfer
pub async fn list_transfers(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TransferRecord>> {
    let transfers = state.transfers.clone();
    ok(run_blocking(move || transfers.list_transfers()).await?)
}

async fn execute(state: Arc<AppState>, req: TransferRequest) -> ApiResult<TransferRecord> {
    let transfers = state.transfers.clone();
    ok(run_blocking(move || transfers.transfer(&req)).await?)
}
