//! HTTP gateway
//!
//! Thin axum surface over the account service and the transfer
//! orchestrator. Every service call runs on the blocking pool.

pub mod handlers;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::GatewayConfig;
use state::AppState;

/// Build the gateway router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Accounts
        .route(
            "/account",
            put(handlers::create_account).get(handlers::list_accounts),
        )
        .route("/account/clean", post(handlers::clean_all))
        .route("/account/{account_id}", get(handlers::get_account))
        // Transfers
        .route(
            "/account/{origin}/transfer/{destination}/{amount}",
            post(handlers::transfer_by_path),
        )
        .route(
            "/transfer",
            post(handlers::create_transfer).get(handlers::list_transfers),
        )
        // System
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

/// Bind the configured address and serve until the server fails
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "Gateway listening");
    axum::serve(listener, router(state))
        .await
        .context("Server error")?;
    Ok(())
}
