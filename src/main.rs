//! Account Transfer Service
//!
//! Entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────┐
//! │   HTTP   │───▶│  Transfer    │───▶│     Lock     │    │ Balance  │
//! │ Gateway  │    │ Orchestrator │───▶│ Coordinator  │    │  Store   │
//! └──────────┘    └──────┬───────┘    └──────────────┘    └────▲─────┘
//!                        └────────────── unit of work ─────────┘
//! ```
//!
//! Flags: `--env/-e <name>` selects `config/<name>.yaml`, `--port <n>`
//! overrides the gateway port.

use std::sync::Arc;

use anyhow::Context;

use account_transfer::config::AppConfig;
use account_transfer::gateway::{self, state::AppState};
use account_transfer::locking::LockCoordinator;
use account_transfer::store::InMemoryStore;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = account_transfer::logging::init_logging(&app_config);

    tracing::info!(
        env = %env,
        lock_wait_timeout_ms = ?app_config.locking.wait_timeout_ms,
        "Starting account transfer service"
    );

    // Exactly one coordinator per process, shared by every transfer path
    let coordinator = Arc::new(LockCoordinator::with_wait_timeout(
        app_config.lock_wait_timeout(),
    ));
    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(AppState::new(store, coordinator));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(gateway::run_server(&app_config.gateway, state))
}
