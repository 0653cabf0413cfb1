//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the off-chain store
//! - Build the RPC client and envelope builder from the soroban section
//! - Hand the concrete handles to the reconciler
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use thiserror::Error;

use crate::config::CoordinatorConfig;
use crate::grants::GrantReconciler;
use crate::soroban::{CodecError, EnvelopeBuilder, HttpRpcClient, RpcError};
use crate::store::{SqliteStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to create RPC client: {0}")]
    Rpc(#[from] RpcError),
    #[error("invalid contract configuration: {0}")]
    Contract(#[from] CodecError),
}

pub fn build_reconciler(config: &CoordinatorConfig) -> Result<GrantReconciler, StartupError> {
    let store = SqliteStore::open(&config.store.path)?;

    let rpc = HttpRpcClient::new(&config.soroban)?;
    let builder = EnvelopeBuilder::new(&config.soroban)?;
    tracing::info!(
        contract_id = %builder.contract(),
        write_fee = config.soroban.write_fee,
        validity_window_secs = config.soroban.validity_window_secs,
        "Envelope builder ready"
    );

    Ok(GrantReconciler::new(
        Arc::new(builder),
        Arc::new(rpc),
        Arc::new(store),
    ))
}
