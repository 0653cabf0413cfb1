//! Read-only contract queries via simulation.
//!
//! # Responsibilities
//! - Build zero-fee read envelopes for `get_grant` / `get_milestone`
//! - Run them through `simulateTransaction`
//! - Decode the returned value into typed records
//!
//! # Design Decisions
//! - The only place on-chain records are decoded
//! - A failed or empty simulation is a `Rejected` outcome, never a retry

use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics;
use crate::soroban::codec::{FromScVal, OnChainGrant, OnChainMilestone};
use crate::soroban::envelope::EnvelopeBuilder;
use crate::soroban::rpc::{SimulationOutcome, SorobanRpc};
use crate::soroban::types::{CodecError, RpcError};
use stellar_xdr::curr::ScVal;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// Read envelope could not be assembled.
    #[error("Failed to build {function} envelope: {source}")]
    Build {
        function: &'static str,
        source: CodecError,
    },

    /// Node reported a failed simulation or returned nothing.
    #[error("Simulation of {function} failed: {reason}")]
    Rejected {
        function: &'static str,
        reason: String,
    },

    /// Returned value does not match the contract schema.
    #[error("Unexpected {function} return value: {source}")]
    Decode {
        function: &'static str,
        source: CodecError,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Answers contract reads without fees or state changes.
#[derive(Clone)]
pub struct ReadSimulator {
    builder: Arc<EnvelopeBuilder>,
    rpc: Arc<dyn SorobanRpc>,
}

impl ReadSimulator {
    pub fn new(builder: Arc<EnvelopeBuilder>, rpc: Arc<dyn SorobanRpc>) -> Self {
        Self { builder, rpc }
    }

    /// Simulate `function(args)` and return its raw value.
    pub async fn simulate(
        &self,
        function: &'static str,
        args: Vec<ScVal>,
    ) -> Result<ScVal, SimulationError> {
        let envelope = self
            .builder
            .build_read(function, args)
            .map_err(|source| SimulationError::Build { function, source })?;

        let outcome = match self.rpc.simulate_transaction(&envelope.xdr).await {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics::record_simulation(function, "network_error");
                return Err(e.into());
            }
        };

        match outcome {
            SimulationOutcome::Success {
                retval,
                latest_ledger,
            } => {
                tracing::debug!(function, latest_ledger, "Simulation succeeded");
                metrics::record_simulation(function, "success");
                Ok(retval)
            }
            SimulationOutcome::Failed { error } => {
                tracing::debug!(function, error = %error, "Simulation rejected");
                metrics::record_simulation(function, "rejected");
                Err(SimulationError::Rejected {
                    function,
                    reason: error,
                })
            }
        }
    }

    async fn query<T: FromScVal>(
        &self,
        function: &'static str,
        args: Vec<ScVal>,
    ) -> Result<T, SimulationError> {
        let value = self.simulate(function, args).await?;
        T::from_scval(&value).map_err(|source| SimulationError::Decode { function, source })
    }

    /// Current on-chain state of grant `id`.
    pub async fn get_grant(&self, id: u64) -> Result<OnChainGrant, SimulationError> {
        self.query("get_grant", vec![ScVal::U64(id)]).await
    }

    /// Current on-chain state of milestone `milestone_id` of grant `grant_id`.
    pub async fn get_milestone(
        &self,
        grant_id: u64,
        milestone_id: u32,
    ) -> Result<OnChainMilestone, SimulationError> {
        self.query(
            "get_milestone",
            vec![ScVal::U64(grant_id), ScVal::U32(milestone_id)],
        )
        .await
    }
}

impl std::fmt::Debug for ReadSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSimulator")
            .field("contract", &self.builder.contract().to_string())
            .finish()
    }
}
