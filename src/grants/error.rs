//! Caller-facing error taxonomy.

use thiserror::Error;

use crate::soroban::{CodecError, EnvelopeError, RpcError, SimulationError};
use crate::store::StoreError;

/// Error kinds surfaced by every coordinator operation.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Malformed input at the request boundary.
    #[error("{0}")]
    Validation(String),

    /// Value could not be converted to the contract wire format.
    #[error("{0}")]
    Encoding(String),

    /// On-chain read failed or the target does not exist.
    #[error("{0}")]
    Simulation(String),

    /// Off-chain companion record is missing.
    #[error("{0}")]
    NotFound(String),

    /// RPC endpoint unreachable, slow or incoherent.
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Store(String),
}

impl CoordinatorError {
    /// Stable snake_case name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoordinatorError::Validation(_) => "validation_error",
            CoordinatorError::Encoding(_) => "encoding_error",
            CoordinatorError::Simulation(_) => "simulation_error",
            CoordinatorError::NotFound(_) => "not_found_error",
            CoordinatorError::Network(_) => "network_error",
            CoordinatorError::Store(_) => "store_error",
        }
    }
}

impl From<CodecError> for CoordinatorError {
    fn from(err: CodecError) -> Self {
        CoordinatorError::Encoding(err.to_string())
    }
}

impl From<RpcError> for CoordinatorError {
    fn from(err: RpcError) -> Self {
        CoordinatorError::Network(err.to_string())
    }
}

impl From<EnvelopeError> for CoordinatorError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Codec(e) => e.into(),
            EnvelopeError::Rpc(e) => e.into(),
        }
    }
}

impl From<SimulationError> for CoordinatorError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::Build { .. } => CoordinatorError::Encoding(err.to_string()),
            SimulationError::Rejected { .. } | SimulationError::Decode { .. } => {
                CoordinatorError::Simulation(err.to_string())
            }
            SimulationError::Rpc(e) => e.into(),
        }
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(err: StoreError) -> Self {
        CoordinatorError::Store(err.to_string())
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
