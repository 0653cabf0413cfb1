//! Soroban contract integration.
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//!   │    codec     │──▶│  envelope   │──▶│  simulator   │
//!   │  stellar-xdr │   │  builder    │   │ (read path)  │
//!   └──────────────┘   └──────┬──────┘   └──────┬───────┘
//!                             │                 │
//!                             ▼                 ▼
//!                      ┌─────────────────────────────┐
//!                      │     rpc (JSON-RPC 2.0)      │
//!                      └─────────────────────────────┘
//! ```
//!
//! # Responsibilities
//! - Contract value wire format (XDR `ScVal`)
//! - Unsigned envelope assembly for read simulation and writes
//! - Zero-fee simulation of `get_grant` / `get_milestone`

pub mod address;
pub mod codec;
pub mod envelope;
pub mod rpc;
pub mod simulator;
pub mod types;

pub use address::Address;
pub use codec::{MilestoneStatus, OnChainGrant, OnChainMilestone};
pub use envelope::{BuiltEnvelope, EnvelopeBuilder, EnvelopeError};
pub use rpc::{HttpRpcClient, SorobanRpc};
pub use stellar_xdr::curr::ScVal;
pub use simulator::{ReadSimulator, SimulationError};
pub use types::{CodecError, Intent, RpcError, SorobanConfig};
