//! Grant coordination: participant identities and composite views.
//!
//! # Responsibilities
//! - Typed request/response records for each operation
//! - Email-keyed participant registry
//! - Reconciliation of on-chain state with off-chain records
//! - Caller-facing error taxonomy

pub mod error;
pub mod reconciler;
pub mod registry;
pub mod types;

pub use error::{CoordinatorError, CoordinatorResult};
pub use reconciler::GrantReconciler;
pub use registry::ParticipantRegistry;
