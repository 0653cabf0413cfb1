//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Store → RPC client → Envelope builder → Reconciler
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Graceful shutdown of the HTTP server
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store and chain handles
//! - Fail fast: any startup error is fatal

pub mod signals;
pub mod startup;

pub use startup::{build_reconciler, StartupError};
