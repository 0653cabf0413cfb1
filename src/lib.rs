//! Grant Transaction Coordinator Library
//!
//! Builds unsigned Soroban envelopes for a grant-management contract,
//! simulates read-only calls and reconciles on-chain grants with their
//! off-chain companion records.

// Chain plumbing
pub mod soroban;

// Domain
pub mod grants;
pub mod store;

// Serving
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::CoordinatorConfig;
pub use grants::GrantReconciler;
pub use http::HttpServer;
