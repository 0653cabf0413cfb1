//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (subscriber setup for structured events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`grant_id`, `local_id`, `request_id`) on every event
//! - Request ID flows from the HTTP layer into handler logs
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
