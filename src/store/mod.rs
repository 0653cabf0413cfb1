//! Off-chain relational store.
//!
//! # Responsibilities
//! - Participants keyed by unique email
//! - Grant records with an optional, unique on-chain id
//! - Pending creations awaiting on-chain confirmation
//!
//! # Design Decisions
//! - `GrantStore` is the seam the coordinator depends on; `SqliteStore`
//!   is the shipped implementation
//! - Methods are synchronous and short; the connection guard is the only lock

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::{GrantRecord, NewGrantRecord, Participant, PendingCreation, StoreError, StoreResult};

/// Repository operations over participants and grant records.
pub trait GrantStore: Send + Sync {
    fn find_participant_by_email(&self, email: &str) -> StoreResult<Option<Participant>>;

    fn find_participant(&self, id: i64) -> StoreResult<Option<Participant>>;

    /// Insert a participant. Fails with `StoreError::Duplicate` if the email exists.
    fn create_participant(&self, email: &str, name: &str) -> StoreResult<Participant>;

    fn create_grant_record(&self, record: &NewGrantRecord) -> StoreResult<GrantRecord>;

    fn find_grant_by_local_id(&self, local_id: i64) -> StoreResult<Option<GrantRecord>>;

    fn find_grant_by_on_chain_id(&self, on_chain_id: u64) -> StoreResult<Option<GrantRecord>>;

    fn save_pending_creation(&self, pending: &PendingCreation) -> StoreResult<()>;

    fn find_pending_creation(&self, local_id: i64) -> StoreResult<Option<PendingCreation>>;

    /// Set a record's on-chain id and drop its pending creation atomically.
    ///
    /// Fails with `StoreError::Duplicate` if another record holds the id, or
    /// if the record is missing or already linked to a different id. Nothing
    /// is changed on failure.
    fn link_on_chain_id(&self, local_id: i64, on_chain_id: u64) -> StoreResult<()>;
}
