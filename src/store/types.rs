//! Off-chain record types and store errors.

use serde::Serialize;
use thiserror::Error;

/// A person referenced by grants, identified by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// Off-chain companion of an on-chain grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRecord {
    pub id: i64,
    /// Populated once the creation transaction is confirmed.
    pub on_chain_id: Option<u64>,
    pub institution_name: String,
    pub manager_id: i64,
    pub supervisor_id: i64,
    pub researcher_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewGrantRecord {
    pub institution_name: String,
    pub manager_id: i64,
    pub supervisor_id: i64,
    pub researcher_id: i64,
}

/// Creation parameters kept until the grant's on-chain id is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCreation {
    pub local_id: i64,
    pub funder: String,
    pub manager: String,
    pub supervisor: String,
    pub researcher: String,
    pub name: String,
    pub total_amount: i128,
    pub total_milestones: u32,
    /// Hex hash of the envelope handed to the signer.
    pub tx_hash: String,
}

/// Errors from the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Unique constraint rejected the write.
    #[error("Duplicate {what}: {key}")]
    Duplicate { what: &'static str, key: String },

    /// Stored value no longer fits its Rust type.
    #[error("Corrupt {what} value: {value}")]
    Corrupt { what: &'static str, value: String },

    /// Value does not fit the column type.
    #[error("{what} {value} out of storable range")]
    OutOfRange { what: &'static str, value: String },

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;
