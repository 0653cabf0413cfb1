//! Email-keyed participant identities.
//!
//! # Responsibilities
//! - Find-or-create participants by exact email match
//! - Recover from a concurrent insert of the same email by re-reading
//!
//! # Design Decisions
//! - An existing participant's name is never overwritten
//! - Not transactional with the caller's wider operation

use std::sync::Arc;

use crate::grants::error::{CoordinatorError, CoordinatorResult};
use crate::grants::types::Email;
use crate::store::{GrantStore, Participant, StoreError};

#[derive(Clone)]
pub struct ParticipantRegistry {
    store: Arc<dyn GrantStore>,
}

impl ParticipantRegistry {
    pub fn new(store: Arc<dyn GrantStore>) -> Self {
        Self { store }
    }

    /// Return the participant registered under `email`, creating it with `name` if absent.
    pub fn resolve(&self, email: &Email, name: &str) -> CoordinatorResult<Participant> {
        if let Some(existing) = self.store.find_participant_by_email(email.as_str())? {
            return Ok(existing);
        }

        match self.store.create_participant(email.as_str(), name) {
            Ok(created) => {
                tracing::info!(participant_id = created.id, email = %email.as_str(), "Participant created");
                Ok(created)
            }
            Err(StoreError::Duplicate { .. }) => {
                tracing::warn!(email = %email.as_str(), "Concurrent participant insert, re-reading");
                self.store
                    .find_participant_by_email(email.as_str())?
                    .ok_or_else(|| {
                        CoordinatorError::Store(format!(
                            "participant {} vanished after duplicate insert",
                            email.as_str()
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, id: i64) -> CoordinatorResult<Participant> {
        self.store
            .find_participant(id)?
            .ok_or_else(|| CoordinatorError::NotFound(format!("Participant {} not found", id)))
    }
}

impl std::fmt::Debug for ParticipantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantRegistry").finish_non_exhaustive()
    }
}
