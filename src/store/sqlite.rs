//! SQLite-backed `GrantStore`.
//!
//! # Design Decisions
//! - One connection behind a mutex; every call is a short statement
//! - Unique-constraint violations surface as `StoreError::Duplicate` so
//!   callers can recover from races instead of failing

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::store::schema;
use crate::store::types::{
    GrantRecord, NewGrantRecord, Participant, PendingCreation, StoreError, StoreResult,
};
use crate::store::GrantStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file. `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        schema::apply(&conn)?;
        tracing::info!(path = %path.display(), "Grant store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(":memory:")
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn to_sql_id(what: &'static str, value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange {
        what,
        value: value.to_string(),
    })
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
    })
}

fn grant_from_row(row: &Row<'_>) -> rusqlite::Result<GrantRecord> {
    let on_chain_id: Option<i64> = row.get(1)?;
    Ok(GrantRecord {
        id: row.get(0)?,
        // Only non-negative ids are ever written
        on_chain_id: on_chain_id.map(|id| id as u64),
        institution_name: row.get(2)?,
        manager_id: row.get(3)?,
        supervisor_id: row.get(4)?,
        researcher_id: row.get(5)?,
    })
}

const GRANT_COLUMNS: &str =
    "id, on_chain_id, institution_name, manager_id, supervisor_id, researcher_id";

impl GrantStore for SqliteStore {
    fn find_participant_by_email(&self, email: &str) -> StoreResult<Option<Participant>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, email, name FROM participant WHERE email = ?1",
                params![email],
                participant_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn find_participant(&self, id: i64) -> StoreResult<Option<Participant>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT id, email, name FROM participant WHERE id = ?1",
                params![id],
                participant_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn create_participant(&self, email: &str, name: &str) -> StoreResult<Participant> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO participant (email, name) VALUES (?1, ?2)",
            params![email, name],
        ) {
            Ok(_) => Ok(Participant {
                id: conn.last_insert_rowid(),
                email: email.to_string(),
                name: name.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate {
                what: "participant email",
                key: email.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn create_grant_record(&self, record: &NewGrantRecord) -> StoreResult<GrantRecord> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO grant_record (institution_name, manager_id, supervisor_id, researcher_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.institution_name,
                record.manager_id,
                record.supervisor_id,
                record.researcher_id
            ],
        )?;
        Ok(GrantRecord {
            id: conn.last_insert_rowid(),
            on_chain_id: None,
            institution_name: record.institution_name.clone(),
            manager_id: record.manager_id,
            supervisor_id: record.supervisor_id,
            researcher_id: record.researcher_id,
        })
    }

    fn find_grant_by_local_id(&self, local_id: i64) -> StoreResult<Option<GrantRecord>> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                &format!("SELECT {} FROM grant_record WHERE id = ?1", GRANT_COLUMNS),
                params![local_id],
                grant_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn find_grant_by_on_chain_id(&self, on_chain_id: u64) -> StoreResult<Option<GrantRecord>> {
        // Ids beyond i64 can never have been stored
        let Ok(key) = i64::try_from(on_chain_id) else {
            return Ok(None);
        };
        let conn = self.conn()?;
        let found = conn
            .query_row(
                &format!("SELECT {} FROM grant_record WHERE on_chain_id = ?1", GRANT_COLUMNS),
                params![key],
                grant_from_row,
            )
            .optional()?;
        Ok(found)
    }

    fn save_pending_creation(&self, pending: &PendingCreation) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO pending_creation
             (local_id, funder, manager, supervisor, researcher, name, total_amount, total_milestones, tx_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                pending.local_id,
                pending.funder,
                pending.manager,
                pending.supervisor,
                pending.researcher,
                pending.name,
                pending.total_amount.to_string(),
                pending.total_milestones,
                pending.tx_hash
            ],
        )?;
        Ok(())
    }

    fn find_pending_creation(&self, local_id: i64) -> StoreResult<Option<PendingCreation>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT local_id, funder, manager, supervisor, researcher, name, total_amount, total_milestones, tx_hash
                 FROM pending_creation WHERE local_id = ?1",
                params![local_id],
                |row| {
                    Ok((
                        PendingCreation {
                            local_id: row.get(0)?,
                            funder: row.get(1)?,
                            manager: row.get(2)?,
                            supervisor: row.get(3)?,
                            researcher: row.get(4)?,
                            name: row.get(5)?,
                            total_amount: 0,
                            total_milestones: row.get(7)?,
                            tx_hash: row.get(8)?,
                        },
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((mut pending, amount)) => {
                pending.total_amount = amount.parse().map_err(|_| StoreError::Corrupt {
                    what: "total_amount",
                    value: amount,
                })?;
                Ok(Some(pending))
            }
        }
    }

    fn link_on_chain_id(&self, local_id: i64, on_chain_id: u64) -> StoreResult<()> {
        let key = to_sql_id("on_chain_id", on_chain_id)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        // Only an unlinked record, or one already holding this id, is updated
        let updated = match tx.execute(
            "UPDATE grant_record SET on_chain_id = ?1
             WHERE id = ?2 AND (on_chain_id IS NULL OR on_chain_id = ?1)",
            params![key, local_id],
        ) {
            Ok(updated) => updated,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate {
                    what: "on-chain grant id",
                    key: on_chain_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if updated == 0 {
            return Err(StoreError::Duplicate {
                what: "link for grant record",
                key: local_id.to_string(),
            });
        }
        tx.execute(
            "DELETE FROM pending_creation WHERE local_id = ?1",
            params![local_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}
