//! Table definitions.
//!
//! Applied idempotently on every open; there is no migration history.

use rusqlite::Connection;

pub const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS participant (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS grant_record (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        on_chain_id INTEGER UNIQUE,
        institution_name TEXT NOT NULL,
        manager_id INTEGER NOT NULL REFERENCES participant(id),
        supervisor_id INTEGER NOT NULL REFERENCES participant(id),
        researcher_id INTEGER NOT NULL REFERENCES participant(id)
    );

    CREATE TABLE IF NOT EXISTS pending_creation (
        local_id INTEGER PRIMARY KEY REFERENCES grant_record(id),
        funder TEXT NOT NULL,
        manager TEXT NOT NULL,
        supervisor TEXT NOT NULL,
        researcher TEXT NOT NULL,
        name TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        total_milestones INTEGER NOT NULL,
        tx_hash TEXT NOT NULL
    );
"#;

pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}
