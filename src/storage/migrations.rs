//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

const MIGRATIONS: [&str; 2] = [
    include_str!("../../migrations/001_initial_schema.sql"),
    include_str!("../../migrations/002_add_continuous_training.sql"),
];

#[allow(clippy::cast_possible_truncation)]
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Run all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let target_version = (idx + 1) as u32;
        if current_version >= target_version {
            continue;
        }

        conn.execute_batch(sql)?;
        conn.pragma_update(None, "user_version", target_version)?;
    }

    Ok(SCHEMA_VERSION)
}
