//! Schema upgrades, tracked in SQLite's `user_version` pragma.
//!
//! A database at version `n` has had the first `n` scripts applied.

use anyhow::{Context, Result};
use rusqlite::Connection;

const MIGRATIONS: &[(&str, &str)] = &[
    ("initial", include_str!("migrations/001_initial.sql")),
    ("share_grantor", include_str!("migrations/002_share_grantor.sql")),
];

pub fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    usize::try_from(version).context("Negative schema version")
}

/// Bring the schema up to date. Each script commits together with its
/// version bump.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;
    if current > MIGRATIONS.len() {
        anyhow::bail!(
            "Database schema version {} is newer than this build ({})",
            current,
            MIGRATIONS.len()
        );
    }

    for (index, &(name, sql)) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = index + 1;
        tracing::info!(version, name, "Upgrading schema");

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("Schema upgrade {} ({}) failed", version, name))?;
        tx.pragma_update(None, "user_version", version as i64)?;
        tx.commit()?;
    }

    Ok(())
}
