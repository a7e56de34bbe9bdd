//! Migration runner
//!
//! Applies migrations with checksums, ordering checks, and idempotency

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::source::Migration;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashSet;

/// A row of the `schema_version` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub migration_id: String,
    pub applied_at: i64,
    pub checksum: String,
}

/// Apply all pending migrations to the database
///
/// Returns how many migrations were applied by this call. Already-applied
/// migrations are skipped after their checksum is verified.
///
/// # Errors
///
/// - `Persistence`: SQL failure, migrations out of order, or the database
///   has a migration the given set does not know
/// - `ConstraintViolation`: an applied migration's script has changed
pub fn apply_migrations(conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
    check_order(migrations)?;
    create_schema_version_table(conn)?;

    let known: HashSet<&str> = migrations.iter().map(|m| m.id.as_str()).collect();
    for applied in applied_migrations(conn)? {
        if !known.contains(applied.migration_id.as_str()) {
            return Err(migration_error(
                &applied.migration_id,
                "applied to the database but missing from the migration set",
            ));
        }
    }

    let mut applied_count = 0;
    for migration in migrations {
        if apply_migration(conn, migration)? {
            applied_count += 1;
        }
    }

    tracing::debug!(
        applied_count,
        total = migrations.len(),
        "Migrations up to date"
    );
    Ok(applied_count)
}

/// List applied migrations in application order
pub fn applied_migrations(conn: &Connection) -> Result<Vec<AppliedMigration>> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get::<_, i64>(0),
        )
        .map_err(from_rusqlite)?
        > 0;
    if !table_exists {
        return Ok(Vec::new());
    }

    let mut stmt = conn
        .prepare("SELECT migration_id, applied_at, checksum FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AppliedMigration {
                migration_id: row.get(0)?,
                applied_at: row.get(1)?,
                checksum: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

/// Ids must be unique and strictly increasing
fn check_order(migrations: &[Migration]) -> Result<()> {
    for pair in migrations.windows(2) {
        if pair[0].id >= pair[1].id {
            return Err(migration_error(
                &pair[1].id,
                &format!("must sort after {}", pair[0].id),
            ));
        }
    }
    Ok(())
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT NOT NULL
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply a single migration if not already applied; true when applied now
fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<bool> {
    let checksum = migration.checksum();

    let recorded: Option<String> = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?1",
            [&migration.id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    if let Some(recorded) = recorded {
        if recorded != checksum {
            return Err(checksum_mismatch(&migration.id, &recorded, &checksum));
        }
        return Ok(false);
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(&migration.sql)
        .map_err(|e| migration_error(&migration.id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration.id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(migration_id = %migration.id, "Migration applied");
    Ok(true)
}
