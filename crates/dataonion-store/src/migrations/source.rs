//! Migration sources
//!
//! Migrations are either built in code (often from `include_str!`) or read
//! from a directory of `<id>.sql` files. Ids order the migrations, so use a
//! zero-padded prefix: `001_initial_schema.sql`, `002_add_orders.sql`.

use crate::errors::{io_error, migration_error, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

/// A single migration script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: String,
    pub sql: String,
}

impl Migration {
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sql: sql.into(),
        }
    }

    /// Hex SHA-256 of the script, recorded when the migration is applied
    ///
    /// Line endings are normalized first, so a checkout that turns `\n` into
    /// `\r\n` does not look like an edited migration.
    pub fn checksum(&self) -> String {
        let normalized = self.sql.replace("\r\n", "\n");
        hex::encode(Sha256::digest(normalized.as_bytes()))
    }
}

/// Load every `.sql` file in `dir`, ordered by id (the file stem)
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Migration>> {
    let dir = dir.as_ref();

    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_error("migration_load", e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().map(|ext| ext == "sql").unwrap_or(false))
        .collect();

    // Sorted for determinism
    paths.sort();

    let mut migrations = Vec::with_capacity(paths.len());
    for path in paths {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                migration_error(&path.display().to_string(), "file name is not valid UTF-8")
            })?
            .to_string();
        let sql = std::fs::read_to_string(&path).map_err(|e| io_error("migration_load", e))?;
        migrations.push(Migration { id, sql });
    }

    tracing::debug!(dir = %dir.display(), count = migrations.len(), "Loaded migrations");
    Ok(migrations)
}
