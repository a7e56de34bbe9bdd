//! Database connection management
//!
//! Opens SQLite connections described by a [`ConnectionString`] and applies
//! its per-connection settings.

use crate::connection_string::{ConnectionString, OpenMode};
use crate::errors::{from_rusqlite, Result};
use rusqlite::{Connection, OpenFlags};

/// Open a connection for the given connection string
pub fn open(connection_string: &ConnectionString) -> Result<Connection> {
    let target = connection_string.open_target();
    let flags = open_flags(connection_string);

    tracing::debug!(
        data_source = connection_string.data_source(),
        mode = ?connection_string.mode(),
        "Opening SQLite connection"
    );

    let conn = Connection::open_with_flags(&target, flags).map_err(from_rusqlite)?;
    configure(&conn, connection_string)?;
    Ok(conn)
}

/// Apply the connection string's pragmas and timeouts
pub fn configure(conn: &Connection, connection_string: &ConnectionString) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", connection_string.foreign_keys())
        .map_err(from_rusqlite)?;

    if let Some(journal_mode) = connection_string.journal_mode() {
        // journal_mode answers with the mode actually in effect
        let applied: String = conn
            .pragma_update_and_check(None, "journal_mode", journal_mode.as_str(), |row| {
                row.get(0)
            })
            .map_err(from_rusqlite)?;
        tracing::debug!(requested = journal_mode.as_str(), applied = %applied, "Journal mode set");
    }

    if let Some(timeout) = connection_string.busy_timeout() {
        conn.busy_timeout(timeout).map_err(from_rusqlite)?;
    }

    Ok(())
}

fn open_flags(connection_string: &ConnectionString) -> OpenFlags {
    let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    match connection_string.mode() {
        OpenMode::ReadWriteCreate | OpenMode::Memory => {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        }
        OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
        OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
    }
}
