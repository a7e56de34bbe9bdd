//! Database contexts
//!
//! A `DbContext` is one logical session against a configured database. It
//! is handed to the caller by the factory and owned by them until it is
//! disposed (or dropped).

use crate::connection_string::ConnectionString;
use crate::db;
use crate::errors::{from_rusqlite, Result};
use dataonion_core::ContextKey;
use dataonion_core_types::ContextId;
use rusqlite::Connection;

/// One open session against the database configured for a context key
#[derive(Debug)]
pub struct DbContext {
    id: ContextId,
    key: ContextKey,
    connection_string: ConnectionString,
    conn: Connection,
}

impl DbContext {
    /// Open a fresh context bound to `connection_string`
    pub fn open(key: ContextKey, connection_string: ConnectionString) -> Result<Self> {
        let conn = db::open(&connection_string)?;
        Ok(Self {
            id: ContextId::new(),
            key,
            connection_string,
            conn,
        })
    }

    /// Unique id of this instance
    pub fn id(&self) -> &ContextId {
        &self.id
    }

    /// Key this context was created for
    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection_string
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Borrow the underlying connection mutably (needed for transactions)
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Check that the connection answers queries
    pub fn health_check(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Close the connection, reporting any error SQLite raises on close
    pub fn dispose(self) -> Result<()> {
        let DbContext { id, key, conn, .. } = self;
        conn.close().map_err(|(_, e)| from_rusqlite(e))?;
        tracing::debug!(context_key = %key, context_id = %id, "Context disposed");
        Ok(())
    }
}
