//! Database initializers
//!
//! An initializer is the one-time setup routine (schema creation, seeding)
//! a factory runs against the first context it creates. Closures of the
//! right shape are initializers too.

use crate::context::DbContext;
use crate::errors::{from_rusqlite, Result};

/// One-time setup routine run against a freshly created context
///
/// Runs while the factory's [`InitializationGuard`](crate::InitializationGuard)
/// is held: creating a context through a factory that shares that guard
/// from inside `initialize` fails with `InitializerFailed`, and another
/// thread's `create` waits until `initialize` returns. Work on the
/// `context` passed in instead.
///
/// # Example
/// ```
/// use dataonion_store::initializer::DatabaseInitializer;
/// use dataonion_store::DbContext;
///
/// let seed = |ctx: &mut DbContext| -> dataonion_store::Result<()> {
///     ctx.connection()
///         .execute_batch("CREATE TABLE IF NOT EXISTS t (v INTEGER)")
///         .map_err(dataonion_store::errors::from_rusqlite)
/// };
/// assert!(seed.name().contains("closure"));
/// ```
pub trait DatabaseInitializer: Send + Sync {
    /// Prepare the database behind `context`
    fn initialize(&self, context: &mut DbContext) -> Result<()>;

    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> DatabaseInitializer for F
where
    F: Fn(&mut DbContext) -> Result<()> + Send + Sync,
{
    fn initialize(&self, context: &mut DbContext) -> Result<()> {
        self(context)
    }
}

/// Initializer that leaves the database untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInitializer;

impl DatabaseInitializer for NoopInitializer {
    fn initialize(&self, _context: &mut DbContext) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Initializer that runs a SQL batch inside one transaction
///
/// Suited to seeding; use [`crate::migrations::MigrationInitializer`] for
/// versioned schema changes.
#[derive(Debug, Clone)]
pub struct SqlScriptInitializer {
    name: String,
    sql: String,
}

impl SqlScriptInitializer {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

impl DatabaseInitializer for SqlScriptInitializer {
    fn initialize(&self, context: &mut DbContext) -> Result<()> {
        let tx = context.connection_mut().transaction().map_err(from_rusqlite)?;
        tx.execute_batch(&self.sql).map_err(from_rusqlite)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
