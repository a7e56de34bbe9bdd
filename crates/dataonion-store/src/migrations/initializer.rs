//! Migrate-to-latest initializer

use crate::context::DbContext;
use crate::errors::Result;
use crate::initializer::DatabaseInitializer;
use crate::migrations::runner::apply_migrations;
use crate::migrations::source::{load_dir, Migration};
use std::path::Path;

/// Brings the database up to the latest migration when a factory first
/// creates a context
#[derive(Debug, Clone)]
pub struct MigrationInitializer {
    migrations: Vec<Migration>,
}

impl MigrationInitializer {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }

    /// Build from a directory of `.sql` files
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::new(load_dir(dir)?))
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }
}

impl DatabaseInitializer for MigrationInitializer {
    fn initialize(&self, context: &mut DbContext) -> Result<()> {
        let applied = apply_migrations(context.connection_mut(), &self.migrations)?;
        tracing::debug!(
            context_key = %context.key(),
            applied_count = applied,
            "Migration initializer finished"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "migrate_to_latest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection_string::ConnectionString;
    use crate::migrations::applied_migrations;
    use dataonion_core::ContextKey;

    #[test]
    fn test_initializer_applies_migrations() {
        let mut ctx = DbContext::open(
            ContextKey::new("orders").unwrap(),
            ConnectionString::for_data_source(":memory:"),
        )
        .unwrap();

        let init = MigrationInitializer::new(vec![Migration::new(
            "001_init",
            "CREATE TABLE orders (id INTEGER PRIMARY KEY);",
        )]);
        init.initialize(&mut ctx).unwrap();
        init.initialize(&mut ctx).unwrap();

        let applied = applied_migrations(ctx.connection()).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].migration_id, "001_init");
    }
}
