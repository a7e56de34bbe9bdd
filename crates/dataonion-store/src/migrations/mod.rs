//! Migration framework
//!
//! Provides:
//! - Migration runner with SHA-256 checksums and ordering checks
//! - Idempotent application
//! - Loading migrations from a directory of `.sql` files
//! - `MigrationInitializer`, which plugs the runner into a factory

mod initializer;
mod runner;
mod source;

pub use initializer::MigrationInitializer;
pub use runner::{applied_migrations, apply_migrations, AppliedMigration};
pub use source::{load_dir, Migration};
