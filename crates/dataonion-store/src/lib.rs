//! DataOnion Store - database contexts over SQLite
//!
//! Provides:
//! - Connection string parsing and connection setup
//! - `DbContext`, one open session against a configured database
//! - Initializers, including a migrate-to-latest initializer
//! - `DbContextFactory`, which creates contexts by key and runs the
//!   initializer once
//! - `DbContextCollection`, lazily memoized contexts released together
//!
//! # Usage
//!
//! ```rust
//! use dataonion_core::ContextKey;
//! use dataonion_store::{ContextConfig, DbContextFactory, SqlScriptInitializer};
//!
//! let orders = ContextKey::new("orders").unwrap();
//! let factory = DbContextFactory::new(vec![ContextConfig::new(
//!     orders.clone(),
//!     "Data Source=:memory:",
//!     SqlScriptInitializer::new("schema", "CREATE TABLE orders (id INTEGER PRIMARY KEY);"),
//! )])
//! .unwrap();
//!
//! let ctx = factory.create(&orders).unwrap();
//! ctx.health_check().unwrap();
//! assert!(factory.is_initialized());
//! ```

pub mod collection;
pub mod connection_string;
pub mod context;
pub mod db;
pub mod errors;
pub mod factory;
pub mod guard;
pub mod initializer;
pub mod migrations;

// Re-export key types
pub use collection::{DbContextCollection, LazyDbContextCollection};
pub use connection_string::{ConnectionString, JournalMode, OpenMode};
pub use context::DbContext;
pub use errors::Result;
pub use factory::{ContextConfig, DbContextFactory};
pub use guard::InitializationGuard;
pub use initializer::{DatabaseInitializer, NoopInitializer, SqlScriptInitializer};
pub use migrations::MigrationInitializer;
