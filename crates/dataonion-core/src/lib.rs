//! DataOnion Core - keys, configuration and the ambient facilities
//!
//! This crate provides what every DataOnion layer shares:
//! - Context keys identifying which database a caller wants
//! - Factory settings loaded from TOML with environment overrides
//! - The structured error facility (`ExError`, `DataOnionError`)
//! - The structured logging facility and its macros

pub mod errors;
pub mod key;
pub mod logging_facility;
pub mod settings;

// Re-export commonly used types
pub use errors::{DataOnionError, ExError, ExErrorKind, Result};
pub use key::ContextKey;
pub use settings::{ContextSettings, FactorySettings};

// Paths the logging macros expand to, so callers need no extra dependencies
#[doc(hidden)]
pub mod __private {
    pub use dataonion_core_types::schema;
    pub use tracing;
}
