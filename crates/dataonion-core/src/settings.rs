//! Factory settings
//!
//! Settings describe which contexts exist and where their databases live.
//! Initializers are code, so they are attached when a factory is built from
//! settings rather than named in the file.
//!
//! ```toml
//! [[contexts]]
//! key = "orders"
//! connection_string = "Data Source=orders.db;Foreign Keys=True"
//! ```
//!
//! Any entry's connection string can be replaced through the environment
//! variable returned by [`ContextKey::env_var`].

use crate::errors::{DataOnionError, Result};
use crate::key::ContextKey;
use dataonion_core_types::Sensitive;
use serde::Deserialize;
use std::path::Path;

/// Settings for a single context
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContextSettings {
    pub key: ContextKey,
    pub connection_string: Sensitive<String>,
}

/// Settings for a whole factory
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FactorySettings {
    #[serde(default)]
    pub contexts: Vec<ContextSettings>,
}

impl FactorySettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: FactorySettings =
            toml::from_str(source).map_err(|e| DataOnionError::ConfigFile {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let source = std::fs::read_to_string(path).map_err(|e| DataOnionError::ConfigFile {
            path: display.clone(),
            reason: e.to_string(),
        })?;

        let settings: FactorySettings =
            toml::from_str(&source).map_err(|e| DataOnionError::ConfigFile {
                path: display,
                reason: e.to_string(),
            })?;
        settings.validate()?;

        tracing::debug!(
            path = %path.display(),
            contexts = settings.contexts.len(),
            "Loaded factory settings"
        );
        Ok(settings)
    }

    /// Replace connection strings from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|name| std::env::var(name).ok());
    }

    /// Replace connection strings using `lookup` (variable name -> value)
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for context in &mut self.contexts {
            let var = context.key.env_var();
            if let Some(value) = lookup(&var) {
                tracing::debug!(context_key = %context.key, env_var = %var, "Connection string overridden");
                context.connection_string = Sensitive::new(value);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.contexts.is_empty() {
            return Err(DataOnionError::NoConfigurations);
        }
        Ok(())
    }
}
