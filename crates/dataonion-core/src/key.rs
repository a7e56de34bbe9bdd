//! Context keys
//!
//! A `ContextKey` names a kind of context ("orders", "reporting", ...).
//! Factories look configurations up by exact, case-sensitive key match.

use crate::errors::{DataOnionError, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Caller-supplied identifier of a context kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(String);

impl ContextKey {
    /// Create a key, rejecting empty or whitespace-only names
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DataOnionError::InvalidContextKey {
                reason: "key cannot be empty".to_string(),
            });
        }
        if key.trim() != key {
            return Err(DataOnionError::InvalidContextKey {
                reason: format!("key `{}` has leading or trailing whitespace", key),
            });
        }
        Ok(Self(key))
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the environment variable that overrides this key's
    /// connection string, e.g. `orders-db` -> `DATAONION_CONNECTION_ORDERS_DB`
    pub fn env_var(&self) -> String {
        let suffix: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("DATAONION_CONNECTION_{}", suffix)
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ContextKey {
    type Error = DataOnionError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for ContextKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ContextKey::new(raw).map_err(serde::de::Error::custom)
    }
}
