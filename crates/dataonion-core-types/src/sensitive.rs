//! Sensitive data marker for automatic redaction
//!
//! Connection strings routinely carry credentials. `Sensitive<T>` keeps
//! them out of `Debug`/`Display` output, and therefore out of the logs.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use dataonion_core_types::Sensitive;
///
/// let conn = Sensitive::new("Data Source=app.db;Password=hunter2");
/// assert_eq!(format!("{:?}", conn), "***REDACTED***");
/// assert_eq!(format!("{}", conn), "***REDACTED***");
///
/// // Access the actual value when needed
/// assert_eq!(conn.expose(), &"Data Source=app.db;Password=hunter2");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only call this where the raw value is actually consumed
    /// (e.g. when opening a connection).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: PartialEq> PartialEq for Sensitive<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Eq> Eq for Sensitive<T> {}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("Server=db;Password=my-secret-password");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "***REDACTED***");
        assert!(!debug_str.contains("my-secret-password"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let secret = Sensitive::new("Data Source=orders.db");
        let display_str = format!("{}", secret);
        assert_eq!(display_str, "***REDACTED***");
        assert!(!display_str.contains("orders"));
    }

    #[test]
    fn test_sensitive_expose_and_into_inner() {
        let secret = Sensitive::new(String::from("test"));
        assert_eq!(secret.expose(), "test");
        assert_eq!(secret.into_inner(), "test");
    }

    #[test]
    fn test_sensitive_equality() {
        let a = Sensitive::new(String::from("x"));
        let b = Sensitive::from(String::from("x"));
        assert_eq!(a, b);
        assert_eq!(a.clone(), b);
    }

    #[test]
    fn test_sensitive_deserialize_is_transparent() {
        #[derive(serde::Deserialize)]
        struct Entry {
            connection_string: Sensitive<String>,
        }

        let entry: Entry =
            serde_json::from_str(r#"{"connection_string":"Data Source=:memory:"}"#).unwrap();
        assert_eq!(entry.connection_string.expose(), "Data Source=:memory:");
    }

    #[test]
    fn test_sensitive_with_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Entry {
            key: String,
            connection_string: Sensitive<String>,
        }

        let entry = Entry {
            key: "orders".to_string(),
            connection_string: Sensitive::new("Password=secret123".to_string()),
        };

        let debug_str = format!("{:?}", entry);
        assert!(debug_str.contains("orders"));
        assert!(debug_str.contains("***REDACTED***"));
        assert!(!debug_str.contains("secret123"));
    }
}
