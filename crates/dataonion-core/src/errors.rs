use thiserror::Error;

/// Result type alias using DataOnionError
pub type Result<T> = std::result::Result<T, DataOnionError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers and tests can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    InvalidInput,
    InvalidConfiguration,
    InvalidConnectionString,
    NotFound,

    // Initialization
    InitializerFailed,
    ConstraintViolation,

    // Integration/IO
    Io,
    Persistence,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfiguration => "ERR_INVALID_CONFIGURATION",
            ExErrorKind::InvalidConnectionString => "ERR_INVALID_CONNECTION_STRING",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InitializerFailed => "ERR_INITIALIZER_FAILED",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus the
/// operation and context key it happened in.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (the context key for factory errors)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (context: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors raised while configuring factories and creating contexts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataOnionError {
    /// Factory constructed without any context configuration
    #[error("At least one db context configuration must be specified for DbContextFactory")]
    NoConfigurations,

    /// No configuration registered for the requested key
    #[error("Could not find any configurations for context `{key}`")]
    ConfigurationNotFound { key: String },

    /// Context key is empty or otherwise unusable
    #[error("Invalid context key: {reason}")]
    InvalidContextKey { reason: String },

    /// Connection string could not be parsed
    #[error("Invalid connection string: {reason}")]
    InvalidConnectionString { reason: String },

    /// The one-time initializer returned an error
    #[error("Initializer for context `{key}` failed: {reason}")]
    InitializerFailed { key: String, reason: String },

    /// Settings file could not be read or parsed
    #[error("Failed to load settings from {path}: {reason}")]
    ConfigFile { path: String, reason: String },
}

impl From<DataOnionError> for ExError {
    fn from(err: DataOnionError) -> Self {
        match err {
            DataOnionError::NoConfigurations => {
                ExError::new(ExErrorKind::InvalidConfiguration)
                    .with_op("factory_new")
                    .with_message(DataOnionError::NoConfigurations.to_string())
            }

            DataOnionError::ConfigurationNotFound { key } => ExError::new(ExErrorKind::NotFound)
                .with_op("context_create")
                .with_message(format!(
                    "Could not find any configurations for context `{}`",
                    key
                ))
                .with_entity_id(key),

            DataOnionError::InvalidContextKey { reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_message(format!("Invalid context key: {}", reason))
            }

            DataOnionError::InvalidConnectionString { reason } => {
                ExError::new(ExErrorKind::InvalidConnectionString)
                    .with_op("connection_string_parse")
                    .with_message(reason)
            }

            DataOnionError::InitializerFailed { key, reason } => {
                ExError::new(ExErrorKind::InitializerFailed)
                    .with_op("context_initialize")
                    .with_message(reason)
                    .with_entity_id(key)
            }

            DataOnionError::ConfigFile { path, reason } => {
                ExError::new(ExErrorKind::InvalidConfiguration)
                    .with_op("settings_load")
                    .with_message(format!("{}: {}", path, reason))
            }
        }
    }
}
