//! Context factory
//!
//! `DbContextFactory` turns a context key into a freshly opened
//! [`DbContext`], using the connection string registered for that key. The
//! first context a factory successfully creates is also initialized with
//! its configuration's initializer; every later context skips that step.
//!
//! ## Logging Ownership
//!
//! The factory owns lifecycle logging for `context_create` and
//! `context_initialize`. Connection and migration code only emits
//! `tracing::debug!()` details.

use crate::connection_string::ConnectionString;
use crate::context::DbContext;
use crate::errors::{initializer_failed, Result};
use crate::guard::InitializationGuard;
use crate::initializer::DatabaseInitializer;
use dataonion_core::errors::DataOnionError;
use dataonion_core::{log_op_end, log_op_error, log_op_start};
use dataonion_core::{ContextKey, FactorySettings};
use dataonion_core_types::schema::{OP_CONTEXT_CREATE, OP_CONTEXT_INITIALIZE};
use dataonion_core_types::Sensitive;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// One configuration entry: key, connection string and initializer
#[derive(Clone)]
pub struct ContextConfig {
    key: ContextKey,
    connection_string: Sensitive<String>,
    initializer: Arc<dyn DatabaseInitializer>,
}

impl ContextConfig {
    pub fn new<I>(key: ContextKey, connection_string: impl Into<String>, initializer: I) -> Self
    where
        I: DatabaseInitializer + 'static,
    {
        Self::with_shared_initializer(key, connection_string, Arc::new(initializer))
    }

    /// Like [`ContextConfig::new`] for an initializer shared between entries
    pub fn with_shared_initializer(
        key: ContextKey,
        connection_string: impl Into<String>,
        initializer: Arc<dyn DatabaseInitializer>,
    ) -> Self {
        Self {
            key,
            connection_string: Sensitive::new(connection_string.into()),
            initializer,
        }
    }

    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    pub fn connection_string(&self) -> &Sensitive<String> {
        &self.connection_string
    }

    pub fn initializer(&self) -> &dyn DatabaseInitializer {
        self.initializer.as_ref()
    }
}

impl fmt::Debug for ContextConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextConfig")
            .field("key", &self.key)
            .field("connection_string", &self.connection_string)
            .field("initializer", &self.initializer.name())
            .finish()
    }
}

/// Creates contexts from a fixed, non-empty set of configurations
#[derive(Debug)]
pub struct DbContextFactory {
    configs: Vec<ContextConfig>,
    guard: Arc<InitializationGuard>,
}

impl DbContextFactory {
    /// Create a factory with its own initialization guard
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration`: `configs` is empty
    pub fn new(configs: Vec<ContextConfig>) -> Result<Self> {
        Self::with_guard(configs, InitializationGuard::shared())
    }

    /// Create a factory sharing `guard` with other factories, so that only
    /// one initializer runs across all of them
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration`: `configs` is empty
    pub fn with_guard(configs: Vec<ContextConfig>, guard: Arc<InitializationGuard>) -> Result<Self> {
        if configs.is_empty() {
            return Err(DataOnionError::NoConfigurations.into());
        }

        let mut seen = HashSet::new();
        for config in &configs {
            if !seen.insert(config.key()) {
                tracing::warn!(
                    context_key = %config.key(),
                    "Duplicate context configuration; only the first entry is used"
                );
            }
        }

        Ok(Self { configs, guard })
    }

    /// Build a factory from loaded settings, asking `resolver` for each
    /// context's initializer
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration`: settings contain no contexts
    pub fn from_settings<F>(settings: FactorySettings, mut resolver: F) -> Result<Self>
    where
        F: FnMut(&ContextKey) -> Arc<dyn DatabaseInitializer>,
    {
        let configs = settings
            .contexts
            .into_iter()
            .map(|entry| {
                let initializer = resolver(&entry.key);
                ContextConfig::with_shared_initializer(
                    entry.key,
                    entry.connection_string.into_inner(),
                    initializer,
                )
            })
            .collect();
        Self::new(configs)
    }

    /// Create a new context for `key`
    ///
    /// The very first successful creation through this factory's guard runs
    /// the matching configuration's initializer before returning.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no configuration registered for `key`
    /// - `InvalidConnectionString`: the configured connection string is malformed
    /// - `Persistence`: the database could not be opened
    /// - `InitializerFailed`: the one-time initializer failed (the guard stays unset)
    pub fn create(&self, key: &ContextKey) -> Result<DbContext> {
        log_op_start!(OP_CONTEXT_CREATE, context_key = key.as_str());
        let start = Instant::now();

        let context = self.create_impl(key).map_err(|e| {
            log_op_error!(
                OP_CONTEXT_CREATE,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                context_key = key.as_str()
            );
            e
        })?;

        log_op_end!(
            OP_CONTEXT_CREATE,
            duration_ms = start.elapsed().as_millis() as u64,
            context_key = key.as_str(),
            context_id = context.id().as_str()
        );

        Ok(context)
    }

    fn create_impl(&self, key: &ContextKey) -> Result<DbContext> {
        let config = self
            .config(key)
            .ok_or_else(|| DataOnionError::ConfigurationNotFound {
                key: key.to_string(),
            })?;

        let connection_string = ConnectionString::parse(config.connection_string().expose())?;
        tracing::debug!(
            context_key = %key,
            data_source = connection_string.data_source(),
            "Creating new context"
        );

        let mut context = DbContext::open(key.clone(), connection_string)?;
        self.guard
            .run_once(|| Self::initialize(config, &mut context))?;

        Ok(context)
    }

    fn initialize(config: &ContextConfig, context: &mut DbContext) -> Result<()> {
        let key = config.key().as_str();
        let initializer = config.initializer();

        log_op_start!(
            OP_CONTEXT_INITIALIZE,
            context_key = key,
            initializer = initializer.name()
        );
        let start = Instant::now();

        initializer
            .initialize(context)
            .map_err(|e| initializer_failed(key, initializer.name(), e))
            .map_err(|e| {
                log_op_error!(
                    OP_CONTEXT_INITIALIZE,
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    context_key = key
                );
                e
            })?;

        log_op_end!(
            OP_CONTEXT_INITIALIZE,
            duration_ms = start.elapsed().as_millis() as u64,
            context_key = key
        );
        Ok(())
    }

    /// First configuration registered for `key`
    pub fn config(&self, key: &ContextKey) -> Option<&ContextConfig> {
        self.configs.iter().find(|c| c.key() == key)
    }

    /// Configured keys, in registration order
    pub fn keys(&self) -> impl Iterator<Item = &ContextKey> {
        self.configs.iter().map(ContextConfig::key)
    }

    /// Whether the one-time initializer has already run
    pub fn is_initialized(&self) -> bool {
        self.guard.is_initialized()
    }

    pub fn guard(&self) -> &Arc<InitializationGuard> {
        &self.guard
    }
}
