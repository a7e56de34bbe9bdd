//! Context collections
//!
//! A collection hands out at most one context per key during its lifetime
//! and owns every context it created. Disposing (or dropping) the
//! collection releases them all together.

use crate::context::DbContext;
use crate::errors::Result;
use crate::factory::DbContextFactory;
use dataonion_core::ContextKey;
use dataonion_core::{log_op_end, log_op_error, log_op_start};
use dataonion_core_types::schema::OP_COLLECTION_DISPOSE;
use std::time::Instant;

/// Lazily created, per-key memoized contexts
pub trait DbContextCollection {
    /// Get the context for `key`, creating it on first request
    ///
    /// # Errors
    ///
    /// Whatever creating the context fails with (see
    /// [`DbContextFactory::create`]); nothing is cached on failure.
    fn get(&mut self, key: &ContextKey) -> Result<&mut DbContext>;

    /// Release every context the collection created
    ///
    /// All contexts are released even when some fail to close; the first
    /// failure is returned. On success returns how many were released.
    fn dispose(self) -> Result<usize>
    where
        Self: Sized;
}

/// Collection backed by a [`DbContextFactory`]
#[derive(Debug)]
pub struct LazyDbContextCollection<'f> {
    factory: &'f DbContextFactory,
    contexts: Vec<DbContext>,
}

impl<'f> LazyDbContextCollection<'f> {
    pub fn new(factory: &'f DbContextFactory) -> Self {
        Self {
            factory,
            contexts: Vec::new(),
        }
    }

    /// Number of contexts created so far
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Whether a context for `key` has been created
    pub fn contains(&self, key: &ContextKey) -> bool {
        self.contexts.iter().any(|c| c.key() == key)
    }
}

impl DbContextCollection for LazyDbContextCollection<'_> {
    fn get(&mut self, key: &ContextKey) -> Result<&mut DbContext> {
        if let Some(index) = self.contexts.iter().position(|c| c.key() == key) {
            return Ok(&mut self.contexts[index]);
        }

        let context = self.factory.create(key)?;
        let index = self.contexts.len();
        self.contexts.push(context);
        Ok(&mut self.contexts[index])
    }

    fn dispose(self) -> Result<usize> {
        let count = self.contexts.len();
        log_op_start!(OP_COLLECTION_DISPOSE, context_count = count);
        let start = Instant::now();

        let mut first_error = None;
        for context in self.contexts {
            if let Err(e) = context.dispose() {
                tracing::debug!(error = %e, "Context failed to close");
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            log_op_error!(
                OP_COLLECTION_DISPOSE,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(e);
        }

        log_op_end!(
            OP_COLLECTION_DISPOSE,
            duration_ms = start.elapsed().as_millis() as u64,
            context_count = count
        );
        Ok(count)
    }
}
