//! One-time initialization guard
//!
//! Records whether an initializer has already succeeded. The check, the
//! initializer and the update all happen under one lock, so concurrent
//! first use runs the initializer exactly once. A failed (or panicking)
//! initializer leaves the guard unset and the next caller tries again.
//!
//! Other threads block while an initializer runs. The running thread itself
//! gets an error instead if it re-enters the guard, e.g. an initializer
//! calling `create` on the factory that is initializing it.

use crate::errors::{reentrant_initialization, Result};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::ThreadId;

/// At-most-once initialization flag, set on first success and never reset
#[derive(Debug, Default)]
pub struct InitializationGuard {
    initialized: Mutex<bool>,
    running_on: Mutex<Option<ThreadId>>,
}

impl InitializationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new guard ready to be shared between factories
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Whether an initializer has succeeded through this guard
    pub fn is_initialized(&self) -> bool {
        // The flag is only written after success, so a poisoned lock still
        // holds a trustworthy value
        *self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `init` unless the guard is already set
    ///
    /// Returns `Ok(true)` when `init` ran and succeeded, `Ok(false)` when it
    /// was skipped.
    ///
    /// # Errors
    ///
    /// - whatever `init` returns
    /// - `InitializerFailed`: called from inside a running `init` on the
    ///   same guard
    pub fn run_once<F>(&self, init: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        let current = std::thread::current().id();
        if *self
            .running_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            == Some(current)
        {
            return Err(reentrant_initialization());
        }

        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if *initialized {
            return Ok(false);
        }

        let _running = RunningMark::set(&self.running_on, current);
        init()?;
        *initialized = true;
        Ok(true)
    }
}

/// Records the thread running an initializer; cleared on drop, panics included
struct RunningMark<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> RunningMark<'a> {
    fn set(slot: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread);
        Self(slot)
    }
}

impl Drop for RunningMark<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
