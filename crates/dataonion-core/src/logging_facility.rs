//! Structured logging for context lifecycles
//!
//! - [`init`] installs the process subscriber for a [`Profile`]
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit lifecycle events
//! - [`test_capture`] records lifecycle events for assertions
//!
//! The factory and collections own lifecycle events (`context_create`,
//! `context_initialize`, `collection_dispose`); connection and migration
//! code below them only emits `tracing::debug!` details.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
