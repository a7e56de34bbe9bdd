//! Core types shared across DataOnion facilities
//!
//! This crate provides foundational types used by the error, logging and
//! store layers:
//!
//! - **Identity types**: ContextId for tracking a context through its lifecycle
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod identity;
pub mod schema;
pub mod sensitive;

pub use identity::ContextId;
pub use sensitive::Sensitive;
