//! Purpose: Define the stable public Rust API boundary for `nullable`.
//! Exports: The container, its record/shape policy, storage binding types, and errors.
//! Role: Public, additive-only surface over `core`.
//! Invariants: Downstream code imports from here rather than from `core` paths.

pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::nullable::Nullable;
pub use crate::core::shape::{Accepts, Record, Shape};
pub use crate::core::storage::{StorageBinding, StorageKind, StorageValue};
