//! Purpose: Nullable record container with JSON document and relational storage bindings.
//! Exports: `api` (stable surface), `core` (container, shape policy, storage binding, errors).
//! Role: Library backing the conformance runner and downstream data models.
//! Invariants: Presence is carried only by the container's flag, never by sentinel inner values.
//! Invariants: Every failing decode or scan leaves the container absent.
pub mod api;
pub mod core;
mod json;
