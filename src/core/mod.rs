// Core modules implementing the nullable container, its bindings, and error modeling.
pub mod error;
pub mod nullable;
pub mod shape;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod storage;
