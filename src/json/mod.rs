//! Purpose: Internal JSON parsing boundary shared by the document and storage bindings.
//! Exports: `parse` module with probe and error-categorization helpers.
//! Role: Single seam for parser details so callsites avoid ad hoc decode logic.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
