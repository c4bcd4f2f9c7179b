//! Engine tests
//!
//! - Lifecycle ordering and contract errors
//! - Propagation: deletes, inserts, renames, context dependencies
//! - Idempotence, referential transparency, anti-dependency exactness
//! - Validation findings

pub mod tests_diagnostics;
pub mod tests_propagation;
