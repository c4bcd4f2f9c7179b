//! Syntax: the caller-supplied document tree.
//!
//! The engine consumes [`Fragment`] trees only; how bytes become fragments is
//! the loader's concern (see `interchange` for the XML loader).

pub mod edmx;
mod fragment;

pub use edmx::{detect_kind, split_edmx};
pub use fragment::Fragment;

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
