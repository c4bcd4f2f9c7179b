//! Foundation types for the edmx engine.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`NodeId`], [`ArtifactId`] - Arena and document identifiers
//! - [`ArtifactKind`] - Conceptual / storage / mapping / designer documents
//! - [`Symbol`] - Normalized, structurally comparable names
//! - [`Position`], [`Span`] - Line/column locations of document fragments
//!
//! This module has NO dependencies on other edmx modules.

mod ids;
mod position;
mod symbol;

pub use ids::{ArtifactId, ArtifactKind, NodeId};
pub use position::{Position, Span};
pub use symbol::{SEPARATOR, Symbol};
