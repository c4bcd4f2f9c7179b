//! # edmx-base
//!
//! Incremental parse, normalize and resolve engine for EDMX documents:
//! conceptual and storage schemas, mappings between them, and designer
//! metadata. Every element moves through
//! `Unparsed → Parsed → Normalized → Resolved`; edits propagate to exactly
//! the references that depend on them.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! interchange → XML reader/writer, EDMX loading, JSON findings export
//!   ↓
//! engine      → ResolutionEngine: transactions, lifecycle passes, propagation
//!   ↓
//! diagnostics → Finding, Severity, codes, lazy Validator
//!   ↓
//! artifact    → ArtifactSet (node arena + symbol index), AntiDependencyIndex
//!   ↓
//! model       → ElementKind, Node, NodeData, ItemBinding, normalizers
//!   ↓
//! syntax      → Fragment document trees, EDMX container splitting
//!   ↓
//! base        → Primitives (NodeId, ArtifactKind, Symbol, Span)
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → model → artifact → engine)
// ============================================================================

/// Foundation types: NodeId, ArtifactId, Symbol, Position/Span
pub mod base;

/// Syntax: Fragment trees and EDMX container splitting
pub mod syntax;

/// Typed node model: kinds, per-kind data, bindings, normalization
pub mod model;

/// Artifact set: node arena, symbol index, anti-dependencies
pub mod artifact;

/// Validation findings and codes
pub mod diagnostics;

/// Resolution engine: lifecycle, transactions, propagation
pub mod engine;

/// Document interchange: XML, EDMX loading, JSON findings
#[cfg(feature = "interchange")]
pub mod interchange;

// Re-export foundation types
pub use base::{ArtifactId, ArtifactKind, NodeId, Position, Span, Symbol};

// Re-export the engine surface
pub use artifact::{AntiDependencyIndex, Artifact, ArtifactSet};
pub use diagnostics::{Finding, FindingKind, FindingSet, Severity, Validator};
pub use engine::{EngineError, EngineOptions, PropagationReport, ResolutionEngine};
pub use model::{BindingRef, BindingStatus, ElementKind, ItemBinding, Node, NodeState};
pub use syntax::Fragment;
