//! The typed node model.
//!
//! - [`ElementKind`] classifies elements by tag and position
//! - [`Node`] is the generic tree element stored in the arena
//! - [`NodeData`] holds each kind's typed fields and [`ItemBinding`]s
//! - [`normalize`] turns declared and referenced names into symbols
//! - `views` adds read-only traversal helpers to the artifact set

mod binding;
mod data;
mod kind;
mod node;
pub mod normalize;
mod views;

pub use binding::{
    BindingRef, BindingShape, BindingSpec, BindingStatus, ItemBinding, Normalizer, Resolution,
    Slot, TargetSpace, Unresolved, evaluate,
};
pub use data::{DefaultableValue, Multiplicity, NodeData};
pub(crate) use data::ParseInput;
pub use kind::ElementKind;
pub use node::{Node, NodeState, RawElement};
pub use normalize::{RefContext, declared_symbol};
pub use views::ChildItem;
