//! Item bindings: lazily resolved references from one node to others.
//!
//! A binding is declared by a static [`BindingSpec`] (role, shape, expected
//! target kinds, normalizer) and carries the raw reference text read during
//! Parse. Resolution is a pure function of the raw text and the current
//! [`ArtifactSet`] contents; see [`evaluate`].

use indexmap::IndexSet;
use tracing::trace;

use super::kind::ElementKind;
use super::normalize::RefContext;
use crate::artifact::ArtifactSet;
use crate::base::{ArtifactKind, NodeId, Symbol};

/// Turns reference text into a symbol, given the referencing context.
pub type Normalizer = fn(&str, &RefContext<'_>) -> Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum BindingStatus {
    /// Not evaluated since the last invalidation.
    #[default]
    Unknown,
    Known,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingShape {
    Single,
    /// Separator-delimited list of references, resolved slot by slot.
    List,
}

/// Which documents a binding may resolve into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSpace {
    /// Same artifact kind as the owner (conceptual to conceptual).
    Owner,
    Kind(ArtifactKind),
}

#[derive(Debug)]
pub struct BindingSpec {
    /// Attribute holding the raw reference.
    pub role: &'static str,
    pub shape: BindingShape,
    /// An absent optional reference is Undefined without a finding.
    pub optional: bool,
    pub expected: &'static [ElementKind],
    pub space: TargetSpace,
    pub normalizer: Normalizer,
}

/// Identity of a binding: its owning node and role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingRef {
    pub owner: NodeId,
    pub role: &'static str,
}

impl BindingRef {
    pub fn new(owner: NodeId, role: &'static str) -> Self {
        Self { owner, role }
    }
}

impl std::fmt::Display for BindingRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.owner, self.role)
    }
}

/// Why a slot did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// Blank reference text; no lookup was made.
    Empty,
    NotFound,
    /// Something is declared under the symbol, but of another kind.
    WrongKind(ElementKind),
}

/// One resolved position of a binding. Single bindings have one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub raw: String,
    pub symbol: Symbol,
    pub status: BindingStatus,
    pub target: Option<NodeId>,
    /// Compatible candidates found; more than one is an ambiguity.
    pub candidates: usize,
    pub reason: Option<Unresolved>,
}

impl Slot {
    fn undefined(raw: &str, symbol: Symbol, reason: Unresolved) -> Self {
        Self {
            raw: raw.to_string(),
            symbol,
            status: BindingStatus::Undefined,
            target: None,
            candidates: 0,
            reason: Some(reason),
        }
    }
}

/// Outcome of evaluating one binding, before it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: BindingStatus,
    pub slots: Vec<Slot>,
    /// Nodes the normalizer consulted besides the target.
    pub consulted: Vec<NodeId>,
    /// Symbols the normalizer looked up for context, found or not.
    pub lookups: Vec<Symbol>,
}

impl Resolution {
    /// Distinct resolved targets, in slot order.
    pub fn targets(&self) -> IndexSet<NodeId> {
        self.slots.iter().filter_map(|s| s.target).collect()
    }

    /// Symbols of slots that found nothing and may appear later.
    pub fn dangling(&self) -> IndexSet<Symbol> {
        self.slots
            .iter()
            .filter(|s| s.status == BindingStatus::Undefined && !s.symbol.is_empty())
            .map(|s| s.symbol.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ItemBinding {
    spec: &'static BindingSpec,
    raw: Option<String>,
    slots: Vec<Slot>,
    status: BindingStatus,
}

impl ItemBinding {
    pub fn new(spec: &'static BindingSpec, raw: Option<String>) -> Self {
        Self {
            spec,
            raw,
            slots: Vec::new(),
            status: BindingStatus::Unknown,
        }
    }

    pub fn spec(&self) -> &'static BindingSpec {
        self.spec
    }

    pub fn role(&self) -> &'static str {
        self.spec.role
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// True when no reference text was written.
    pub fn is_absent(&self) -> bool {
        self.raw.as_deref().is_none_or(|r| r.trim().is_empty())
    }

    /// The individual reference texts, in declaration order.
    pub fn raw_refs(&self, separator: char) -> Vec<&str> {
        let Some(raw) = self.raw.as_deref() else {
            return Vec::new();
        };
        match self.spec.shape {
            BindingShape::Single => vec![raw.trim()],
            BindingShape::List => raw.split(separator).map(str::trim).collect(),
        }
    }

    pub fn status(&self) -> BindingStatus {
        self.status
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The target of a Known single binding.
    pub fn target(&self) -> Option<NodeId> {
        match self.status {
            BindingStatus::Known => self.slots.first().and_then(|s| s.target),
            _ => None,
        }
    }

    /// Every currently resolved target, Undefined slots skipped.
    pub fn targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().filter_map(|s| s.target)
    }

    pub(crate) fn apply(&mut self, resolution: Resolution) {
        self.status = resolution.status;
        self.slots = resolution.slots;
    }
}

/// Evaluate `binding` owned by `owner` against the current set contents.
///
/// Pure: the set is not modified, and the same raw text over the same
/// contents always yields the same resolution.
pub fn evaluate(
    set: &ArtifactSet,
    owner: NodeId,
    binding: &ItemBinding,
    separator: char,
) -> Resolution {
    let cx = RefContext::new(set, owner, separator);
    let owner_space = set
        .node(owner)
        .and_then(|n| set.artifact(n.artifact()))
        .map(|a| a.kind());

    let refs = binding.raw_refs(separator);
    let mut slots = Vec::with_capacity(refs.len().max(1));
    if refs.is_empty() {
        slots.push(Slot::undefined("", Symbol::empty(), Unresolved::Empty));
    }
    for raw in refs {
        if raw.is_empty() {
            slots.push(Slot::undefined(raw, Symbol::empty(), Unresolved::Empty));
            continue;
        }
        let symbol = (binding.spec.normalizer)(raw, &cx);
        slots.push(resolve_slot(set, binding.spec, owner_space, raw, symbol));
    }

    let status = if slots.iter().all(|s| s.status == BindingStatus::Known) {
        BindingStatus::Known
    } else {
        BindingStatus::Undefined
    };
    trace!(
        "[BIND] {} {} -> {:?} ({} slots)",
        owner,
        binding.role(),
        status,
        slots.len()
    );
    let (consulted, lookups) = cx.into_dependencies();
    Resolution {
        status,
        slots,
        consulted,
        lookups,
    }
}

fn resolve_slot(
    set: &ArtifactSet,
    spec: &BindingSpec,
    owner_space: Option<ArtifactKind>,
    raw: &str,
    symbol: Symbol,
) -> Slot {
    if symbol.is_empty() {
        return Slot::undefined(raw, symbol, Unresolved::Empty);
    }

    let found = set.lookup(&symbol);
    let mut compatible = found.iter().copied().filter(|&id| {
        set.node(id).is_some_and(|node| {
            let space = set.artifact(node.artifact()).map(|a| a.kind());
            let in_space = match spec.space {
                TargetSpace::Owner => space == owner_space,
                TargetSpace::Kind(kind) => space == Some(kind),
            };
            in_space && spec.expected.contains(&node.kind())
        })
    });

    match compatible.next() {
        Some(first) => Slot {
            raw: raw.to_string(),
            symbol,
            status: BindingStatus::Known,
            target: Some(first),
            candidates: 1 + compatible.count(),
            reason: None,
        },
        None => {
            let reason = found
                .first()
                .and_then(|&id| set.node(id))
                .map(|n| Unresolved::WrongKind(n.kind()))
                .unwrap_or(Unresolved::NotFound);
            Slot::undefined(raw, symbol, reason)
        }
    }
}
