//! Reverse index of bindings: "who points at me".
//!
//! Keeps four relations, each with a forward side so a binding's entries can
//! be replaced by diffing rather than scanning:
//! - resolved targets: target node → bindings currently Known against it
//! - context dependencies: consulted node → bindings whose normalization read it
//! - context lookups: symbol → bindings whose normalization looked it up
//! - dangling symbols: symbol → bindings that looked it up and found nothing
//!
//! Lookups are direct map reads, bounded by fan-in.

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::base::{NodeId, Symbol};
use crate::model::BindingRef;

/// Change applied to the target entries of one binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetDelta {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl TargetDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// What one evaluation of a binding depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingDeps {
    pub targets: IndexSet<NodeId>,
    pub context: IndexSet<NodeId>,
    pub dangling: IndexSet<Symbol>,
    /// Symbols looked up while normalizing, whether or not they were found.
    pub lookups: IndexSet<Symbol>,
}

#[derive(Debug, Clone, Default)]
pub struct AntiDependencyIndex {
    /// Reverse index: target → bindings resolved to it
    reverse: FxHashMap<NodeId, FxHashSet<BindingRef>>,
    /// Forward index: binding → its recorded dependencies
    forward: FxHashMap<BindingRef, BindingDeps>,
    /// Consulted node → bindings whose normalization read it
    context: FxHashMap<NodeId, FxHashSet<BindingRef>>,
    /// Undeclared symbol → bindings waiting for it
    waiting: FxHashMap<Symbol, FxHashSet<BindingRef>>,
    /// Symbol consulted during normalization → bindings that looked it up
    lookups: FxHashMap<Symbol, FxHashSet<BindingRef>>,
}

impl AntiDependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything recorded for `binding` with `deps`.
    ///
    /// Stale entries are removed first, then current ones added. Returns the
    /// change to the binding's resolved targets.
    pub fn record(&mut self, binding: BindingRef, deps: BindingDeps) -> TargetDelta {
        let previous = self.forward.remove(&binding).unwrap_or_default();

        let mut delta = TargetDelta::default();
        for target in previous.targets.difference(&deps.targets) {
            remove_entry(&mut self.reverse, target, &binding);
            delta.removed.push(*target);
        }
        for target in deps.targets.difference(&previous.targets) {
            self.reverse.entry(*target).or_default().insert(binding);
            delta.added.push(*target);
        }

        for node in &previous.context {
            remove_entry(&mut self.context, node, &binding);
        }
        for node in &deps.context {
            self.context.entry(*node).or_default().insert(binding);
        }

        for symbol in &previous.dangling {
            remove_entry(&mut self.waiting, symbol, &binding);
        }
        for symbol in &deps.dangling {
            self.waiting
                .entry(symbol.clone())
                .or_default()
                .insert(binding);
        }

        for symbol in &previous.lookups {
            remove_entry(&mut self.lookups, symbol, &binding);
        }
        for symbol in &deps.lookups {
            self.lookups
                .entry(symbol.clone())
                .or_default()
                .insert(binding);
        }

        if !delta.is_empty() {
            trace!(
                "[ANTI_DEPS] {}: +{:?} -{:?}",
                binding, delta.added, delta.removed
            );
        }
        if deps != BindingDeps::default() {
            self.forward.insert(binding, deps);
        }
        delta
    }

    /// Forget a binding entirely (its owner was reparsed or deleted).
    pub fn remove_binding(&mut self, binding: BindingRef) -> TargetDelta {
        self.record(binding, BindingDeps::default())
    }

    /// Drop the entries keyed by a deleted node and return every binding
    /// that depended on it, as a target or as context.
    pub fn remove_target(&mut self, target: NodeId) -> Vec<BindingRef> {
        let mut affected: Vec<BindingRef> = Vec::new();
        if let Some(referencers) = self.reverse.remove(&target) {
            for binding in referencers {
                if let Some(deps) = self.forward.get_mut(&binding) {
                    deps.targets.shift_remove(&target);
                }
                affected.push(binding);
            }
        }
        if let Some(dependents) = self.context.remove(&target) {
            for binding in dependents {
                if let Some(deps) = self.forward.get_mut(&binding) {
                    deps.context.shift_remove(&target);
                }
                affected.push(binding);
            }
        }
        affected.sort();
        affected.dedup();
        trace!("[ANTI_DEPS] removed target {target}: {} affected", affected.len());
        affected
    }

    /// Bindings currently resolved to `target`, sorted.
    pub fn referencers(&self, target: NodeId) -> Vec<BindingRef> {
        sorted(self.reverse.get(&target))
    }

    /// Bindings whose normalization consulted `node`, sorted.
    pub fn context_dependents(&self, node: NodeId) -> Vec<BindingRef> {
        sorted(self.context.get(&node))
    }

    /// Undefined bindings that looked `symbol` up, sorted.
    pub fn waiting_on(&self, symbol: &Symbol) -> Vec<BindingRef> {
        sorted(self.waiting.get(symbol))
    }

    /// Bindings whose normalization looked `symbol` up, sorted.
    pub fn lookup_dependents(&self, symbol: &Symbol) -> Vec<BindingRef> {
        sorted(self.lookups.get(symbol))
    }

    /// Resolved targets recorded for `binding`.
    pub fn targets(&self, binding: BindingRef) -> Vec<NodeId> {
        self.forward
            .get(&binding)
            .map(|deps| deps.targets.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_referencers(&self, target: NodeId) -> bool {
        self.reverse.get(&target).is_some_and(|r| !r.is_empty())
    }

    /// Every target that has at least one referencer.
    pub fn referenced_targets(&self) -> Vec<NodeId> {
        let mut targets: Vec<_> = self.reverse.keys().copied().collect();
        targets.sort();
        targets
    }

    /// Number of (target, binding) pairs.
    pub fn edge_count(&self) -> usize {
        self.reverse.values().map(FxHashSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.reverse.clear();
        self.forward.clear();
        self.context.clear();
        self.waiting.clear();
        self.lookups.clear();
    }
}

fn remove_entry<K, V>(map: &mut FxHashMap<K, FxHashSet<V>>, key: &K, value: &V)
where
    K: std::hash::Hash + Eq,
    V: std::hash::Hash + Eq,
{
    if let Some(entry) = map.get_mut(key) {
        entry.remove(value);
        if entry.is_empty() {
            map.remove(key);
        }
    }
}

fn sorted(entry: Option<&FxHashSet<BindingRef>>) -> Vec<BindingRef> {
    let mut bindings: Vec<_> = entry.into_iter().flatten().copied().collect();
    bindings.sort();
    bindings
}
