//! One propagation pass per committed transaction.
//!
//! 1. Deleted subtrees leave the arena, the symbol index and the
//!    anti-dependency index; whatever depended on them is queued.
//! 2. Edited and inserted nodes are reparsed; descendants of edited nodes are
//!    renormalized since their scope may have changed.
//! 3. Every symbol that appeared or disappeared queues the bindings waiting
//!    on it, the bindings whose normalization looked it up and the
//!    referencers of its remaining declarations.
//! 4. Reparsed and renormalized nodes are resolved, then every queued owner
//!    is forced back to Normalized and resolved again.
//!
//! Resolution never renormalizes anything, so the pass terminates after one
//! round.

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use super::{EngineError, ResolutionEngine, Transaction};
use crate::base::{NodeId, Symbol};
use crate::model::{BindingRef, NodeState};

/// What one commit touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Nodes deleted, subtrees included.
    pub removed: Vec<NodeId>,
    /// Nodes parsed again from raw content.
    pub reparsed: Vec<NodeId>,
    /// Descendants of edited nodes whose symbol was recomputed.
    pub renormalized: Vec<NodeId>,
    /// Nodes whose bindings alone were re-resolved.
    pub rebound: Vec<NodeId>,
    /// Symbols that gained or lost a declaration.
    pub changed_symbols: Vec<Symbol>,
}

impl PropagationReport {
    /// Every node resolved by the pass, in document order per group.
    pub fn resolved(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.reparsed
            .iter()
            .chain(&self.renormalized)
            .chain(&self.rebound)
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.reparsed.is_empty()
            && self.renormalized.is_empty()
            && self.rebound.is_empty()
    }
}

fn queue_dependents(engine: &ResolutionEngine, id: NodeId, queue: &mut IndexSet<NodeId>) {
    let index = engine.set.anti_dependencies();
    let owners = index
        .referencers(id)
        .into_iter()
        .chain(index.context_dependents(id))
        .map(|b: BindingRef| b.owner);
    queue.extend(owners);
}

pub(super) fn commit(
    engine: &mut ResolutionEngine,
    transaction: Transaction,
) -> Result<PropagationReport, EngineError> {
    let mut report = PropagationReport::default();
    let mut touched: IndexSet<Symbol> = IndexSet::new();
    let mut queue: IndexSet<NodeId> = IndexSet::new();

    // Deletions
    for &root in &transaction.deleted {
        if !engine.set.contains(root) {
            continue;
        }
        let removed = engine.set.remove_subtree(root);
        for node in &removed {
            if let Some(symbol) = node.symbol() {
                engine.set.unregister_symbol(symbol, node.id());
                if !symbol.is_empty() {
                    touched.insert(symbol.clone());
                }
            }
            for binding in node.bindings() {
                engine
                    .set
                    .anti_dependencies_mut()
                    .remove_binding(BindingRef::new(node.id(), binding.role()));
            }
        }
        for node in &removed {
            let affected = engine.set.anti_dependencies_mut().remove_target(node.id());
            queue.extend(affected.into_iter().map(|b| b.owner));
            report.removed.push(node.id());
        }
    }
    for &artifact in &transaction.unloaded {
        if let Some(unloaded) = engine.set.remove_artifact(artifact) {
            info!("[ENGINE] unloaded {}", unloaded.uri());
        }
    }

    // Reparse edited and inserted nodes
    let mut reparse: IndexSet<NodeId> = transaction
        .edited
        .iter()
        .copied()
        .filter(|&id| engine.set.contains(id))
        .collect();
    for &root in &transaction.inserted {
        if engine.set.contains(root) {
            reparse.extend(engine.set.subtree(root));
        }
    }
    let mut reparse: Vec<NodeId> = reparse.into_iter().collect();
    engine.set.sort_by_document_order(&mut reparse);
    let reparsed: FxHashSet<NodeId> = reparse.iter().copied().collect();

    let mut previous: FxHashMap<NodeId, Option<Symbol>> = FxHashMap::default();
    for &id in &reparse {
        queue_dependents(engine, id, &mut queue);
        previous.insert(id, engine.parse_node(id)?);
    }

    // Renormalize below edited nodes
    let mut renormalize: IndexSet<NodeId> = IndexSet::new();
    for &id in &transaction.edited {
        for descendant in engine.set.subtree(id).into_iter().skip(1) {
            let ready = engine
                .set
                .state(descendant)
                .is_some_and(|s| s >= NodeState::Parsed);
            if ready && !reparsed.contains(&descendant) {
                renormalize.insert(descendant);
            }
        }
    }
    let mut renormalize: Vec<NodeId> = renormalize.into_iter().collect();
    engine.set.sort_by_document_order(&mut renormalize);

    let mut work: Vec<NodeId> = reparse.iter().chain(&renormalize).copied().collect();
    engine.set.sort_by_document_order(&mut work);
    for &id in &work {
        let (current, symbol) = engine.normalize_node(id)?;
        let before = previous.remove(&id).unwrap_or(current);
        if before != symbol {
            touched.extend(before.into_iter().chain(symbol).filter(|s| !s.is_empty()));
            if !reparsed.contains(&id) {
                queue_dependents(engine, id, &mut queue);
            }
        }
    }

    // Symbols that appeared or disappeared
    for symbol in &touched {
        if engine.options.rebind_waiting_references {
            let waiting = engine.set.anti_dependencies().waiting_on(symbol);
            queue.extend(waiting.into_iter().map(|b| b.owner));
        }
        let looked_up = engine.set.anti_dependencies().lookup_dependents(symbol);
        queue.extend(looked_up.into_iter().map(|b| b.owner));
        for candidate in engine.set.lookup(symbol) {
            queue_dependents(engine, candidate, &mut queue);
        }
    }

    // Resolve
    for &id in &work {
        engine.resolve_node(id)?;
    }
    let in_work: FxHashSet<NodeId> = work.iter().copied().collect();
    let mut rebound: Vec<NodeId> = queue
        .into_iter()
        .filter(|id| !in_work.contains(id))
        .filter(|&id| {
            engine
                .set
                .state(id)
                .is_some_and(|s| s >= NodeState::Normalized)
        })
        .collect();
    engine.set.sort_by_document_order(&mut rebound);
    for &id in &rebound {
        if let Some(node) = engine.set.node_mut(id) {
            node.state = NodeState::Normalized;
        }
        engine.resolve_node(id)?;
    }

    report.reparsed = reparse;
    report.renormalized = renormalize;
    report.rebound = rebound;
    report.changed_symbols = touched.into_iter().collect();
    debug!(
        "[ENGINE] commit: {} removed, {} reparsed, {} renormalized, {} rebound, {} symbols changed",
        report.removed.len(),
        report.reparsed.len(),
        report.renormalized.len(),
        report.rebound.len(),
        report.changed_symbols.len()
    );
    Ok(report)
}
