//! Artifacts and the resolution universe.
//!
//! An [`ArtifactSet`] owns every loaded document, the node arena they share,
//! the Symbol → nodes index and the [`AntiDependencyIndex`]. Nodes are
//! addressed by [`NodeId`]; a deleted node's slot stays empty so stale ids
//! simply stop resolving.
//!
//! The set only offers reads publicly. Mutation goes through the
//! [`ResolutionEngine`](crate::engine::ResolutionEngine), which keeps node
//! state, the symbol index and the anti-dependency index in step.

mod anti_deps;

pub use anti_deps::{AntiDependencyIndex, BindingDeps, TargetDelta};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::base::{ArtifactId, ArtifactKind, NodeId, Symbol};
use crate::model::{BindingRef, BindingStatus, ElementKind, ItemBinding, Node, NodeState, RawElement};
use crate::syntax::Fragment;

/// One loaded document.
#[derive(Debug, Clone)]
pub struct Artifact {
    id: ArtifactId,
    uri: String,
    kind: ArtifactKind,
    root: Option<NodeId>,
}

impl Artifact {
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }
}

#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: IndexMap<ArtifactId, Artifact>,
    next_artifact: u32,
    nodes: Vec<Option<Node>>,
    symbols: FxHashMap<Symbol, Vec<NodeId>>,
    anti_deps: AntiDependencyIndex,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Artifacts
    // ========================================================================

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    pub fn artifact(&self, id: ArtifactId) -> Option<&Artifact> {
        self.artifacts.get(&id)
    }

    pub fn artifact_by_uri(&self, uri: &str) -> Option<&Artifact> {
        self.artifacts.values().find(|a| a.uri == uri)
    }

    pub(crate) fn add_artifact(&mut self, uri: impl Into<String>, kind: ArtifactKind) -> ArtifactId {
        let id = ArtifactId(self.next_artifact);
        self.next_artifact += 1;
        self.artifacts.insert(
            id,
            Artifact {
                id,
                uri: uri.into(),
                kind,
                root: None,
            },
        );
        id
    }

    pub(crate) fn set_root(&mut self, artifact: ArtifactId, root: Option<NodeId>) {
        if let Some(a) = self.artifacts.get_mut(&artifact) {
            a.root = root;
        }
    }

    pub(crate) fn remove_artifact(&mut self, artifact: ArtifactId) -> Option<Artifact> {
        self.artifacts.shift_remove(&artifact)
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Live nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.node(id).map(Node::state)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.node(id).and_then(Node::parent);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.node(id).and_then(Node::parent);
            Some(id)
        })
    }

    /// Nearest strict ancestor of the given kind.
    pub fn enclosing(&self, id: NodeId, kind: ElementKind) -> Option<&Node> {
        self.ancestors(id)
            .filter_map(|a| self.node(a))
            .find(|n| n.kind() == kind)
    }

    /// `id` and all its descendants, pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.node(next) else {
                continue;
            };
            out.push(next);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Every live node, artifacts in load order, each in document order.
    pub fn document_order(&self) -> Vec<NodeId> {
        self.artifacts
            .values()
            .filter_map(|a| a.root)
            .flat_map(|root| self.subtree(root))
            .collect()
    }

    /// Sort key placing nodes in document declaration order across artifacts.
    pub fn order_key(&self, id: NodeId) -> (usize, Vec<usize>) {
        let Some(node) = self.node(id) else {
            return (usize::MAX, Vec::new());
        };
        let artifact = self
            .artifacts
            .get_index_of(&node.artifact())
            .unwrap_or(usize::MAX);
        let mut path = Vec::new();
        let mut current = id;
        for parent in self.ancestors(id) {
            let index = self
                .node(parent)
                .and_then(|p| p.children().iter().position(|&c| c == current))
                .unwrap_or(usize::MAX);
            path.push(index);
            current = parent;
        }
        path.reverse();
        (artifact, path)
    }

    pub(crate) fn sort_by_document_order(&self, ids: &mut [NodeId]) {
        ids.sort_by_cached_key(|&id| self.order_key(id));
    }

    /// Build nodes for a fragment tree, returning the subtree root.
    ///
    /// New nodes are Unparsed; the caller is responsible for attaching the
    /// root to `parent`'s child list.
    pub(crate) fn build_subtree(
        &mut self,
        artifact: ArtifactId,
        parent: Option<NodeId>,
        fragment: Fragment,
    ) -> NodeId {
        let artifact_kind = self
            .artifact(artifact)
            .map(Artifact::kind)
            .unwrap_or(ArtifactKind::Conceptual);
        let kind = match parent.and_then(|p| self.node(p)) {
            Some(p) => {
                let outer = p.parent().and_then(|g| self.node(g)).map(Node::kind);
                p.kind().classify_nested(outer, &fragment.tag)
            }
            None => ElementKind::root(artifact_kind, &fragment.tag),
        };

        let Fragment {
            tag,
            prefix,
            attributes,
            text,
            children,
            span,
        } = fragment;
        let (inline, nested): (Vec<_>, Vec<_>) =
            children.into_iter().partition(|c| kind.absorbs(&c.tag));

        let id = NodeId::new(self.nodes.len());
        let raw = RawElement {
            tag,
            prefix,
            attributes,
            text,
            inline,
            span,
        };
        self.nodes
            .push(Some(Node::new(id, artifact, parent, kind, raw)));

        let children: Vec<NodeId> = nested
            .into_iter()
            .map(|child| self.build_subtree(artifact, Some(id), child))
            .collect();
        if let Some(node) = self.node_mut(id) {
            node.children = children;
        }
        id
    }

    /// Attach `child` under `parent` at `index` (clamped; `None` appends).
    pub(crate) fn attach(&mut self, parent: NodeId, index: Option<usize>, child: NodeId) {
        if let Some(node) = self.node_mut(parent) {
            let at = index.unwrap_or(node.children.len()).min(node.children.len());
            node.children.insert(at, child);
        }
    }

    /// Detach and drop a subtree, returning the removed nodes in pre-order.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Vec<Node> {
        let ids = self.subtree(id);
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let (parent, artifact) = (node.parent(), node.artifact());
        match parent {
            Some(parent) => {
                if let Some(p) = self.node_mut(parent) {
                    p.children.retain(|&c| c != id);
                }
            }
            None => self.set_root(artifact, None),
        }
        ids.into_iter()
            .filter_map(|id| self.nodes.get_mut(id.index()).and_then(Option::take))
            .collect()
    }

    // ========================================================================
    // Symbol index
    // ========================================================================

    /// Every node declaring `symbol`, first declared first.
    pub fn lookup(&self, symbol: &Symbol) -> Vec<NodeId> {
        let mut found = self.symbols.get(symbol).cloned().unwrap_or_default();
        self.sort_by_document_order(&mut found);
        found
    }

    /// The first declared node for `symbol`.
    pub fn get_node(&self, symbol: &Symbol) -> Option<&Node> {
        self.lookup(symbol).first().and_then(|&id| self.node(id))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Every registered (symbol, node) pair, sorted; for inspection and tests.
    pub fn symbol_entries(&self) -> Vec<(Symbol, NodeId)> {
        let mut entries: Vec<_> = self
            .symbols
            .iter()
            .flat_map(|(s, ids)| ids.iter().map(move |&id| (s.clone(), id)))
            .collect();
        entries.sort();
        entries
    }

    pub(crate) fn register_symbol(&mut self, symbol: &Symbol, id: NodeId) {
        if symbol.is_empty() {
            return;
        }
        let entry = self.symbols.entry(symbol.clone()).or_default();
        if !entry.contains(&id) {
            entry.push(id);
        }
        if entry.len() > 1 {
            debug!("[SYMBOLS] '{}' declared {} times", symbol, entry.len());
        }
    }

    pub(crate) fn unregister_symbol(&mut self, symbol: &Symbol, id: NodeId) {
        if let Some(entry) = self.symbols.get_mut(symbol) {
            entry.retain(|&n| n != id);
            if entry.is_empty() {
                self.symbols.remove(symbol);
            }
        }
    }

    // ========================================================================
    // Bindings and anti-dependencies
    // ========================================================================

    pub fn binding(&self, binding: BindingRef) -> Option<&ItemBinding> {
        self.node(binding.owner)?.binding(binding.role)
    }

    pub fn binding_status(&self, binding: BindingRef) -> Option<BindingStatus> {
        self.binding(binding).map(ItemBinding::status)
    }

    /// Every binding currently resolved to `target`.
    pub fn referencers(&self, target: NodeId) -> Vec<BindingRef> {
        self.anti_deps.referencers(target)
    }

    pub fn anti_dependencies(&self) -> &AntiDependencyIndex {
        &self.anti_deps
    }

    pub(crate) fn anti_dependencies_mut(&mut self) -> &mut AntiDependencyIndex {
        &mut self.anti_deps
    }
}
