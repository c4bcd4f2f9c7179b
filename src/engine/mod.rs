//! The resolution engine.
//!
//! [`ResolutionEngine`] owns an [`ArtifactSet`] and drives every node through
//! `Unparsed → Parsed → Normalized → Resolved`. Edits are batched into a
//! transaction: every mutation opens one implicitly, and
//! [`commit_edit`](ResolutionEngine::commit_edit) runs exactly one
//! propagation pass over everything the transaction dirtied. Between the two,
//! lookups see the model as it was at the last commit.
//!
//! ```text
//! begin_edit / set_attribute / insert_fragment / delete_node / rename_node
//!        │
//!        ▼
//! commit_edit ── delete ─▶ reparse ─▶ renormalize ─▶ resolve ─▶ rebind dependents
//! ```

mod error;
mod options;
mod propagate;

pub use error::EngineError;
pub use options::EngineOptions;
pub use propagate::PropagationReport;

use indexmap::IndexSet;
use tracing::{info, trace};

use crate::artifact::{Artifact, ArtifactSet, BindingDeps};
use crate::base::{ArtifactId, ArtifactKind, NodeId, SEPARATOR, Symbol};
use crate::diagnostics::{FindingSet, Validator};
use crate::model::{
    BindingRef, BindingStatus, Node, NodeData, NodeState, ParseInput, Resolution,
    declared_symbol, evaluate, normalize::strip_type_wrapper,
};
use crate::syntax::Fragment;

/// Raw mutations collected since the last commit.
#[derive(Debug, Default)]
pub(crate) struct Transaction {
    edited: IndexSet<NodeId>,
    inserted: IndexSet<NodeId>,
    deleted: IndexSet<NodeId>,
    unloaded: Vec<ArtifactId>,
}

#[derive(Debug, Default)]
pub struct ResolutionEngine {
    set: ArtifactSet,
    options: EngineOptions,
    transaction: Option<Transaction>,
}

impl ResolutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Read access to everything loaded.
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.set
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.set.node(id)
    }

    pub fn get_node(&self, symbol: &Symbol) -> Option<&Node> {
        self.set.get_node(symbol)
    }

    pub fn referencers(&self, target: NodeId) -> Vec<BindingRef> {
        self.set.referencers(target)
    }

    pub fn binding_status(&self, binding: BindingRef) -> Option<BindingStatus> {
        self.set.binding_status(binding)
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.set.state(id)
    }

    /// Lazy walk over every finding, in document order.
    pub fn validate(&self) -> Validator<'_> {
        Validator::new(&self.set).check_identifiers(self.options.validate_identifiers)
    }

    pub fn findings(&self) -> FindingSet {
        self.validate().collect()
    }

    /// The document tree under `id` as currently edited.
    pub fn to_fragment(&self, id: NodeId) -> Option<Fragment> {
        self.set.to_fragment(id)
    }

    // ========================================================================
    // Lifecycle steps
    // ========================================================================

    /// Read typed fields from the raw element. Safe to re-run.
    pub fn parse(&mut self, id: NodeId) -> Result<(), EngineError> {
        self.parse_node(id).map(|_| ())
    }

    /// Compute and register the node's declared symbol.
    pub fn normalize(&mut self, id: NodeId) -> Result<(), EngineError> {
        self.normalize_node(id).map(|_| ())
    }

    /// Evaluate every binding of a Normalized node.
    pub fn resolve(&mut self, id: NodeId) -> Result<(), EngineError> {
        self.resolve_node(id)
    }

    /// Re-evaluate one binding. Redundant calls are harmless: the same raw
    /// text over the same set contents yields the same resolution.
    pub fn rebind(&mut self, binding: BindingRef) -> Result<Resolution, EngineError> {
        let node = self
            .set
            .node(binding.owner)
            .ok_or(EngineError::UnknownNode(binding.owner))?;
        if node.state() < NodeState::Normalized {
            return Err(EngineError::wrong_state(
                binding.owner,
                "rebind",
                node.state(),
                NodeState::Normalized,
            ));
        }
        let item = node.binding(binding.role).ok_or_else(|| {
            EngineError::InvariantViolation(format!("{} has no binding '{}'", binding.owner, binding.role))
        })?;
        let resolution = evaluate(&self.set, binding.owner, item, self.options.list_separator);
        self.apply_resolution(binding, resolution.clone());
        Ok(resolution)
    }

    /// Returns the symbol the node declared before this parse.
    pub(crate) fn parse_node(&mut self, id: NodeId) -> Result<Option<Symbol>, EngineError> {
        let node = self.set.node(id).ok_or(EngineError::UnknownNode(id))?;
        let artifact = self
            .set
            .artifact(node.artifact())
            .map(Artifact::kind)
            .ok_or(EngineError::UnknownArtifact(node.artifact()))?;
        let parent = node.parent().and_then(|p| self.set.node(p)).map(Node::kind);
        let (data, errors) = NodeData::parse(ParseInput {
            kind: node.kind(),
            parent,
            artifact,
            raw: node.raw(),
        });

        let stale: Vec<BindingRef> = node
            .bindings()
            .iter()
            .map(|b| BindingRef::new(id, b.role()))
            .collect();
        let previous = node.symbol().cloned();
        for binding in stale {
            self.set.anti_dependencies_mut().remove_binding(binding);
        }
        if let Some(symbol) = &previous {
            self.set.unregister_symbol(symbol, id);
        }

        let node = self.set.node_mut(id).ok_or(EngineError::UnknownNode(id))?;
        if !errors.is_empty() {
            trace!("[ENGINE] parse {id}: {} structural errors", errors.len());
        }
        node.data = data;
        node.parse_errors = errors;
        node.symbol = None;
        node.state = NodeState::Parsed;
        Ok(previous)
    }

    /// Returns the node's symbol before and after.
    pub(crate) fn normalize_node(
        &mut self,
        id: NodeId,
    ) -> Result<(Option<Symbol>, Option<Symbol>), EngineError> {
        let node = self.set.node(id).ok_or(EngineError::UnknownNode(id))?;
        if node.state() < NodeState::Parsed {
            return Err(EngineError::wrong_state(
                id,
                "normalize",
                node.state(),
                NodeState::Parsed,
            ));
        }
        let symbol = declared_symbol(&self.set, id);
        let previous = node.symbol().cloned();

        if let Some(old) = previous.as_ref().filter(|&old| Some(old) != symbol.as_ref()) {
            self.set.unregister_symbol(old, id);
        }
        if let Some(new) = &symbol {
            self.set.register_symbol(new, id);
        }
        let node = self.set.node_mut(id).ok_or(EngineError::UnknownNode(id))?;
        node.symbol = symbol.clone();
        node.state = NodeState::Normalized;
        trace!("[ENGINE] normalize {id}: {:?}", symbol);
        Ok((previous, symbol))
    }

    pub(crate) fn resolve_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        let node = self.set.node(id).ok_or(EngineError::UnknownNode(id))?;
        if node.state() < NodeState::Normalized {
            return Err(EngineError::wrong_state(
                id,
                "resolve",
                node.state(),
                NodeState::Normalized,
            ));
        }
        let separator = self.options.list_separator;
        let resolutions: Vec<(BindingRef, Resolution)> = node
            .bindings()
            .into_iter()
            .map(|b| {
                (
                    BindingRef::new(id, b.role()),
                    evaluate(&self.set, id, b, separator),
                )
            })
            .collect();
        for (binding, resolution) in resolutions {
            self.apply_resolution(binding, resolution);
        }
        if let Some(node) = self.set.node_mut(id) {
            node.state = NodeState::Resolved;
        }
        Ok(())
    }

    fn apply_resolution(&mut self, binding: BindingRef, resolution: Resolution) {
        let deps = BindingDeps {
            targets: resolution.targets(),
            context: resolution.consulted.iter().copied().collect(),
            dangling: resolution.dangling(),
            lookups: resolution.lookups.iter().cloned().collect(),
        };
        self.set.anti_dependencies_mut().record(binding, deps);
        if let Some(item) = self
            .set
            .node_mut(binding.owner)
            .and_then(|n| n.data.binding_mut(binding.role))
        {
            item.apply(resolution);
        }
    }

    // ========================================================================
    // Transactions and edits
    // ========================================================================

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Open a transaction explicitly. Mutations open one implicitly too.
    pub fn begin_transaction(&mut self) -> Result<(), EngineError> {
        if self.transaction.is_some() {
            return Err(EngineError::TransactionOpen);
        }
        self.transaction = Some(Transaction::default());
        Ok(())
    }

    /// Close the transaction and run one propagation pass.
    pub fn commit_edit(&mut self) -> Result<PropagationReport, EngineError> {
        let transaction = self.transaction.take().ok_or(EngineError::NoTransaction)?;
        propagate::commit(self, transaction)
    }

    fn transaction(&mut self) -> &mut Transaction {
        self.transaction.get_or_insert_with(Transaction::default)
    }

    fn is_editing(&self, id: NodeId) -> bool {
        self.transaction
            .as_ref()
            .is_some_and(|t| t.edited.contains(&id))
    }

    fn is_pending_delete(&self, id: NodeId) -> bool {
        let Some(transaction) = &self.transaction else {
            return false;
        };
        std::iter::once(id)
            .chain(self.set.ancestors(id))
            .any(|n| transaction.deleted.contains(&n))
    }

    fn editable(&self, id: NodeId) -> Result<&Node, EngineError> {
        let node = self.set.node(id).ok_or(EngineError::UnknownNode(id))?;
        if self.is_pending_delete(id) {
            return Err(EngineError::InvariantViolation(format!(
                "{id} is scheduled for deletion"
            )));
        }
        Ok(node)
    }

    /// Load a document as a new artifact. Its nodes are processed at commit.
    pub fn load_artifact(
        &mut self,
        uri: impl Into<String>,
        kind: ArtifactKind,
        root: Fragment,
    ) -> ArtifactId {
        let uri = uri.into();
        let size = root.subtree_size();
        let artifact = self.set.add_artifact(uri.clone(), kind);
        let root = self.set.build_subtree(artifact, None, root);
        self.set.set_root(artifact, Some(root));
        self.transaction().inserted.insert(root);
        info!(
            "[ENGINE] loaded {uri} as {} {artifact} ({size} elements)",
            kind.display()
        );
        artifact
    }

    /// Remove a whole artifact at the next commit.
    pub fn unload_artifact(&mut self, artifact: ArtifactId) -> Result<(), EngineError> {
        let root = self
            .set
            .artifact(artifact)
            .ok_or(EngineError::UnknownArtifact(artifact))?
            .root();
        let transaction = self.transaction();
        if let Some(root) = root {
            transaction.deleted.insert(root);
        }
        transaction.unloaded.push(artifact);
        Ok(())
    }

    /// Mark a node's raw content as about to change. The node drops back to
    /// Unparsed until commit.
    pub fn begin_edit(&mut self, id: NodeId) -> Result<(), EngineError> {
        self.editable(id)?;
        self.transaction().edited.insert(id);
        if let Some(node) = self.set.node_mut(id) {
            node.state = NodeState::Unparsed;
        }
        Ok(())
    }

    fn raw_mut(&mut self, id: NodeId) -> Result<&mut crate::model::RawElement, EngineError> {
        if !self.is_editing(id) {
            return Err(EngineError::NotEditing(id));
        }
        self.set
            .node_mut(id)
            .map(|n| &mut n.raw)
            .ok_or(EngineError::UnknownNode(id))
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.raw_mut(id)?.attributes.insert(name.into(), value.into());
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), EngineError> {
        self.raw_mut(id)?.attributes.shift_remove(name);
        Ok(())
    }

    pub fn set_text(&mut self, id: NodeId, text: Option<String>) -> Result<(), EngineError> {
        self.raw_mut(id)?.text = text;
        Ok(())
    }

    /// Insert a new subtree under `parent` at `index` (`None` appends).
    pub fn insert_fragment(
        &mut self,
        parent: NodeId,
        index: Option<usize>,
        fragment: Fragment,
    ) -> Result<NodeId, EngineError> {
        let artifact = self.editable(parent)?.artifact();
        let child = self.set.build_subtree(artifact, Some(parent), fragment);
        self.set.attach(parent, index, child);
        self.transaction().inserted.insert(child);
        Ok(child)
    }

    /// Remove a node and its subtree at the next commit.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), EngineError> {
        self.set.node(id).ok_or(EngineError::UnknownNode(id))?;
        self.transaction().deleted.insert(id);
        Ok(())
    }

    /// Change a node's declared name. Referencers are re-resolved at commit
    /// against the new name; they are not rewritten.
    pub fn rename_node(&mut self, id: NodeId, new_name: &str) -> Result<(), EngineError> {
        let node = self.editable(id)?;
        let attribute = node
            .kind()
            .name_attribute()
            .ok_or(EngineError::NotRenamable {
                node: id,
                kind: node.kind(),
            })?;
        self.begin_edit(id)?;
        self.set_attribute(id, attribute, new_name)
    }

    /// Rename a node and rewrite the reference text of every binding
    /// currently resolved to it, so they stay Known after commit. Returns the
    /// rewritten bindings.
    pub fn rename_with_references(
        &mut self,
        id: NodeId,
        new_name: &str,
    ) -> Result<Vec<BindingRef>, EngineError> {
        let separator = self.options.list_separator;
        let mut rewrites: Vec<(BindingRef, String)> = Vec::new();
        for binding in self.set.referencers(id) {
            let Some(item) = self.set.binding(binding) else {
                continue;
            };
            let slots = item.slots();
            let rewritten: Vec<String> = item
                .raw_refs(separator)
                .into_iter()
                .enumerate()
                .map(|(i, raw)| match slots.get(i) {
                    Some(slot) if slot.target == Some(id) => replace_last_segment(raw, new_name),
                    _ => raw.to_string(),
                })
                .collect();
            rewrites.push((binding, rewritten.join(&separator.to_string())));
        }

        self.rename_node(id, new_name)?;
        let mut changed = Vec::with_capacity(rewrites.len());
        for (binding, raw) in rewrites {
            if self.is_pending_delete(binding.owner) {
                continue;
            }
            if !self.is_editing(binding.owner) {
                self.begin_edit(binding.owner)?;
            }
            self.set_attribute(binding.owner, binding.role, raw)?;
            changed.push(binding);
        }
        info!(
            "[ENGINE] rename {id} to '{new_name}': {} references rewritten",
            changed.len()
        );
        Ok(changed)
    }

    /// Reparse everything in one transaction.
    pub fn rebuild(&mut self) -> Result<PropagationReport, EngineError> {
        self.begin_transaction()?;
        for id in self.set.document_order() {
            self.begin_edit(id)?;
        }
        self.commit_edit()
    }
}

/// Replace the last dotted segment of a reference, keeping any
/// `IsTypeOf(...)` wrapper.
fn replace_last_segment(raw: &str, new_name: &str) -> String {
    let inner = strip_type_wrapper(raw);
    let replaced = match inner.rsplit_once(SEPARATOR) {
        Some((head, _)) => format!("{head}{SEPARATOR}{new_name}"),
        None => new_name.to_string(),
    };
    if inner.len() == raw.trim().len() {
        replaced
    } else {
        format!("IsTypeOf({replaced})")
    }
}
