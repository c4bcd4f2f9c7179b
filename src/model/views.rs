//! Read-only views over resolved nodes for collaborators.
//!
//! Children are an explicit composition: a node's stored child nodes first,
//! then its own typed extras (bindings and defaultable values).

use super::binding::ItemBinding;
use super::data::{DefaultableValue, NodeData};
use super::kind::ElementKind;
use super::node::Node;
use crate::artifact::ArtifactSet;
use crate::base::NodeId;
use crate::syntax::Fragment;

/// One entry of [`ArtifactSet::items`].
#[derive(Debug, Clone)]
pub enum ChildItem<'a> {
    Node(&'a Node),
    Binding(&'a ItemBinding),
    Value(DefaultableValue),
}

impl ArtifactSet {
    /// Stored children followed by the node's typed extras.
    pub fn items(&self, id: NodeId) -> Vec<ChildItem<'_>> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let stored = node
            .children()
            .iter()
            .filter_map(|&c| self.node(c))
            .map(ChildItem::Node);
        let bindings = node.bindings().into_iter().map(ChildItem::Binding);
        let values = node
            .data()
            .defaultable_values()
            .into_iter()
            .map(ChildItem::Value);
        stored.chain(bindings).chain(values).collect()
    }

    /// Owners of bindings resolved to `target` whose kind is `kind`.
    pub fn referencers_of_kind(&self, target: NodeId, kind: ElementKind) -> Vec<NodeId> {
        let mut owners: Vec<NodeId> = self
            .referencers(target)
            .into_iter()
            .map(|b| b.owner)
            .filter(|&owner| self.node(owner).is_some_and(|n| n.kind() == kind))
            .collect();
        self.sort_by_document_order(&mut owners);
        owners.dedup();
        owners
    }

    /// The mapping of an entity set, if one is resolved to it.
    pub fn entity_set_mapping(&self, entity_set: NodeId) -> Option<NodeId> {
        self.referencers_of_kind(entity_set, ElementKind::EntitySetMapping)
            .into_iter()
            .next()
    }

    /// End mappings resolved to an association set end.
    pub fn end_properties(&self, set_end: NodeId) -> Vec<NodeId> {
        self.referencers_of_kind(set_end, ElementKind::EndProperty)
    }

    /// Human-readable label: mapping rows as `Name <==> ColumnName`, named
    /// elements by name, everything else by kind.
    pub fn display_name(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        match node.data() {
            NodeData::ScalarProperty {
                property,
                column_name,
            }
            | NodeData::Condition {
                property,
                column_name,
                ..
            } => format!(
                "{} <==> {}",
                property.raw().unwrap_or_default(),
                column_name.as_deref().unwrap_or_default()
            ),
            data => match data.name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => node.kind().display().to_string(),
            },
        }
    }

    /// Rebuild the document tree under `id`, reflecting every edit.
    pub fn to_fragment(&self, id: NodeId) -> Option<Fragment> {
        let node = self.node(id)?;
        let raw = node.raw();
        let mut children = raw.inline.clone();
        children.extend(
            node.children()
                .iter()
                .filter_map(|&child| self.to_fragment(child)),
        );
        Some(Fragment {
            tag: raw.tag.clone(),
            prefix: raw.prefix.clone(),
            attributes: raw.attributes.clone(),
            text: raw.text.clone(),
            children,
            span: raw.span,
        })
    }
}
