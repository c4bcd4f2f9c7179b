//! The generic tree element.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::binding::ItemBinding;
use super::data::NodeData;
use super::kind::ElementKind;
use crate::base::{ArtifactId, NodeId, Span, Symbol};
use crate::syntax::Fragment;

/// Lifecycle of a node. Ordering follows the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum NodeState {
    #[default]
    Unparsed,
    Parsed,
    Normalized,
    /// Every binding evaluated; some may be Undefined.
    Resolved,
}

/// The element's content as written, the input to Parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawElement {
    pub tag: SmolStr,
    pub prefix: Option<SmolStr>,
    pub attributes: IndexMap<SmolStr, String>,
    pub text: Option<String>,
    /// Child elements folded into this node (`Summary` under `Documentation`).
    pub inline: Vec<Fragment>,
    pub span: Option<Span>,
}

impl RawElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn inline_text(&self, tag: &str) -> Option<&str> {
        self.inline
            .iter()
            .find(|f| f.tag == tag)
            .and_then(|f| f.text.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) artifact: ArtifactId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: ElementKind,
    pub(crate) raw: RawElement,
    pub(crate) state: NodeState,
    pub(crate) symbol: Option<Symbol>,
    pub(crate) data: NodeData,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parse_errors: Vec<String>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        artifact: ArtifactId,
        parent: Option<NodeId>,
        kind: ElementKind,
        raw: RawElement,
    ) -> Self {
        Self {
            id,
            artifact,
            parent,
            kind,
            raw,
            state: NodeState::Unparsed,
            symbol: None,
            data: NodeData::Unparsed,
            children: Vec::new(),
            parse_errors: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn artifact(&self) -> ArtifactId {
        self.artifact
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn raw(&self) -> &RawElement {
        &self.raw
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.raw.attr(name)
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// The declared symbol, once normalized. Kinds without a name have none.
    pub fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Stored child nodes in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Structural problems found by the last Parse.
    pub fn parse_errors(&self) -> &[String] {
        &self.parse_errors
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name()
    }

    pub fn bindings(&self) -> Vec<&ItemBinding> {
        self.data.bindings()
    }

    pub fn binding(&self, role: &str) -> Option<&ItemBinding> {
        self.data.bindings().into_iter().find(|b| b.role() == role)
    }

    pub fn span(&self) -> Option<Span> {
        self.raw.span
    }
}
