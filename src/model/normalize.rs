//! Normalization: raw names to comparable symbols.
//!
//! Two directions are covered here:
//! - [`declared_symbol`] computes the symbol a node declares for itself,
//!   scoped by its own container.
//! - Reference-side normalizers turn the text written in a binding into the
//!   symbol to look up. They see the *referencing* node through
//!   [`RefContext`], never the target's declaration context, because the
//!   same target is reached from differently scoped places.
//!
//! All of them are pure functions of the raw text and the current set
//! contents. Blank input yields [`Symbol::empty`], never an error.

use std::cell::RefCell;

use super::data::NodeData;
use super::kind::ElementKind;
use super::node::Node;
use crate::artifact::ArtifactSet;
use crate::base::{NodeId, Symbol};

/// The referencing side of a binding during normalization.
pub struct RefContext<'a> {
    set: &'a ArtifactSet,
    owner: NodeId,
    separator: char,
    consulted: RefCell<Vec<NodeId>>,
    lookups: RefCell<Vec<Symbol>>,
}

impl<'a> RefContext<'a> {
    pub fn new(set: &'a ArtifactSet, owner: NodeId, separator: char) -> Self {
        Self {
            set,
            owner,
            separator,
            consulted: RefCell::new(Vec::new()),
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn set(&self) -> &'a ArtifactSet {
        self.set
    }

    pub fn owner_id(&self) -> NodeId {
        self.owner
    }

    pub fn owner(&self) -> Option<&'a Node> {
        self.set.node(self.owner)
    }

    /// Nearest strict ancestor of the owner with the given kind.
    pub fn enclosing(&self, kind: ElementKind) -> Option<&'a Node> {
        self.set.enclosing(self.owner, kind)
    }

    /// First node declared under `symbol` with the given kind.
    ///
    /// The symbol is remembered whether or not anything is found, so a later
    /// declaration under it re-resolves the binding being evaluated. A found
    /// node is remembered as a context dependency.
    pub fn consult(&self, symbol: &Symbol, kind: ElementKind) -> Option<&'a Node> {
        self.lookups.borrow_mut().push(symbol.clone());
        let node = self
            .set
            .lookup(symbol)
            .into_iter()
            .filter_map(|id| self.set.node(id))
            .find(|n| n.kind() == kind)?;
        self.consulted.borrow_mut().push(node.id());
        Some(node)
    }

    /// Qualify a type name written on a consulted node. The node's enclosing
    /// schema decides the alias, so it becomes a context dependency too.
    pub fn qualify_consulted_type(&self, at: &'a Node, raw: &str) -> Symbol {
        if let Some(schema) = self.set.enclosing(at.id(), ElementKind::Schema) {
            self.consulted.borrow_mut().push(schema.id());
        }
        qualify_type(self.set, at.id(), raw)
    }

    /// First reference text of a binding on `node`, list bindings included.
    fn first_ref(&self, node: &'a Node, role: &str) -> Option<&'a str> {
        node.binding(role)?
            .raw_refs(self.separator)
            .into_iter()
            .find(|r| !r.is_empty())
    }

    /// Consulted nodes and looked-up symbols, in evaluation order.
    pub(crate) fn into_dependencies(self) -> (Vec<NodeId>, Vec<Symbol>) {
        (self.consulted.into_inner(), self.lookups.into_inner())
    }
}

// ============================================================================
// DECLARED SYMBOLS
// ============================================================================

/// The symbol node `id` declares, or `None` for kinds that declare nothing.
///
/// A blank name yields the empty symbol rather than `None`, so the node is
/// still known to declare something (and is never registered).
pub fn declared_symbol(set: &ArtifactSet, id: NodeId) -> Option<Symbol> {
    use ElementKind as K;

    let node = set.node(id)?;
    let name = node.data().name()?;
    if name.trim().is_empty() {
        return Some(Symbol::empty());
    }
    let enclosing_name = |kind| {
        set.enclosing(id, kind)
            .and_then(|n| n.data().name())
            .unwrap_or_default()
    };

    let symbol = match node.kind() {
        K::Schema | K::EntityContainer => Symbol::new(name),
        K::EntitySet | K::AssociationSet | K::FunctionImport => {
            Symbol::from_parts([enclosing_name(K::EntityContainer), name])
        }
        K::AssociationSetEnd => Symbol::from_parts([
            enclosing_name(K::EntityContainer),
            enclosing_name(K::AssociationSet),
            name,
        ]),
        K::EntityType | K::Association | K::Function => {
            Symbol::from_parts([enclosing_name(K::Schema), name])
        }
        K::Property | K::NavigationProperty => Symbol::from_parts([
            enclosing_name(K::Schema),
            enclosing_name(K::EntityType),
            name,
        ]),
        K::AssociationEnd => Symbol::from_parts([
            enclosing_name(K::Schema),
            enclosing_name(K::Association),
            name,
        ]),
        K::DesignerProperty => {
            let section = set
                .enclosing(id, K::DesignerSection)
                .map(|n| n.raw().tag.as_str())
                .unwrap_or_default();
            Symbol::scoped(name, section)
        }
        K::Diagram => Symbol::scoped(name, "Diagram"),
        _ => return None,
    };
    Some(symbol)
}

// ============================================================================
// REFERENCE NORMALIZERS
// ============================================================================

/// Strip an `IsTypeOf(...)` wrapper.
pub fn strip_type_wrapper(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("IsTypeOf(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(raw)
}

/// Qualify a type name as seen from `at`: the enclosing schema's alias is
/// replaced by its namespace.
fn qualify_type(set: &ArtifactSet, at: NodeId, raw: &str) -> Symbol {
    let text = strip_type_wrapper(raw);
    if text.is_empty() {
        return Symbol::empty();
    }
    let schema = set.enclosing(at, ElementKind::Schema).map(Node::data);
    if let Some(NodeData::Schema {
        namespace,
        alias: Some(alias),
    }) = schema
    {
        if let Some((head, tail)) = text.split_once(crate::base::SEPARATOR) {
            if head == alias.trim() {
                return Symbol::from_parts([namespace.as_str(), tail]);
            }
        }
    }
    Symbol::new(text)
}

/// Prefix `name` with `scope`, or yield the empty symbol when the scope is
/// blank so an unscoped name cannot resolve by accident.
fn scoped_by(scope: &Symbol, name: &str) -> Symbol {
    if scope.is_empty() {
        Symbol::empty()
    } else {
        scope.child(name)
    }
}

/// `Alias.Customer`, `Model.Customer`, `IsTypeOf(Model.Customer)`.
pub fn type_reference(raw: &str, cx: &RefContext<'_>) -> Symbol {
    qualify_type(cx.set(), cx.owner_id(), raw)
}

/// An entity set named within the owner's container.
pub fn container_member(raw: &str, cx: &RefContext<'_>) -> Symbol {
    let container = cx
        .enclosing(ElementKind::EntityContainer)
        .and_then(|n| n.data().name())
        .map(Symbol::new)
        .unwrap_or_default();
    scoped_by(&container, raw)
}

/// An association end role, scoped by the association of the enclosing
/// association set.
pub fn association_set_role(raw: &str, cx: &RefContext<'_>) -> Symbol {
    let Some(set_node) = cx.enclosing(ElementKind::AssociationSet) else {
        return Symbol::empty();
    };
    let association = cx
        .first_ref(set_node, "Association")
        .map(|a| qualify_type(cx.set(), set_node.id(), a))
        .unwrap_or_default();
    scoped_by(&association, raw)
}

/// A role scoped by the navigation property's own relationship.
pub fn navigation_role(raw: &str, cx: &RefContext<'_>) -> Symbol {
    let Some(owner) = cx.owner() else {
        return Symbol::empty();
    };
    let association = cx
        .first_ref(owner, "Relationship")
        .map(|a| qualify_type(cx.set(), owner.id(), a))
        .unwrap_or_default();
    scoped_by(&association, raw)
}

/// A property of the entity type whose key is being declared.
pub fn key_property(raw: &str, cx: &RefContext<'_>) -> Symbol {
    let entity_type = cx
        .enclosing(ElementKind::EntityType)
        .and_then(|n| declared_symbol(cx.set(), n.id()))
        .unwrap_or_default();
    scoped_by(&entity_type, raw)
}

/// A container named by its bare name.
pub fn container_name(raw: &str, _cx: &RefContext<'_>) -> Symbol {
    Symbol::new(raw)
}

/// A fully qualified name written in a mapping or designer document.
pub fn mapped_type(raw: &str, _cx: &RefContext<'_>) -> Symbol {
    Symbol::new(strip_type_wrapper(raw))
}

fn mapping_container(cx: &RefContext<'_>, role: &str) -> Symbol {
    cx.enclosing(ElementKind::EntityContainerMapping)
        .and_then(|ecm| cx.first_ref(ecm, role))
        .map(Symbol::new)
        .unwrap_or_default()
}

/// A member of the conceptual container named by the enclosing
/// `EntityContainerMapping`.
pub fn mapped_container_member(raw: &str, cx: &RefContext<'_>) -> Symbol {
    scoped_by(&mapping_container(cx, "CdmEntityContainer"), raw)
}

/// A member of the storage container named by the enclosing
/// `EntityContainerMapping`.
pub fn mapped_store_entity_set(raw: &str, cx: &RefContext<'_>) -> Symbol {
    scoped_by(&mapping_container(cx, "StorageEntityContainer"), raw)
}

/// An end of the association set named by the enclosing
/// `AssociationSetMapping`.
pub fn mapped_association_set_end(raw: &str, cx: &RefContext<'_>) -> Symbol {
    let set_name = cx
        .enclosing(ElementKind::AssociationSetMapping)
        .and_then(|asm| cx.first_ref(asm, "Name"))
        .unwrap_or_default();
    let association_set = scoped_by(&mapping_container(cx, "CdmEntityContainer"), set_name);
    scoped_by(&association_set, raw)
}

/// A conceptual property mapped to a column.
///
/// Under an `EntityTypeMapping` the property belongs to the first mapped
/// type. Under an `EndProperty` it belongs to the entity type of the mapped
/// association end, which has to be looked up; that end and its schema
/// become context dependencies of the binding.
pub fn mapped_property(raw: &str, cx: &RefContext<'_>) -> Symbol {
    let Some(scope) = cx.set().ancestors(cx.owner_id()).find_map(|id| {
        cx.set().node(id).filter(|n| {
            matches!(
                n.kind(),
                ElementKind::EntityTypeMapping | ElementKind::EndProperty
            )
        })
    }) else {
        return Symbol::empty();
    };

    let entity_type = match scope.kind() {
        ElementKind::EntityTypeMapping => cx
            .first_ref(scope, "TypeName")
            .map(|t| Symbol::new(strip_type_wrapper(t)))
            .unwrap_or_default(),
        _ => {
            let association = cx
                .enclosing(ElementKind::AssociationSetMapping)
                .and_then(|asm| cx.first_ref(asm, "TypeName"))
                .map(|t| Symbol::new(strip_type_wrapper(t)))
                .unwrap_or_default();
            let role = cx.first_ref(scope, "Name").unwrap_or_default();
            let end_symbol = scoped_by(&association, role);
            if end_symbol.is_empty() {
                return Symbol::empty();
            }
            match cx.consult(&end_symbol, ElementKind::AssociationEnd) {
                Some(end) => cx
                    .first_ref(end, "Type")
                    .map(|t| cx.qualify_consulted_type(end, t))
                    .unwrap_or_default(),
                None => Symbol::empty(),
            }
        }
    };
    scoped_by(&entity_type, raw)
}
