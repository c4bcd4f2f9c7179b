//! Validation findings.
//!
//! Unresolved and ambiguous references and structural problems are steady
//! states stored on nodes and bindings, not errors. [`Validator`] walks the
//! model lazily and turns them into [`Finding`]s for diagnostics tooling.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::artifact::ArtifactSet;
use crate::base::{NodeId, Span};
use crate::model::{BindingRef, BindingStatus, ItemBinding, Node, Unresolved};

// ============================================================================
// FINDING TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// The category of a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum FindingKind {
    /// A fragment whose shape does not match its kind.
    StructuralParseError,
    UnresolvedReference,
    /// Resolved to the first of several candidates.
    AmbiguousReference,
    /// A second node declares an already declared symbol. Lookups see the
    /// first, so this is the declaration side of an ambiguity.
    DuplicateDeclaration,
    DuplicateListEntry,
    InvalidName,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub struct Finding {
    pub node: NodeId,
    /// Role of the binding concerned, if any.
    pub role: Option<&'static str>,
    pub kind: FindingKind,
    pub severity: Severity,
    pub code: SmolStr,
    pub message: String,
    pub span: Option<Span>,
}

impl Finding {
    pub fn error(node: &Node, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            node: node.id(),
            role: None,
            kind,
            severity: Severity::Error,
            code: SmolStr::default(),
            message: message.into(),
            span: node.span(),
        }
    }

    pub fn warning(node: &Node, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(node, kind, message)
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = SmolStr::new(code);
        self
    }

    pub fn with_role(mut self, role: &'static str) -> Self {
        self.role = Some(role);
        self
    }

    pub fn binding(&self) -> Option<BindingRef> {
        self.role.map(|role| BindingRef::new(self.node, role))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl FindingKind {
    /// Ambiguities resolved by first-declared-wins: on the referencing side
    /// (W0002) or on the declaring side (W0004).
    pub fn is_ambiguity(self) -> bool {
        matches!(
            self,
            FindingKind::AmbiguousReference | FindingKind::DuplicateDeclaration
        )
    }
}

// ============================================================================
// FINDING CODES
// ============================================================================

/// Stable finding codes.
///
/// - **E0001-E0099**: reference errors
/// - **E0100-E0199**: structural errors
/// - **W0001-W0099**: warnings
pub mod codes {
    /// Reference did not resolve.
    pub const UNDEFINED_REFERENCE: &str = "E0001";
    /// Fragment does not match its declared kind.
    pub const STRUCTURAL: &str = "E0100";

    /// Several candidates; the first declared was used.
    pub const AMBIGUOUS_REFERENCE: &str = "W0002";
    /// Name is not a valid identifier.
    pub const NAMING: &str = "W0003";
    /// Symbol declared by an earlier node too; an ambiguity reported on
    /// the later declaration.
    pub const DUPLICATE_DECLARATION: &str = "W0004";
    /// Same target listed twice in one list reference.
    pub const DUPLICATE_LIST_ENTRY: &str = "W0010";
}

/// Identifier rules for declared names (Unicode XID, `_` allowed first).
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

/// Lazy, finite walk over the model producing findings in document order.
///
/// Creating a new validator restarts the walk; findings are computed node by
/// node as the iterator advances.
pub struct Validator<'a> {
    set: &'a ArtifactSet,
    check_identifiers: bool,
    order: Vec<NodeId>,
    next: usize,
    pending: VecDeque<Finding>,
}

impl<'a> Validator<'a> {
    pub fn new(set: &'a ArtifactSet) -> Self {
        Self {
            set,
            check_identifiers: true,
            order: set.document_order(),
            next: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn check_identifiers(mut self, enabled: bool) -> Self {
        self.check_identifiers = enabled;
        self
    }

    fn collect_node(&mut self, node: &Node) {
        for message in node.parse_errors() {
            self.pending.push_back(
                Finding::error(node, FindingKind::StructuralParseError, message.clone())
                    .with_code(codes::STRUCTURAL),
            );
        }

        if let Some(symbol) = node.symbol().filter(|s| !s.is_empty()) {
            let first = self.set.lookup(symbol).first().copied();
            if let Some(first) = first.filter(|&f| f != node.id()) {
                self.pending.push_back(
                    Finding::warning(
                        node,
                        FindingKind::DuplicateDeclaration,
                        format!("'{symbol}' is already declared by {first}; references resolve to the first declaration"),
                    )
                    .with_code(codes::DUPLICATE_DECLARATION),
                );
            }
        }

        if self.check_identifiers && node.kind().has_identifier_name() {
            if let Some(name) = node.name() {
                let message = if name.is_empty() {
                    Some(format!("{} has no name", node.kind()))
                } else if !is_valid_identifier(name) {
                    Some(format!("'{name}' is not a valid identifier"))
                } else {
                    None
                };
                if let Some(message) = message {
                    self.pending.push_back(
                        Finding::warning(node, FindingKind::InvalidName, message)
                            .with_code(codes::NAMING),
                    );
                }
            }
        }

        for binding in node.bindings() {
            self.collect_binding(node, binding);
        }
    }

    fn collect_binding(&mut self, node: &Node, binding: &ItemBinding) {
        if binding.status() == BindingStatus::Unknown {
            return;
        }
        let role = binding.role();
        if binding.is_absent() {
            if !binding.spec().optional {
                self.pending.push_back(
                    Finding::error(
                        node,
                        FindingKind::UnresolvedReference,
                        format!("{} does not specify '{role}'", node.kind()),
                    )
                    .with_code(codes::UNDEFINED_REFERENCE)
                    .with_role(role),
                );
            }
            return;
        }

        let mut seen = FxHashSet::default();
        for slot in binding.slots() {
            let repeated = slot.status == BindingStatus::Known
                && slot.target.is_some_and(|target| !seen.insert(target));
            let finding = match (slot.status, slot.reason, slot.target) {
                (BindingStatus::Undefined, Some(Unresolved::WrongKind(found)), _) => Some(
                    Finding::error(
                        node,
                        FindingKind::UnresolvedReference,
                        format!(
                            "'{}' in '{role}' names a {found}, expected {}",
                            slot.raw,
                            expected_kinds(binding)
                        ),
                    )
                    .with_code(codes::UNDEFINED_REFERENCE),
                ),
                (BindingStatus::Undefined, _, _) => Some(
                    Finding::error(
                        node,
                        FindingKind::UnresolvedReference,
                        format!(
                            "'{}' in '{role}' does not resolve to any {}",
                            slot.raw,
                            expected_kinds(binding)
                        ),
                    )
                    .with_code(codes::UNDEFINED_REFERENCE),
                ),
                (BindingStatus::Known, _, Some(_)) if repeated => Some(
                    Finding::warning(
                        node,
                        FindingKind::DuplicateListEntry,
                        format!("'{}' is listed more than once in '{role}'", slot.raw),
                    )
                    .with_code(codes::DUPLICATE_LIST_ENTRY),
                ),
                (BindingStatus::Known, _, Some(target)) if slot.candidates > 1 => Some(
                    Finding::warning(
                        node,
                        FindingKind::AmbiguousReference,
                        format!(
                            "'{}' in '{role}' matches {} declarations; using the first ({target})",
                            slot.raw, slot.candidates
                        ),
                    )
                    .with_code(codes::AMBIGUOUS_REFERENCE),
                ),
                _ => None,
            };
            if let Some(finding) = finding {
                self.pending.push_back(finding.with_role(role));
            }
        }
    }
}

fn expected_kinds(binding: &ItemBinding) -> String {
    binding
        .spec()
        .expected
        .iter()
        .map(|k| k.display())
        .collect::<Vec<_>>()
        .join(" or ")
}

impl Iterator for Validator<'_> {
    type Item = Finding;

    fn next(&mut self) -> Option<Finding> {
        loop {
            if let Some(finding) = self.pending.pop_front() {
                return Some(finding);
            }
            let id = *self.order.get(self.next)?;
            self.next += 1;
            let set = self.set;
            if let Some(node) = set.node(id) {
                self.collect_node(node);
            }
        }
    }
}

// ============================================================================
// FINDING SET
// ============================================================================

/// A collected batch of findings.
#[derive(Clone, Debug, Default)]
pub struct FindingSet {
    findings: Vec<Finding>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.node == node)
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.findings
    }
}

impl FromIterator<Finding> for FindingSet {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Self {
            findings: iter.into_iter().collect(),
        }
    }
}
