//! Arena identifiers and artifact kinds.

/// Stable identifier of a node in the [`ArtifactSet`](crate::artifact::ArtifactSet) arena.
///
/// Slots are never reused, so an id held by a binding or by a caller either
/// names the same node forever or names nothing once that node is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from an arena index
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the index into the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of one loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub struct ArtifactId(pub u32);

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "artifact{}", self.0)
    }
}

/// Which part of the model a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum ArtifactKind {
    /// CSDL: entity types, associations, the conceptual container.
    Conceptual,
    /// SSDL: tables as entity types, store functions, the storage container.
    Storage,
    /// MSL: how conceptual sets map onto storage sets.
    Mapping,
    /// Designer metadata: diagrams and designer options.
    Designer,
}

impl ArtifactKind {
    /// Conceptual and storage documents share the schema vocabulary.
    pub fn is_schema(self) -> bool {
        matches!(self, ArtifactKind::Conceptual | ArtifactKind::Storage)
    }

    pub fn display(self) -> &'static str {
        match self {
            ArtifactKind::Conceptual => "conceptual",
            ArtifactKind::Storage => "storage",
            ArtifactKind::Mapping => "mapping",
            ArtifactKind::Designer => "designer",
        }
    }
}
