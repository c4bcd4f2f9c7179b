//! Element kinds and tag classification.
//!
//! Classification is positional: the same tag can mean different things
//! under different parents (`End` is an [`ElementKind::AssociationSetEnd`]
//! inside an association set and an [`ElementKind::AssociationEnd`] inside an
//! association). A tag that is not valid under its parent becomes
//! [`ElementKind::Unknown`] and is reported as a structural error on that
//! node only.

use crate::base::ArtifactKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum ElementKind {
    // Conceptual and storage schema
    Schema,
    EntityContainer,
    EntitySet,
    AssociationSet,
    AssociationSetEnd,
    FunctionImport,
    EntityType,
    Key,
    PropertyRef,
    Property,
    NavigationProperty,
    Association,
    AssociationEnd,
    Function,
    Documentation,

    // Mapping
    Mapping,
    EntityContainerMapping,
    EntitySetMapping,
    EntityTypeMapping,
    MappingFragment,
    ScalarProperty,
    Condition,
    AssociationSetMapping,
    EndProperty,
    FunctionImportMapping,
    ResultMapping,

    // Designer metadata
    Designer,
    DesignerSection,
    DesignerInfoPropertySet,
    DesignerProperty,
    Diagrams,
    Diagram,
    EntityTypeShape,
    AssociationConnector,

    /// Recognised but not modelled; kept for round-trip.
    Opaque,
    /// Not valid where it appears.
    Unknown,
}

/// Elements the engine tolerates without modelling them.
const TOLERATED_TAGS: &[&str] = &[
    "Annotation",
    "CommandText",
    "ComplexProperty",
    "ComplexType",
    "ComplexTypeMapping",
    "DefiningQuery",
    "EnumType",
    "ModificationFunctionMapping",
    "Parameter",
    "QueryView",
    "ReferentialConstraint",
    "ReturnType",
    "TypeAnnotation",
    "Using",
    "ValueAnnotation",
];

impl ElementKind {
    /// Classify the root element of a document of the given kind.
    pub fn root(artifact: ArtifactKind, tag: &str) -> ElementKind {
        match (artifact, tag) {
            (ArtifactKind::Conceptual | ArtifactKind::Storage, "Schema") => ElementKind::Schema,
            (ArtifactKind::Mapping, "Mapping") => ElementKind::Mapping,
            (ArtifactKind::Designer, "Designer") => ElementKind::Designer,
            _ => ElementKind::Unknown,
        }
    }

    /// Classify `tag` appearing as a child of an element of this kind.
    pub fn classify_child(self, tag: &str) -> ElementKind {
        use ElementKind::*;

        match (self, tag) {
            (Opaque | Unknown, _) => Opaque,
            (_, "Documentation") if self.accepts_documentation() => Documentation,

            (Schema, "EntityContainer") => EntityContainer,
            (Schema, "EntityType") => EntityType,
            (Schema, "Association") => Association,
            (Schema, "Function") => Function,
            (EntityContainer, "EntitySet") => EntitySet,
            (EntityContainer, "AssociationSet") => AssociationSet,
            (EntityContainer, "FunctionImport") => FunctionImport,
            (AssociationSet, "End") => AssociationSetEnd,
            (EntityType, "Key") => Key,
            (EntityType, "Property") => Property,
            (EntityType, "NavigationProperty") => NavigationProperty,
            (Key, "PropertyRef") => PropertyRef,
            (Association, "End") => AssociationEnd,

            (Mapping, "EntityContainerMapping") => EntityContainerMapping,
            (EntityContainerMapping, "EntitySetMapping") => EntitySetMapping,
            (EntityContainerMapping, "AssociationSetMapping") => AssociationSetMapping,
            (EntityContainerMapping, "FunctionImportMapping") => FunctionImportMapping,
            (EntitySetMapping | ResultMapping, "EntityTypeMapping") => EntityTypeMapping,
            (EntityTypeMapping, "MappingFragment") => MappingFragment,
            (MappingFragment | EndProperty | AssociationSetMapping, "ScalarProperty") => {
                ScalarProperty
            }
            (MappingFragment | AssociationSetMapping | EntityTypeMapping, "Condition") => {
                Condition
            }
            (AssociationSetMapping, "EndProperty") => EndProperty,
            (FunctionImportMapping, "ResultMapping") => ResultMapping,

            (Designer, "Connection" | "Options") => DesignerSection,
            (Designer, "Diagrams") => Diagrams,
            (DesignerSection, "DesignerInfoPropertySet") => DesignerInfoPropertySet,
            (DesignerInfoPropertySet, "DesignerProperty") => DesignerProperty,
            (Diagrams, "Diagram") => Diagram,
            (Diagram, "EntityTypeShape") => EntityTypeShape,
            (Diagram, "AssociationConnector") => AssociationConnector,

            (_, tag) if TOLERATED_TAGS.contains(&tag) => Opaque,
            _ => Unknown,
        }
    }

    /// Classify `tag` under this element when the row's meaning also
    /// depends on the kind of this element's own parent.
    pub fn classify_nested(self, outer: Option<ElementKind>, tag: &str) -> ElementKind {
        match (self, outer, tag) {
            (ElementKind::EntityTypeMapping, Some(ElementKind::ResultMapping), "ScalarProperty") => {
                ElementKind::ScalarProperty
            }
            _ => self.classify_child(tag),
        }
    }

    fn accepts_documentation(self) -> bool {
        use ElementKind::*;
        matches!(
            self,
            EntityContainer
                | EntitySet
                | AssociationSet
                | AssociationSetEnd
                | FunctionImport
                | EntityType
                | Property
                | NavigationProperty
                | Association
                | AssociationEnd
                | Function
        )
    }

    /// Child tags folded into this element's own fields during Parse instead
    /// of becoming nodes.
    pub fn absorbs(self, tag: &str) -> bool {
        match self {
            ElementKind::Documentation => matches!(tag, "Summary" | "LongDescription"),
            ElementKind::DesignerProperty => tag == "Value",
            _ => false,
        }
    }

    /// Attribute carrying the element's own declared name, if it has one.
    pub fn name_attribute(self) -> Option<&'static str> {
        use ElementKind::*;
        match self {
            Schema => Some("Namespace"),
            EntityContainer | EntitySet | AssociationSet | FunctionImport | EntityType
            | Property | NavigationProperty | Association | Function | DesignerProperty
            | Diagram => Some("Name"),
            AssociationEnd | AssociationSetEnd => Some("Role"),
            _ => None,
        }
    }

    /// Kinds whose declared name is subject to identifier rules.
    pub fn has_identifier_name(self) -> bool {
        !matches!(self, ElementKind::Schema) && self.name_attribute().is_some()
    }

    pub fn display(self) -> &'static str {
        use ElementKind::*;
        match self {
            Schema => "Schema",
            EntityContainer => "EntityContainer",
            EntitySet => "EntitySet",
            AssociationSet => "AssociationSet",
            AssociationSetEnd => "AssociationSet End",
            FunctionImport => "FunctionImport",
            EntityType => "EntityType",
            Key => "Key",
            PropertyRef => "PropertyRef",
            Property => "Property",
            NavigationProperty => "NavigationProperty",
            Association => "Association",
            AssociationEnd => "Association End",
            Function => "Function",
            Documentation => "Documentation",
            Mapping => "Mapping",
            EntityContainerMapping => "EntityContainerMapping",
            EntitySetMapping => "EntitySetMapping",
            EntityTypeMapping => "EntityTypeMapping",
            MappingFragment => "MappingFragment",
            ScalarProperty => "ScalarProperty",
            Condition => "Condition",
            AssociationSetMapping => "AssociationSetMapping",
            EndProperty => "EndProperty",
            FunctionImportMapping => "FunctionImportMapping",
            ResultMapping => "ResultMapping",
            Designer => "Designer",
            DesignerSection => "Designer section",
            DesignerInfoPropertySet => "DesignerInfoPropertySet",
            DesignerProperty => "DesignerProperty",
            Diagrams => "Diagrams",
            Diagram => "Diagram",
            EntityTypeShape => "EntityTypeShape",
            AssociationConnector => "AssociationConnector",
            Opaque => "element",
            Unknown => "unknown element",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display())
    }
}
