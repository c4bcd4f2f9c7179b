//! Typed per-kind node content.
//!
//! Parse turns a [`RawElement`] into one [`NodeData`] variant. Each variant
//! carries only its own fields and its own [`ItemBinding`]s; the engine stays
//! generic by going through [`NodeData::bindings`] and [`NodeData::name`].

use super::binding::{BindingShape, BindingSpec, ItemBinding, TargetSpace};
use super::kind::ElementKind;
use super::node::RawElement;
use super::normalize;
use crate::base::ArtifactKind;

// ============================================================================
// BINDING DECLARATIONS
// ============================================================================

const fn single(
    role: &'static str,
    expected: &'static [ElementKind],
    space: TargetSpace,
    normalizer: super::binding::Normalizer,
) -> BindingSpec {
    BindingSpec {
        role,
        shape: BindingShape::Single,
        optional: false,
        expected,
        space,
        normalizer,
    }
}

const fn optional(spec: BindingSpec) -> BindingSpec {
    BindingSpec {
        optional: true,
        ..spec
    }
}

const ENTITY_TYPE: &[ElementKind] = &[ElementKind::EntityType];
const ENTITY_SET: &[ElementKind] = &[ElementKind::EntitySet];
const ASSOCIATION: &[ElementKind] = &[ElementKind::Association];
const ASSOCIATION_END: &[ElementKind] = &[ElementKind::AssociationEnd];
const PROPERTY: &[ElementKind] = &[ElementKind::Property];
const CONCEPTUAL: TargetSpace = TargetSpace::Kind(ArtifactKind::Conceptual);
const STORAGE: TargetSpace = TargetSpace::Kind(ArtifactKind::Storage);

pub static ENTITY_SET_TYPE: BindingSpec = single(
    "EntityType",
    ENTITY_TYPE,
    TargetSpace::Owner,
    normalize::type_reference,
);
pub static ASSOCIATION_SET_ASSOCIATION: BindingSpec = single(
    "Association",
    ASSOCIATION,
    TargetSpace::Owner,
    normalize::type_reference,
);
pub static SET_END_ROLE: BindingSpec = single(
    "Role",
    ASSOCIATION_END,
    TargetSpace::Owner,
    normalize::association_set_role,
);
pub static SET_END_ENTITY_SET: BindingSpec = single(
    "EntitySet",
    ENTITY_SET,
    TargetSpace::Owner,
    normalize::container_member,
);
pub static FUNCTION_IMPORT_ENTITY_SET: BindingSpec = optional(single(
    "EntitySet",
    ENTITY_SET,
    TargetSpace::Owner,
    normalize::container_member,
));
pub static BASE_TYPE: BindingSpec = optional(single(
    "BaseType",
    ENTITY_TYPE,
    TargetSpace::Owner,
    normalize::type_reference,
));
pub static PROPERTY_REF: BindingSpec = single(
    "Name",
    PROPERTY,
    TargetSpace::Owner,
    normalize::key_property,
);
pub static NAVIGATION_RELATIONSHIP: BindingSpec = single(
    "Relationship",
    ASSOCIATION,
    TargetSpace::Owner,
    normalize::type_reference,
);
pub static NAVIGATION_FROM_ROLE: BindingSpec = single(
    "FromRole",
    ASSOCIATION_END,
    TargetSpace::Owner,
    normalize::navigation_role,
);
pub static NAVIGATION_TO_ROLE: BindingSpec = single(
    "ToRole",
    ASSOCIATION_END,
    TargetSpace::Owner,
    normalize::navigation_role,
);
pub static END_TYPE: BindingSpec = single(
    "Type",
    ENTITY_TYPE,
    TargetSpace::Owner,
    normalize::type_reference,
);

pub static CDM_CONTAINER: BindingSpec = single(
    "CdmEntityContainer",
    &[ElementKind::EntityContainer],
    CONCEPTUAL,
    normalize::container_name,
);
pub static STORAGE_CONTAINER: BindingSpec = single(
    "StorageEntityContainer",
    &[ElementKind::EntityContainer],
    STORAGE,
    normalize::container_name,
);
pub static MAPPED_ENTITY_SET: BindingSpec = single(
    "Name",
    ENTITY_SET,
    CONCEPTUAL,
    normalize::mapped_container_member,
);
pub static MAPPED_TYPES: BindingSpec = BindingSpec {
    shape: BindingShape::List,
    ..single("TypeName", ENTITY_TYPE, CONCEPTUAL, normalize::mapped_type)
};
pub static STORE_ENTITY_SET: BindingSpec = single(
    "StoreEntitySet",
    ENTITY_SET,
    STORAGE,
    normalize::mapped_store_entity_set,
);
pub static MAPPED_PROPERTY: BindingSpec =
    single("Name", PROPERTY, CONCEPTUAL, normalize::mapped_property);
pub static CONDITION_PROPERTY: BindingSpec = optional(single(
    "Name",
    PROPERTY,
    CONCEPTUAL,
    normalize::mapped_property,
));
pub static MAPPED_ASSOCIATION_SET: BindingSpec = single(
    "Name",
    &[ElementKind::AssociationSet],
    CONCEPTUAL,
    normalize::mapped_container_member,
);
pub static MAPPED_ASSOCIATION: BindingSpec =
    single("TypeName", ASSOCIATION, CONCEPTUAL, normalize::mapped_type);
pub static MAPPED_SET_END: BindingSpec = single(
    "Name",
    &[ElementKind::AssociationSetEnd],
    CONCEPTUAL,
    normalize::mapped_association_set_end,
);
pub static MAPPED_FUNCTION_IMPORT: BindingSpec = single(
    "FunctionImportName",
    &[ElementKind::FunctionImport],
    CONCEPTUAL,
    normalize::mapped_container_member,
);
pub static MAPPED_FUNCTION: BindingSpec = single(
    "FunctionName",
    &[ElementKind::Function],
    STORAGE,
    normalize::mapped_type,
);

pub static SHAPE_ENTITY_TYPE: BindingSpec =
    single("EntityType", ENTITY_TYPE, CONCEPTUAL, normalize::mapped_type);
pub static CONNECTOR_ASSOCIATION: BindingSpec =
    single("Association", ASSOCIATION, CONCEPTUAL, normalize::mapped_type);

// ============================================================================
// NODE DATA
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize))]
pub enum Multiplicity {
    ZeroOrOne,
    One,
    Many,
}

impl Multiplicity {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "0..1" => Some(Self::ZeroOrOne),
            "1" => Some(Self::One),
            "*" => Some(Self::Many),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZeroOrOne => "0..1",
            Self::One => "1",
            Self::Many => "*",
        }
    }
}

/// An attribute that falls back to a default when not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultableValue {
    pub attribute: &'static str,
    pub value: Option<String>,
    pub default: Option<&'static str>,
}

impl DefaultableValue {
    pub fn effective(&self) -> Option<&str> {
        self.value.as_deref().or(self.default)
    }

    pub fn is_default(&self) -> bool {
        self.value.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub enum NodeData {
    /// Parse has not run since the last reset.
    #[default]
    Unparsed,
    /// Kinds with no typed fields of their own.
    Container,
    Schema {
        namespace: String,
        alias: Option<String>,
    },
    EntityContainer {
        name: String,
        type_access: Option<String>,
        lazy_loading_enabled: Option<bool>,
    },
    EntitySet {
        name: String,
        entity_type: ItemBinding,
        getter_access: Option<String>,
    },
    AssociationSet {
        name: String,
        association: ItemBinding,
    },
    AssociationSetEnd {
        role: ItemBinding,
        entity_set: ItemBinding,
    },
    FunctionImport {
        name: String,
        entity_set: ItemBinding,
    },
    EntityType {
        name: String,
        base_type: ItemBinding,
        is_abstract: bool,
    },
    PropertyRef {
        name: ItemBinding,
    },
    Property {
        name: String,
        type_name: Option<String>,
        nullable: Option<bool>,
    },
    NavigationProperty {
        name: String,
        relationship: ItemBinding,
        from_role: ItemBinding,
        to_role: ItemBinding,
    },
    Association {
        name: String,
    },
    AssociationEnd {
        role: String,
        end_type: ItemBinding,
        multiplicity: Option<Multiplicity>,
    },
    Function {
        name: String,
    },
    Documentation {
        summary: Option<String>,
        long_description: Option<String>,
    },
    EntityContainerMapping {
        cdm_container: ItemBinding,
        storage_container: ItemBinding,
    },
    EntitySetMapping {
        entity_set: ItemBinding,
    },
    EntityTypeMapping {
        types: ItemBinding,
    },
    MappingFragment {
        store_entity_set: ItemBinding,
    },
    ScalarProperty {
        property: ItemBinding,
        column_name: Option<String>,
    },
    Condition {
        property: ItemBinding,
        column_name: Option<String>,
        value: Option<String>,
        is_null: Option<bool>,
    },
    AssociationSetMapping {
        association_set: ItemBinding,
        association: ItemBinding,
        store_entity_set: ItemBinding,
    },
    EndProperty {
        set_end: ItemBinding,
    },
    FunctionImportMapping {
        function_import: ItemBinding,
        function: ItemBinding,
    },
    DesignerProperty {
        name: String,
        value: Option<String>,
    },
    Diagram {
        name: String,
    },
    EntityTypeShape {
        entity_type: ItemBinding,
    },
    AssociationConnector {
        association: ItemBinding,
    },
}

/// Everything Parse needs to know about one element.
pub(crate) struct ParseInput<'a> {
    pub kind: ElementKind,
    pub parent: Option<ElementKind>,
    pub artifact: ArtifactKind,
    pub raw: &'a RawElement,
}

struct FieldReader<'a> {
    raw: &'a RawElement,
    errors: Vec<String>,
}

impl FieldReader<'_> {
    fn name(&self, attr: &str) -> String {
        self.raw.attr(attr).unwrap_or_default().trim().to_string()
    }

    fn opt(&self, attr: &str) -> Option<String> {
        self.raw.attr(attr).map(str::to_string)
    }

    fn required(&mut self, attr: &str) -> String {
        match self.raw.attr(attr) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => {
                self.errors.push(format!(
                    "{} is missing the required '{attr}' attribute",
                    self.raw.tag
                ));
                String::new()
            }
        }
    }

    fn flag(&mut self, attr: &str) -> Option<bool> {
        let value = self.raw.attr(attr)?;
        match value.trim() {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                self.errors.push(format!(
                    "'{attr}' must be 'true' or 'false', found '{other}'"
                ));
                None
            }
        }
    }

    fn bind(&self, spec: &'static BindingSpec) -> ItemBinding {
        ItemBinding::new(spec, self.opt(spec.role))
    }
}

impl NodeData {
    /// Read typed fields from the raw element. Structural problems are
    /// returned alongside the data; they never stop the parse.
    pub(crate) fn parse(input: ParseInput<'_>) -> (NodeData, Vec<String>) {
        use ElementKind as K;

        let mut r = FieldReader {
            raw: input.raw,
            errors: Vec::new(),
        };

        let data = match input.kind {
            K::Schema => NodeData::Schema {
                namespace: r.required("Namespace"),
                alias: r.opt("Alias").filter(|a| !a.trim().is_empty()),
            },
            K::EntityContainer => NodeData::EntityContainer {
                name: r.name("Name"),
                type_access: r.opt("TypeAccess"),
                lazy_loading_enabled: r.flag("LazyLoadingEnabled"),
            },
            K::EntitySet => NodeData::EntitySet {
                name: r.name("Name"),
                entity_type: r.bind(&ENTITY_SET_TYPE),
                getter_access: r.opt("GetterAccess"),
            },
            K::AssociationSet => NodeData::AssociationSet {
                name: r.name("Name"),
                association: r.bind(&ASSOCIATION_SET_ASSOCIATION),
            },
            K::AssociationSetEnd => NodeData::AssociationSetEnd {
                role: r.bind(&SET_END_ROLE),
                entity_set: r.bind(&SET_END_ENTITY_SET),
            },
            K::FunctionImport => NodeData::FunctionImport {
                name: r.name("Name"),
                entity_set: r.bind(&FUNCTION_IMPORT_ENTITY_SET),
            },
            K::EntityType => NodeData::EntityType {
                name: r.name("Name"),
                base_type: r.bind(&BASE_TYPE),
                is_abstract: r.flag("Abstract").unwrap_or(false),
            },
            K::PropertyRef => NodeData::PropertyRef {
                name: r.bind(&PROPERTY_REF),
            },
            K::Property => NodeData::Property {
                name: r.name("Name"),
                type_name: r.opt("Type"),
                nullable: r.flag("Nullable"),
            },
            K::NavigationProperty => NodeData::NavigationProperty {
                name: r.name("Name"),
                relationship: r.bind(&NAVIGATION_RELATIONSHIP),
                from_role: r.bind(&NAVIGATION_FROM_ROLE),
                to_role: r.bind(&NAVIGATION_TO_ROLE),
            },
            K::Association => NodeData::Association {
                name: r.name("Name"),
            },
            K::AssociationEnd => {
                let multiplicity = r.opt("Multiplicity").and_then(|text| {
                    let parsed = Multiplicity::parse(&text);
                    if parsed.is_none() {
                        r.errors.push(format!(
                            "'{text}' is not a valid multiplicity (expected 0..1, 1 or *)"
                        ));
                    }
                    parsed
                });
                NodeData::AssociationEnd {
                    role: r.name("Role"),
                    end_type: r.bind(&END_TYPE),
                    multiplicity,
                }
            }
            K::Function => NodeData::Function {
                name: r.name("Name"),
            },
            K::Documentation => NodeData::Documentation {
                summary: input.raw.inline_text("Summary").map(str::to_string),
                long_description: input.raw.inline_text("LongDescription").map(str::to_string),
            },
            K::EntityContainerMapping => NodeData::EntityContainerMapping {
                cdm_container: r.bind(&CDM_CONTAINER),
                storage_container: r.bind(&STORAGE_CONTAINER),
            },
            K::EntitySetMapping => NodeData::EntitySetMapping {
                entity_set: r.bind(&MAPPED_ENTITY_SET),
            },
            K::EntityTypeMapping => NodeData::EntityTypeMapping {
                types: r.bind(&MAPPED_TYPES),
            },
            K::MappingFragment => NodeData::MappingFragment {
                store_entity_set: r.bind(&STORE_ENTITY_SET),
            },
            K::ScalarProperty => NodeData::ScalarProperty {
                property: r.bind(&MAPPED_PROPERTY),
                column_name: r.opt("ColumnName"),
            },
            K::Condition => {
                let property = r.bind(&CONDITION_PROPERTY);
                let column_name = r.opt("ColumnName");
                let value = r.opt("Value");
                let is_null = r.flag("IsNull");
                if property.is_absent() && column_name.is_none() {
                    r.errors
                        .push("Condition must specify either 'Name' or 'ColumnName'".to_string());
                }
                if value.is_some() && is_null.is_some() {
                    r.errors
                        .push("Condition cannot specify both 'Value' and 'IsNull'".to_string());
                }
                NodeData::Condition {
                    property,
                    column_name,
                    value,
                    is_null,
                }
            }
            K::AssociationSetMapping => NodeData::AssociationSetMapping {
                association_set: r.bind(&MAPPED_ASSOCIATION_SET),
                association: r.bind(&MAPPED_ASSOCIATION),
                store_entity_set: r.bind(&STORE_ENTITY_SET),
            },
            K::EndProperty => NodeData::EndProperty {
                set_end: r.bind(&MAPPED_SET_END),
            },
            K::FunctionImportMapping => NodeData::FunctionImportMapping {
                function_import: r.bind(&MAPPED_FUNCTION_IMPORT),
                function: r.bind(&MAPPED_FUNCTION),
            },
            K::DesignerProperty => NodeData::DesignerProperty {
                name: r.name("Name"),
                value: r
                    .opt("Value")
                    .or_else(|| input.raw.inline_text("Value").map(str::to_string)),
            },
            K::Diagram => NodeData::Diagram {
                name: r.name("Name"),
            },
            K::EntityTypeShape => NodeData::EntityTypeShape {
                entity_type: r.bind(&SHAPE_ENTITY_TYPE),
            },
            K::AssociationConnector => NodeData::AssociationConnector {
                association: r.bind(&CONNECTOR_ASSOCIATION),
            },
            K::Unknown => {
                let message = match input.parent {
                    Some(parent) => format!(
                        "'{}' is not valid inside {}",
                        input.raw.tag,
                        parent.display()
                    ),
                    None => format!(
                        "'{}' is not a valid root for a {} document",
                        input.raw.tag,
                        input.artifact.display()
                    ),
                };
                r.errors.push(message);
                NodeData::Container
            }
            K::Key
            | K::Mapping
            | K::ResultMapping
            | K::Designer
            | K::DesignerSection
            | K::DesignerInfoPropertySet
            | K::Diagrams
            | K::Opaque => NodeData::Container,
        };

        (data, r.errors)
    }

    /// The node's own declared name, as written.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeData::Schema { namespace, .. } => Some(namespace),
            NodeData::EntityContainer { name, .. }
            | NodeData::EntitySet { name, .. }
            | NodeData::AssociationSet { name, .. }
            | NodeData::FunctionImport { name, .. }
            | NodeData::EntityType { name, .. }
            | NodeData::Property { name, .. }
            | NodeData::NavigationProperty { name, .. }
            | NodeData::Association { name }
            | NodeData::Function { name }
            | NodeData::DesignerProperty { name, .. }
            | NodeData::Diagram { name } => Some(name),
            NodeData::AssociationEnd { role, .. } => Some(role),
            NodeData::AssociationSetEnd { role, .. } => Some(role.raw().unwrap_or_default().trim()),
            _ => None,
        }
    }

    /// Bindings in declaration order.
    pub fn bindings(&self) -> Vec<&ItemBinding> {
        match self {
            NodeData::EntitySet { entity_type: b, .. }
            | NodeData::AssociationSet { association: b, .. }
            | NodeData::FunctionImport { entity_set: b, .. }
            | NodeData::EntityType { base_type: b, .. }
            | NodeData::PropertyRef { name: b }
            | NodeData::AssociationEnd { end_type: b, .. }
            | NodeData::EntitySetMapping { entity_set: b }
            | NodeData::EntityTypeMapping { types: b }
            | NodeData::MappingFragment { store_entity_set: b }
            | NodeData::ScalarProperty { property: b, .. }
            | NodeData::Condition { property: b, .. }
            | NodeData::EndProperty { set_end: b }
            | NodeData::EntityTypeShape { entity_type: b }
            | NodeData::AssociationConnector { association: b } => vec![b],
            NodeData::AssociationSetEnd { role, entity_set } => vec![role, entity_set],
            NodeData::NavigationProperty {
                relationship,
                from_role,
                to_role,
                ..
            } => vec![relationship, from_role, to_role],
            NodeData::EntityContainerMapping {
                cdm_container,
                storage_container,
            } => vec![cdm_container, storage_container],
            NodeData::AssociationSetMapping {
                association_set,
                association,
                store_entity_set,
            } => vec![association_set, association, store_entity_set],
            NodeData::FunctionImportMapping {
                function_import,
                function,
            } => vec![function_import, function],
            _ => Vec::new(),
        }
    }

    pub(crate) fn bindings_mut(&mut self) -> Vec<&mut ItemBinding> {
        match self {
            NodeData::EntitySet { entity_type: b, .. }
            | NodeData::AssociationSet { association: b, .. }
            | NodeData::FunctionImport { entity_set: b, .. }
            | NodeData::EntityType { base_type: b, .. }
            | NodeData::PropertyRef { name: b }
            | NodeData::AssociationEnd { end_type: b, .. }
            | NodeData::EntitySetMapping { entity_set: b }
            | NodeData::EntityTypeMapping { types: b }
            | NodeData::MappingFragment { store_entity_set: b }
            | NodeData::ScalarProperty { property: b, .. }
            | NodeData::Condition { property: b, .. }
            | NodeData::EndProperty { set_end: b }
            | NodeData::EntityTypeShape { entity_type: b }
            | NodeData::AssociationConnector { association: b } => vec![b],
            NodeData::AssociationSetEnd { role, entity_set } => vec![role, entity_set],
            NodeData::NavigationProperty {
                relationship,
                from_role,
                to_role,
                ..
            } => vec![relationship, from_role, to_role],
            NodeData::EntityContainerMapping {
                cdm_container,
                storage_container,
            } => vec![cdm_container, storage_container],
            NodeData::AssociationSetMapping {
                association_set,
                association,
                store_entity_set,
            } => vec![association_set, association, store_entity_set],
            NodeData::FunctionImportMapping {
                function_import,
                function,
            } => vec![function_import, function],
            _ => Vec::new(),
        }
    }

    pub(crate) fn binding_mut(&mut self, role: &str) -> Option<&mut ItemBinding> {
        self.bindings_mut().into_iter().find(|b| b.role() == role)
    }

    pub fn binding(&self, role: &str) -> Option<&ItemBinding> {
        self.bindings().into_iter().find(|b| b.role() == role)
    }

    /// Attributes with defaults, in declaration order.
    pub fn defaultable_values(&self) -> Vec<DefaultableValue> {
        let value = |attribute, value: &Option<String>, default| DefaultableValue {
            attribute,
            value: value.clone(),
            default,
        };
        match self {
            NodeData::EntityContainer {
                type_access,
                lazy_loading_enabled,
                ..
            } => vec![
                value("TypeAccess", type_access, Some("Public")),
                value(
                    "LazyLoadingEnabled",
                    &lazy_loading_enabled.map(|b| b.to_string()),
                    Some("false"),
                ),
            ],
            NodeData::EntitySet { getter_access, .. } => {
                vec![value("GetterAccess", getter_access, Some("Public"))]
            }
            NodeData::ScalarProperty { column_name, .. } => {
                vec![value("ColumnName", column_name, None)]
            }
            NodeData::DesignerProperty { value: v, .. } => vec![value("Value", v, Some(""))],
            _ => Vec::new(),
        }
    }

    pub fn defaultable_value(&self, attribute: &str) -> Option<DefaultableValue> {
        self.defaultable_values()
            .into_iter()
            .find(|v| v.attribute == attribute)
    }
}
