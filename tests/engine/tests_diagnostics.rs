//! Validation findings produced from stored node and binding state.

use edmx::diagnostics::codes;
use edmx::model::Unresolved;
use edmx::{
    ArtifactKind, BindingRef, BindingStatus, ElementKind, EngineOptions, FindingKind, NodeState,
    ResolutionEngine, Severity,
};

use crate::helpers::engine_helpers::*;
use crate::helpers::fixtures::{self, el, leaf};

fn schema_engine(schema: edmx::Fragment) -> ResolutionEngine {
    let mut engine = ResolutionEngine::new();
    engine.load_artifact("Test.csdl", ArtifactKind::Conceptual, schema);
    engine.commit_edit().unwrap();
    engine
}

#[test]
fn test_structural_error_does_not_block_siblings() {
    let engine = schema_engine(el(
        "Schema",
        &[("Namespace", "Model")],
        vec![el(
            "EntityType",
            &[("Name", "Customer")],
            vec![
                fixtures::key("Id"),
                leaf(
                    "Property",
                    &[("Name", "Id"), ("Type", "Int32"), ("Nullable", "maybe")],
                ),
                leaf("Bogus", &[("Name", "X")]),
                fixtures::property("Name", "String"),
            ],
        )],
    ));

    let findings = engine.findings();
    let structural: Vec<_> = findings.with_code(codes::STRUCTURAL).collect();
    assert_eq!(structural.len(), 2);
    assert!(structural[0].message.contains("'Nullable'"));
    assert!(
        structural[1]
            .message
            .contains("'Bogus' is not valid inside EntityType")
    );
    assert!(structural.iter().all(|f| f.kind == FindingKind::StructuralParseError));

    let bogus = nodes_of_kind(&engine, ElementKind::Unknown)[0];
    assert_eq!(structural[1].node, bogus);
    assert!(
        engine
            .artifacts()
            .nodes()
            .all(|n| n.state() == NodeState::Resolved)
    );
    let property_ref = nodes_of_kind(&engine, ElementKind::PropertyRef)[0];
    assert_eq!(status(&engine, property_ref, "Name"), BindingStatus::Known);
    assert!(engine.get_node(&edmx::Symbol::new("Model.Customer.Name")).is_some());
}

#[test]
fn test_opaque_elements_are_kept_without_findings() {
    let engine = schema_engine(el(
        "Schema",
        &[("Namespace", "Model")],
        vec![
            el(
                "ComplexType",
                &[("Name", "Address")],
                vec![fixtures::property("Street", "String")],
            ),
            el(
                "Association",
                &[("Name", "A")],
                vec![el(
                    "ReferentialConstraint",
                    &[],
                    vec![leaf("Principal", &[("Role", "X")])],
                )],
            ),
        ],
    ));

    assert!(engine.findings().is_empty());
    let opaque = nodes_of_kind(&engine, ElementKind::Opaque);
    assert_eq!(opaque.len(), 4);
    let root = engine.artifacts().artifacts().next().unwrap().root().unwrap();
    assert_eq!(engine.to_fragment(root).unwrap().subtree_size(), 6);
}

#[test]
fn test_invalid_root_reports_once() {
    let mut engine = ResolutionEngine::new();
    engine.load_artifact(
        "Test.msl",
        ArtifactKind::Mapping,
        el("Schema", &[("Namespace", "Model")], vec![leaf("EntityType", &[("Name", "T")])]),
    );
    engine.commit_edit().unwrap();

    let findings = engine.findings();
    assert_eq!(findings.len(), 1);
    assert!(
        findings.findings()[0]
            .message
            .contains("not a valid root for a mapping document")
    );
}

#[test]
fn test_optional_binding_absent_is_silent() {
    let engine = schema_engine(el(
        "Schema",
        &[("Namespace", "Model")],
        vec![
            leaf("EntityType", &[("Name", "Base")]),
            leaf("EntityType", &[("Name", "Derived"), ("BaseType", "Model.Base")]),
            leaf("EntityType", &[("Name", "Orphan"), ("BaseType", "Model.Nothing")]),
        ],
    ));
    let base = node_id(&engine, "Model.Base");
    let derived = node_id(&engine, "Model.Derived");
    let orphan = node_id(&engine, "Model.Orphan");

    assert_eq!(status(&engine, base, "BaseType"), BindingStatus::Undefined);
    assert_eq!(target(&engine, derived, "BaseType"), Some(base));
    let findings = engine.findings();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings.findings()[0].node, orphan);
    assert_eq!(
        findings.findings()[0].binding(),
        Some(BindingRef::new(orphan, "BaseType"))
    );
}

#[test]
fn test_wrong_kind_reference() {
    let (mut engine, _) = loaded_engine();
    let customers = node_id(&engine, "ModelContainer.Customers");
    engine.begin_edit(customers).unwrap();
    engine
        .set_attribute(customers, "EntityType", "Model.CustomerOrder")
        .unwrap();
    engine.commit_edit().unwrap();

    let slot = engine
        .artifacts()
        .binding(BindingRef::new(customers, "EntityType"))
        .unwrap()
        .slots()[0]
        .clone();
    assert_eq!(slot.reason, Some(Unresolved::WrongKind(ElementKind::Association)));
    let findings = engine.findings();
    let finding = findings.for_node(customers).next().unwrap();
    assert_eq!(finding.code, codes::UNDEFINED_REFERENCE);
    assert!(finding.message.contains("names a Association, expected EntityType"));
}

#[test]
fn test_mapping_reference_into_wrong_artifact() {
    let (mut engine, _) = loaded_engine();
    let set_mapping = nodes_of_kind(&engine, ElementKind::EntitySetMapping)[0];
    let container_mapping = nodes_of_kind(&engine, ElementKind::EntityContainerMapping)[0];

    // The conceptual container name written where the storage one belongs.
    engine.begin_edit(container_mapping).unwrap();
    engine
        .set_attribute(container_mapping, "StorageEntityContainer", "ModelContainer")
        .unwrap();
    engine.commit_edit().unwrap();

    assert_eq!(
        status(&engine, container_mapping, "StorageEntityContainer"),
        BindingStatus::Undefined
    );
    assert_eq!(status(&engine, set_mapping, "Name"), BindingStatus::Known);
    let fragment = nodes_of_kind(&engine, ElementKind::MappingFragment)[0];
    assert_eq!(
        status(&engine, fragment, "StoreEntitySet"),
        BindingStatus::Undefined
    );
}

#[test]
fn test_identifier_warnings_follow_options() {
    let schema = el(
        "Schema",
        &[("Namespace", "Model")],
        vec![
            leaf("EntityType", &[("Name", "Order Line")]),
            leaf("EntityType", &[("Name", "")]),
        ],
    );

    let engine = schema_engine(schema.clone());
    let findings = engine.findings();
    let naming: Vec<_> = findings.with_code(codes::NAMING).collect();
    assert_eq!(naming.len(), 2);
    assert!(naming.iter().all(|f| f.severity == Severity::Warning));
    assert!(naming[0].message.contains("'Order Line' is not a valid identifier"));
    assert!(naming[1].message.contains("has no name"));

    let mut quiet = ResolutionEngine::with_options(EngineOptions {
        validate_identifiers: false,
        ..EngineOptions::default()
    });
    quiet.load_artifact("Test.csdl", ArtifactKind::Conceptual, schema);
    quiet.commit_edit().unwrap();
    assert!(quiet.findings().is_empty());
}

#[test]
fn test_condition_shape_errors() {
    let (mut engine, _) = loaded_engine();
    let fragment = nodes_of_kind(&engine, ElementKind::MappingFragment)[0];
    let good = engine
        .insert_fragment(
            fragment,
            None,
            leaf("Condition", &[("ColumnName", "Kind"), ("Value", "1")]),
        )
        .unwrap();
    let bad = engine
        .insert_fragment(
            fragment,
            None,
            leaf("Condition", &[("Name", "Id"), ("Value", "1"), ("IsNull", "false")]),
        )
        .unwrap();
    let empty = engine
        .insert_fragment(fragment, None, leaf("Condition", &[("IsNull", "true")]))
        .unwrap();
    engine.commit_edit().unwrap();

    let findings = engine.findings();
    assert_eq!(findings.for_node(good).count(), 0);
    assert!(
        findings
            .for_node(bad)
            .any(|f| f.message.contains("both 'Value' and 'IsNull'"))
    );
    assert_eq!(target(&engine, bad, "Name"), Some(node_id(&engine, "Model.Customer.Id")));
    assert!(
        findings
            .for_node(empty)
            .any(|f| f.message.contains("either 'Name' or 'ColumnName'"))
    );
}

#[test]
fn test_result_mapping_rows_are_modelled() {
    let (mut engine, _) = loaded_engine();
    let container_mapping = nodes_of_kind(&engine, ElementKind::EntityContainerMapping)[0];
    let import_mapping = engine
        .insert_fragment(
            container_mapping,
            None,
            el(
                "FunctionImportMapping",
                &[
                    ("FunctionImportName", "GetCustomers"),
                    ("FunctionName", "Model.Store.GetCustomers"),
                ],
                vec![el(
                    "ResultMapping",
                    &[],
                    vec![el(
                        "EntityTypeMapping",
                        &[("TypeName", "Model.Customer")],
                        vec![leaf("ScalarProperty", &[("Name", "Id"), ("ColumnName", "CustomerId")])],
                    )],
                )],
            ),
        )
        .unwrap();
    engine.commit_edit().unwrap();

    let row = *engine.artifacts().subtree(import_mapping).last().unwrap();
    assert_eq!(engine.node(row).map(|n| n.kind()), Some(ElementKind::ScalarProperty));
    assert_eq!(target(&engine, row, "Name"), Some(node_id(&engine, "Model.Customer.Id")));
    assert_eq!(engine.artifacts().display_name(row), "Id <==> CustomerId");

    let findings = engine.findings();
    assert_eq!(findings.with_code(codes::STRUCTURAL).count(), 0);
    assert_eq!(findings.for_node(row).count(), 0);
}

#[test]
fn test_validator_is_lazy_and_restartable() {
    let (mut engine, _) = loaded_engine();
    let customer = node_id(&engine, "Model.Customer");
    engine.delete_node(customer).unwrap();
    engine.commit_edit().unwrap();

    let total = engine.validate().count();
    assert!(total > 2);
    let first_two: Vec<_> = engine.validate().take(2).collect();
    let again: Vec<_> = engine.validate().take(2).collect();
    assert_eq!(first_two, again);
    assert!(first_two.iter().all(|f| f.is_error()));

    let order: Vec<_> = engine
        .validate()
        .map(|f| engine.artifacts().order_key(f.node))
        .collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
}

#[test]
fn test_designer_properties_are_scoped_by_section() {
    let mut engine = ResolutionEngine::new();
    let property = |name: &str| {
        el(
            "DesignerInfoPropertySet",
            &[],
            vec![leaf("DesignerProperty", &[("Name", name), ("Value", "true")])],
        )
    };
    engine.load_artifact(
        "Model.designer",
        ArtifactKind::Designer,
        el(
            "Designer",
            &[],
            vec![
                el("Connection", &[], vec![property("MetadataArtifactProcessing")]),
                el("Options", &[], vec![property("MetadataArtifactProcessing")]),
            ],
        ),
    );
    engine.commit_edit().unwrap();

    assert!(engine.findings().is_empty());
    let connection = edmx::Symbol::scoped("MetadataArtifactProcessing", "Connection");
    let options = edmx::Symbol::scoped("MetadataArtifactProcessing", "Options");
    assert_eq!(engine.artifacts().lookup(&connection).len(), 1);
    assert_eq!(engine.artifacts().lookup(&options).len(), 1);
}
