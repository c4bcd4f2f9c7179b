//! Change propagation across artifacts.

use std::collections::BTreeSet;

use edmx::model::Unresolved;
use edmx::{
    ArtifactKind, BindingRef, BindingStatus, ElementKind, EngineOptions, NodeId, ResolutionEngine,
    Symbol,
};

use crate::helpers::engine_helpers::*;
use crate::helpers::fixtures;

#[test]
fn test_fixture_model_resolves_cleanly() {
    let (engine, _) = loaded_engine();

    let findings = engine.findings();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    for binding in all_bindings(&engine) {
        let node = engine.node(binding.owner).unwrap();
        let item = node.binding(binding.role).unwrap();
        if !item.spec().optional {
            assert_eq!(
                item.status(),
                BindingStatus::Known,
                "{binding} on {} should resolve",
                node.kind()
            );
        }
    }
}

#[test]
fn test_delete_customer_makes_referencers_undefined() {
    let (mut engine, _) = loaded_engine();
    let customer = node_id(&engine, "Model.Customer");
    let customer_id = node_id(&engine, "Model.Customer.Id");
    let customers = node_id(&engine, "ModelContainer.Customers");
    let end = node_id(&engine, "Model.CustomerOrder.Customer");
    let shape = find_node(&engine, ElementKind::EntityTypeShape, "EntityType", "Model.Customer");
    let scalar = end_scalar(&engine, "Customer");
    assert_eq!(target(&engine, scalar, "Name"), Some(customer_id));

    engine.delete_node(customer).unwrap();
    // Deletes apply at commit.
    assert!(engine.node(customer).is_some());
    let report = engine.commit_edit().unwrap();

    assert!(engine.node(customer).is_none());
    assert!(engine.node(customer_id).is_none());
    assert!(engine.get_node(&Symbol::new("Model.Customer")).is_none());
    assert!(report.removed.contains(&customer));
    assert!(report.removed.contains(&customer_id));
    assert!(
        report
            .changed_symbols
            .contains(&Symbol::new("Model.Customer"))
    );

    for (owner, role) in [
        (customers, "EntityType"),
        (end, "Type"),
        (shape, "EntityType"),
        (scalar, "Name"),
    ] {
        assert_eq!(status(&engine, owner, role), BindingStatus::Undefined);
        assert!(report.rebound.contains(&owner), "{owner} was not rebound");
    }
    let slot = &engine
        .artifacts()
        .binding(BindingRef::new(customers, "EntityType"))
        .unwrap()
        .slots()[0];
    assert_eq!(slot.reason, Some(Unresolved::NotFound));
    assert_eq!(slot.symbol, Symbol::new("Model.Customer"));

    assert!(!engine.artifacts().anti_dependencies().has_referencers(customer));
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_reinserted_customer_satisfies_waiting_references() {
    let (mut engine, loaded) = loaded_engine();
    let before = engine.findings();
    assert!(before.is_empty());

    let customer = node_id(&engine, "Model.Customer");
    engine.delete_node(customer).unwrap();
    engine.commit_edit().unwrap();
    assert!(engine.findings().error_count() > 0);

    let schema = root_of(&engine, loaded.conceptual);
    let inserted = engine
        .insert_fragment(schema, Some(1), fixtures::customer_type())
        .unwrap();
    engine.commit_edit().unwrap();

    assert_eq!(node_id(&engine, "Model.Customer"), inserted);
    let customers = node_id(&engine, "ModelContainer.Customers");
    assert_eq!(target(&engine, customers, "EntityType"), Some(inserted));
    let scalar = end_scalar(&engine, "Customer");
    assert_eq!(
        target(&engine, scalar, "Name"),
        Some(node_id(&engine, "Model.Customer.Id"))
    );
    assert!(engine.findings().is_empty());
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_duplicate_declaration_resolves_to_first() {
    let (mut engine, loaded) = loaded_engine();
    let order = node_id(&engine, "Model.Order");
    let orders = node_id(&engine, "ModelContainer.Orders");

    let schema = root_of(&engine, loaded.conceptual);
    let duplicate = engine
        .insert_fragment(schema, None, fixtures::order_type())
        .unwrap();
    let report = engine.commit_edit().unwrap();

    assert_eq!(
        engine.artifacts().lookup(&Symbol::new("Model.Order")),
        vec![order, duplicate]
    );
    assert_eq!(node_id(&engine, "Model.Order"), order);
    assert_eq!(target(&engine, orders, "EntityType"), Some(order));
    assert!(report.rebound.contains(&orders));

    let findings = engine.findings();
    let copies: BTreeSet<NodeId> = engine.artifacts().subtree(duplicate).into_iter().collect();
    let duplicates: Vec<_> = findings.with_code("W0004").collect();
    assert!(duplicates.iter().any(|f| f.node == duplicate));
    assert!(duplicates.iter().all(|f| copies.contains(&f.node)));
    assert!(duplicates.iter().all(|f| f.kind.is_ambiguity()));
    assert!(
        findings
            .with_code("W0002")
            .any(|f| f.binding() == Some(BindingRef::new(orders, "EntityType")))
    );
    assert_eq!(findings.error_count(), 0);
}

#[test]
fn test_removing_duplicate_clears_ambiguity() {
    let (mut engine, loaded) = loaded_engine();
    let schema = root_of(&engine, loaded.conceptual);
    let duplicate = engine
        .insert_fragment(schema, None, fixtures::order_type())
        .unwrap();
    engine.commit_edit().unwrap();
    assert!(!engine.findings().is_empty());

    engine.delete_node(duplicate).unwrap();
    engine.commit_edit().unwrap();
    assert!(engine.findings().is_empty());
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_context_dependency_follows_association_end_type() {
    let (mut engine, _) = loaded_engine();
    let end = node_id(&engine, "Model.CustomerOrder.Customer");
    let scalar = end_scalar(&engine, "Customer");
    assert!(
        engine
            .artifacts()
            .anti_dependencies()
            .context_dependents(end)
            .contains(&BindingRef::new(scalar, "Name"))
    );

    engine.begin_edit(end).unwrap();
    engine.set_attribute(end, "Type", "Self.Order").unwrap();
    let report = engine.commit_edit().unwrap();

    assert!(report.rebound.contains(&scalar));
    assert_eq!(
        target(&engine, scalar, "Name"),
        Some(node_id(&engine, "Model.Order.Id"))
    );
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_reinserted_association_end_restores_end_mapping_rows() {
    let (mut engine, _) = loaded_engine();
    let association = node_id(&engine, "Model.CustomerOrder");
    let end = node_id(&engine, "Model.CustomerOrder.Customer");
    let scalar = end_scalar(&engine, "Customer");

    engine.delete_node(end).unwrap();
    engine.commit_edit().unwrap();
    assert_eq!(status(&engine, scalar, "Name"), BindingStatus::Undefined);
    assert!(
        engine
            .artifacts()
            .anti_dependencies()
            .lookup_dependents(&Symbol::new("Model.CustomerOrder.Customer"))
            .contains(&BindingRef::new(scalar, "Name"))
    );

    engine
        .insert_fragment(
            association,
            Some(0),
            fixtures::leaf(
                "End",
                &[
                    ("Role", "Customer"),
                    ("Type", "Self.Customer"),
                    ("Multiplicity", "1"),
                ],
            ),
        )
        .unwrap();
    let report = engine.commit_edit().unwrap();

    assert!(report.rebound.contains(&scalar));
    assert_eq!(
        target(&engine, scalar, "Name"),
        Some(node_id(&engine, "Model.Customer.Id"))
    );
    let incremental = snapshot(&engine);
    engine.rebuild().unwrap();
    assert_eq!(snapshot(&engine), incremental);
}

#[test]
fn test_schema_alias_edit_rebinds_end_mapping_rows() {
    let (mut engine, _) = loaded_engine();
    let schema = node_id(&engine, "Model");
    let end = node_id(&engine, "Model.CustomerOrder.Customer");
    let scalar = end_scalar(&engine, "Customer");
    assert!(
        engine
            .artifacts()
            .anti_dependencies()
            .context_dependents(schema)
            .contains(&BindingRef::new(scalar, "Name"))
    );

    engine.begin_edit(schema).unwrap();
    engine.set_attribute(schema, "Alias", "S").unwrap();
    let report = engine.commit_edit().unwrap();

    assert!(report.rebound.contains(&scalar));
    assert_eq!(status(&engine, end, "Type"), BindingStatus::Undefined);
    assert_eq!(status(&engine, scalar, "Name"), BindingStatus::Undefined);
    let incremental = snapshot(&engine);
    engine.rebuild().unwrap();
    assert_eq!(snapshot(&engine), incremental);

    engine.begin_edit(schema).unwrap();
    engine.set_attribute(schema, "Alias", "Self").unwrap();
    engine.commit_edit().unwrap();
    assert_eq!(
        target(&engine, scalar, "Name"),
        Some(node_id(&engine, "Model.Customer.Id"))
    );
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_renaming_property_rebinds_mapping_rows() {
    let (mut engine, _) = loaded_engine();
    let name_property = node_id(&engine, "Model.Customer.Name");
    let row = find_node(&engine, ElementKind::ScalarProperty, "ColumnName", "Name");
    assert_eq!(target(&engine, row, "Name"), Some(name_property));

    engine.rename_node(name_property, "FullName").unwrap();
    let report = engine.commit_edit().unwrap();

    assert!(report.rebound.contains(&row));
    assert_eq!(status(&engine, row, "Name"), BindingStatus::Undefined);
    assert!(
        engine
            .artifacts()
            .anti_dependencies()
            .waiting_on(&Symbol::new("Model.Customer.Name"))
            .contains(&BindingRef::new(row, "Name"))
    );

    engine.rename_node(name_property, "Name").unwrap();
    engine.commit_edit().unwrap();
    assert_eq!(target(&engine, row, "Name"), Some(name_property));
}

#[test]
fn test_rename_rebinds_exactly_prior_dependents_and_waiters() {
    let (mut engine, _) = loaded_engine();
    let container = node_id(&engine, "ModelContainer");
    let waiting = engine
        .insert_fragment(
            container,
            None,
            fixtures::leaf(
                "EntitySet",
                &[("Name", "Clients"), ("EntityType", "Self.Client")],
            ),
        )
        .unwrap();
    engine.commit_edit().unwrap();
    assert_eq!(status(&engine, waiting, "EntityType"), BindingStatus::Undefined);

    let customer = node_id(&engine, "Model.Customer");
    let subtree: BTreeSet<NodeId> = engine.artifacts().subtree(customer).into_iter().collect();
    let index = engine.artifacts().anti_dependencies();
    let mut expected: BTreeSet<NodeId> = subtree
        .iter()
        .flat_map(|&n| index.referencers(n))
        .map(|b| b.owner)
        .filter(|owner| !subtree.contains(owner))
        .collect();
    expected.extend(
        index
            .waiting_on(&Symbol::new("Model.Client"))
            .into_iter()
            .map(|b| b.owner),
    );
    assert!(expected.contains(&waiting));

    engine.rename_node(customer, "Client").unwrap();
    let report = engine.commit_edit().unwrap();

    let rebound: BTreeSet<NodeId> = report.rebound.iter().copied().collect();
    assert_eq!(rebound, expected);
    assert_eq!(target(&engine, waiting, "EntityType"), Some(customer));
    assert_eq!(
        status(&engine, node_id(&engine, "ModelContainer.Customers"), "EntityType"),
        BindingStatus::Undefined
    );
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_mapping_loaded_first_waits_for_schemas() {
    let mut engine = ResolutionEngine::new();
    engine.load_artifact("Model.msl", ArtifactKind::Mapping, fixtures::mapping());
    engine.commit_edit().unwrap();

    let set_mapping = nodes_of_kind(&engine, ElementKind::EntitySetMapping)[0];
    assert_eq!(status(&engine, set_mapping, "Name"), BindingStatus::Undefined);
    assert!(engine.findings().error_count() > 0);

    engine.load_artifact(
        "Model.csdl",
        ArtifactKind::Conceptual,
        fixtures::conceptual_schema(),
    );
    engine.load_artifact("Model.ssdl", ArtifactKind::Storage, fixtures::storage_schema());
    engine.commit_edit().unwrap();

    assert_eq!(
        target(&engine, set_mapping, "Name"),
        Some(node_id(&engine, "ModelContainer.Customers"))
    );
    assert!(engine.findings().is_empty());
    assert_anti_dependencies_exact(&engine);
}

#[test]
fn test_waiting_references_stay_stale_when_disabled() {
    let options = EngineOptions {
        rebind_waiting_references: false,
        ..EngineOptions::default()
    };
    let mut engine = ResolutionEngine::with_options(options);
    engine.load_artifact("Model.msl", ArtifactKind::Mapping, fixtures::mapping());
    engine.commit_edit().unwrap();
    engine.load_artifact(
        "Model.csdl",
        ArtifactKind::Conceptual,
        fixtures::conceptual_schema(),
    );
    engine.commit_edit().unwrap();

    let set_mapping = nodes_of_kind(&engine, ElementKind::EntitySetMapping)[0];
    let binding = BindingRef::new(set_mapping, "Name");
    assert_eq!(status(&engine, set_mapping, "Name"), BindingStatus::Undefined);

    let resolution = engine.rebind(binding).unwrap();
    assert_eq!(resolution.status, BindingStatus::Known);
    assert_eq!(status(&engine, set_mapping, "Name"), BindingStatus::Known);
}

#[test]
fn test_unload_artifact_detaches_mapping() {
    let (mut engine, loaded) = loaded_engine();
    let nodes_before = engine.artifacts().node_count();
    let designer_nodes = engine
        .artifacts()
        .subtree(root_of(&engine, loaded.designer))
        .len();
    let mapping_container = nodes_of_kind(&engine, ElementKind::EntityContainerMapping)[0];

    engine.unload_artifact(loaded.storage).unwrap();
    engine.unload_artifact(loaded.designer).unwrap();
    engine.commit_edit().unwrap();

    assert!(engine.artifacts().artifact(loaded.storage).is_none());
    assert!(engine.artifacts().artifact_by_uri("Model.ssdl").is_none());
    assert!(engine.artifacts().node_count() < nodes_before - designer_nodes);
    assert_eq!(
        status(&engine, mapping_container, "StorageEntityContainer"),
        BindingStatus::Undefined
    );
    assert_eq!(
        status(&engine, mapping_container, "CdmEntityContainer"),
        BindingStatus::Known
    );
    assert_anti_dependencies_exact(&engine);
}
