//! Engine setup, node lookup and model snapshot helpers.

use std::collections::{BTreeMap, BTreeSet};

use edmx::{
    ArtifactId, ArtifactKind, BindingRef, BindingStatus, ElementKind, EngineOptions, NodeId,
    NodeState, ResolutionEngine, Symbol,
};

use super::fixtures;

/// The four artifacts of the fixture model.
#[derive(Debug, Clone, Copy)]
pub struct Loaded {
    pub conceptual: ArtifactId,
    pub storage: ArtifactId,
    pub mapping: ArtifactId,
    pub designer: ArtifactId,
}

/// Load and commit the full fixture model.
pub fn loaded_engine() -> (ResolutionEngine, Loaded) {
    loaded_engine_with(EngineOptions::default())
}

pub fn loaded_engine_with(options: EngineOptions) -> (ResolutionEngine, Loaded) {
    let mut engine = ResolutionEngine::with_options(options);
    let loaded = Loaded {
        conceptual: engine.load_artifact(
            "Model.csdl",
            ArtifactKind::Conceptual,
            fixtures::conceptual_schema(),
        ),
        storage: engine.load_artifact(
            "Model.ssdl",
            ArtifactKind::Storage,
            fixtures::storage_schema(),
        ),
        mapping: engine.load_artifact("Model.msl", ArtifactKind::Mapping, fixtures::mapping()),
        designer: engine.load_artifact(
            "Model.designer",
            ArtifactKind::Designer,
            fixtures::designer(),
        ),
    };
    engine.commit_edit().expect("initial commit should succeed");
    (engine, loaded)
}

/// Node declaring `symbol`; panics when absent.
pub fn node_id(engine: &ResolutionEngine, symbol: &str) -> NodeId {
    engine
        .get_node(&Symbol::new(symbol))
        .map(|n| n.id())
        .unwrap_or_else(|| panic!("no node declares '{symbol}'"))
}

pub fn root_of(engine: &ResolutionEngine, artifact: ArtifactId) -> NodeId {
    engine
        .artifacts()
        .artifact(artifact)
        .and_then(|a| a.root())
        .expect("artifact should have a root")
}

/// Every node of `kind`, in document order.
pub fn nodes_of_kind(engine: &ResolutionEngine, kind: ElementKind) -> Vec<NodeId> {
    engine
        .artifacts()
        .document_order()
        .into_iter()
        .filter(|&id| engine.node(id).is_some_and(|n| n.kind() == kind))
        .collect()
}

/// First node of `kind` whose raw `attr` equals `value`.
pub fn find_node(engine: &ResolutionEngine, kind: ElementKind, attr: &str, value: &str) -> NodeId {
    nodes_of_kind(engine, kind)
        .into_iter()
        .find(|&id| engine.node(id).and_then(|n| n.attr(attr)) == Some(value))
        .unwrap_or_else(|| panic!("no {kind} with {attr}='{value}'"))
}

/// The ScalarProperty under the end mapping for `role`.
pub fn end_scalar(engine: &ResolutionEngine, role: &str) -> NodeId {
    let end = find_node(engine, ElementKind::EndProperty, "Name", role);
    engine.node(end).expect("end mapping exists").children()[0]
}

pub fn status(engine: &ResolutionEngine, owner: NodeId, role: &'static str) -> BindingStatus {
    engine
        .binding_status(BindingRef::new(owner, role))
        .unwrap_or_else(|| panic!("{owner} has no binding '{role}'"))
}

pub fn target(engine: &ResolutionEngine, owner: NodeId, role: &'static str) -> Option<NodeId> {
    engine
        .artifacts()
        .binding(BindingRef::new(owner, role))
        .and_then(|b| b.target())
}

/// Every binding in the set.
pub fn all_bindings(engine: &ResolutionEngine) -> Vec<BindingRef> {
    engine
        .artifacts()
        .document_order()
        .into_iter()
        .filter_map(|id| engine.node(id))
        .flat_map(|n| {
            n.bindings()
                .into_iter()
                .map(|b| BindingRef::new(n.id(), b.role()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Anti-dependencies recomputed from scratch by scanning every binding.
pub fn brute_force_referencers(engine: &ResolutionEngine) -> BTreeMap<NodeId, BTreeSet<BindingRef>> {
    let mut map: BTreeMap<NodeId, BTreeSet<BindingRef>> = BTreeMap::new();
    for binding in all_bindings(engine) {
        if let Some(item) = engine.artifacts().binding(binding) {
            for target in item.targets() {
                map.entry(target).or_default().insert(binding);
            }
        }
    }
    map
}

/// Assert the maintained anti-dependency index equals a full recomputation.
pub fn assert_anti_dependencies_exact(engine: &ResolutionEngine) {
    let expected = brute_force_referencers(engine);
    let index = engine.artifacts().anti_dependencies();
    let mut targets: BTreeSet<NodeId> = expected.keys().copied().collect();
    targets.extend(index.referenced_targets());
    for target in targets {
        let actual: BTreeSet<BindingRef> = index.referencers(target).into_iter().collect();
        assert_eq!(
            actual,
            expected.get(&target).cloned().unwrap_or_default(),
            "anti-dependencies of {target} diverge from a full scan"
        );
    }
}

/// Everything observable about the resolved model.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub symbols: Vec<(Symbol, NodeId)>,
    pub states: Vec<(NodeId, NodeState)>,
    pub bindings: Vec<(BindingRef, BindingStatus, Vec<Option<NodeId>>)>,
    pub referencers: BTreeMap<NodeId, BTreeSet<BindingRef>>,
}

pub fn snapshot(engine: &ResolutionEngine) -> Snapshot {
    let set = engine.artifacts();
    Snapshot {
        symbols: set.symbol_entries(),
        states: set
            .document_order()
            .into_iter()
            .filter_map(|id| set.state(id).map(|s| (id, s)))
            .collect(),
        bindings: all_bindings(engine)
            .into_iter()
            .filter_map(|b| {
                let item = set.binding(b)?;
                Some((
                    b,
                    item.status(),
                    item.slots().iter().map(|s| s.target).collect(),
                ))
            })
            .collect(),
        referencers: set
            .anti_dependencies()
            .referenced_targets()
            .into_iter()
            .map(|t| (t, set.referencers(t).into_iter().collect()))
            .collect(),
    }
}
