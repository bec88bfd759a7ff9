use pretty_assertions::assert_eq;
use splice_canvas::{
    AllowGate, CanvasError, ConflictPolicy, Design, DesignConfig, DesignEvent, OrderSource,
    ReadOnlyReason,
};
use splice_catalog::{Catalog, Part};
use splice_core::PartRole;
use splice_document::{ComponentDefinition, ComponentInstance, Document};
use uuid::Uuid;

const NAMESPACE: &str = "https://example.org/lab";

fn new_design() -> Design {
    Design::open(
        Document::new(NAMESPACE),
        Catalog::with_builtins(),
        DesignConfig::default(),
    )
    .unwrap()
}

fn builtin(role: PartRole) -> Part {
    Catalog::with_builtins()
        .part_for_role(role)
        .unwrap()
        .clone()
}

fn canvas_sequence(design: &Design) -> Option<String> {
    let def = design
        .document()
        .definition(design.canvas_definition())
        .unwrap();
    def.sequence
        .map(|id| design.document().sequence(id).unwrap().elements.clone())
}

fn add_with_sequence(design: &mut Design, role: PartRole, dna: &str) -> Uuid {
    let element = design.add_part(&builtin(role)).unwrap();
    design.set_child_sequence(element, dna).unwrap();
    element
}

#[test]
fn test_element_order_survives_reload() {
    let mut design = new_design();
    add_with_sequence(&mut design, PartRole::Promoter, "ttgaca");
    add_with_sequence(&mut design, PartRole::Rbs, "aggagg");
    add_with_sequence(&mut design, PartRole::Cds, "atgaaa");

    assert!(design.move_element(0, 2).unwrap());
    let order_before: Vec<String> = design
        .elements()
        .iter()
        .map(|e| {
            design
                .document()
                .definition(e.definition().unwrap())
                .unwrap()
                .display_id
                .clone()
        })
        .collect();

    let reopened = Design::open(
        design.document().clone(),
        Catalog::with_builtins(),
        DesignConfig::default(),
    )
    .unwrap();
    let order_after: Vec<String> = reopened
        .elements()
        .iter()
        .map(|e| {
            reopened
                .document()
                .definition(e.definition().unwrap())
                .unwrap()
                .display_id
                .clone()
        })
        .collect();

    assert_eq!(order_before, order_after);
    assert_eq!(reopened.order_source(), OrderSource::PreciseLocations);
}

#[test]
fn test_constraints_mirror_element_order() {
    let mut design = new_design();
    add_with_sequence(&mut design, PartRole::Promoter, "ttgaca");
    add_with_sequence(&mut design, PartRole::Rbs, "aggagg");
    add_with_sequence(&mut design, PartRole::Cds, "atgaaa");

    let components: Vec<Uuid> = design
        .elements()
        .iter()
        .map(|e| e.component().unwrap())
        .collect();
    let def = design
        .document()
        .definition(design.canvas_definition())
        .unwrap();

    assert_eq!(def.constraints.len(), components.len() - 1);
    for (i, constraint) in def.constraints.iter().enumerate() {
        assert_eq!(constraint.subject, components[i]);
        assert_eq!(constraint.object, components[i + 1]);
    }
}

#[test]
fn test_shorter_derived_sequence_kept_under_keep_policy() {
    let mut design = Design::open(
        Document::new(NAMESPACE),
        Catalog::with_builtins(),
        DesignConfig {
            on_conflict: ConflictPolicy::Keep,
        },
    )
    .unwrap();
    let element = add_with_sequence(&mut design, PartRole::Cds, "ATCGATCG");
    assert_eq!(canvas_sequence(&design).as_deref(), Some("ATCGATCG"));

    design.set_child_sequence(element, "ATCG").unwrap();
    assert_eq!(canvas_sequence(&design).as_deref(), Some("ATCGATCG"));
}

#[test]
fn test_shorter_derived_sequence_replaces_under_overwrite_policy() {
    let mut design = Design::open(
        Document::new(NAMESPACE),
        Catalog::with_builtins(),
        DesignConfig {
            on_conflict: ConflictPolicy::Overwrite,
        },
    )
    .unwrap();
    let element = add_with_sequence(&mut design, PartRole::Cds, "ATCGATCG");

    design.set_child_sequence(element, "ATCG").unwrap();
    assert_eq!(canvas_sequence(&design).as_deref(), Some("ATCG"));
}

#[test]
fn test_second_backbone_rejected_without_side_effects() {
    let mut design = new_design();
    add_with_sequence(&mut design, PartRole::Cds, "atg");
    add_with_sequence(&mut design, PartRole::CircularBackbone, "aaaa");

    // backbone pins to the front even though it was added last
    assert!(design.elements()[0].is_backbone());
    assert!(design.is_circular());
    let sequence = canvas_sequence(&design);
    let count = design.elements().len();

    let err = design
        .add_part(&builtin(PartRole::CircularBackbone))
        .unwrap_err();
    assert!(matches!(err, CanvasError::DuplicateBackbone { .. }));
    assert_eq!(design.elements().len(), count);
    assert_eq!(canvas_sequence(&design), sequence);
}

#[test]
fn test_feature_zoom_reveals_nested_layers() {
    let mut design = new_design();
    let a = design.create_feature("big", PartRole::Gene, 1, 100).unwrap();
    let b = design.create_feature("mid", PartRole::Cds, 10, 50).unwrap();
    let c = design.create_feature("small", PartRole::Rbs, 20, 30).unwrap();

    assert_eq!(design.visible_features(), &[a]);

    design.select(Some(a)).unwrap();
    assert!(design.can_focus_in());
    design.focus_in().unwrap();
    assert_eq!(design.visible_features(), &[b]);

    design.select(Some(b)).unwrap();
    design.focus_in().unwrap();
    assert_eq!(design.visible_features(), &[c]);

    // the innermost feature has nothing inside it
    design.select(Some(c)).unwrap();
    assert!(!design.can_focus_in());
    assert!(matches!(design.focus_in(), Err(CanvasError::CannotFocus)));

    design.focus_out().unwrap();
    assert_eq!(design.visible_features(), &[b]);
    design.focus_out().unwrap();
    assert_eq!(design.visible_features(), &[a]);
    assert!(!design.can_focus_out());
}

#[test]
fn test_structural_focus_round_trip() {
    let mut design = new_design();
    let element = add_with_sequence(&mut design, PartRole::Cds, "atgaaa");
    let root = design.canvas_definition();
    let count = design.elements().len();

    design.select(Some(element)).unwrap();
    design.focus_in().unwrap();
    assert_ne!(design.canvas_definition(), root);
    assert_eq!(design.root_definition(), root);
    assert_eq!(design.parent_definition(), Some(root));
    assert!(design.can_focus_out());

    design.focus_out().unwrap();
    assert_eq!(design.canvas_definition(), root);
    assert_eq!(design.elements().len(), count);
    assert!(!design.can_focus_out());
}

#[test]
fn test_removing_bound_element_cascades_to_derivation() {
    let mut doc = Document::new(NAMESPACE);
    let device = doc
        .create_definition("device", PartRole::Unspecified)
        .unwrap();
    let p1 = doc.create_definition("p1", PartRole::Promoter).unwrap();
    let p2 = doc.create_definition("p2", PartRole::Promoter).unwrap();
    let bound = doc.create_component(device, p1).unwrap();
    let unbound = doc.create_component(device, p2).unwrap();
    let derivation = doc.create_derivation(device).unwrap();
    doc.add_variant_binding(derivation, bound, vec![p2]).unwrap();

    let mut design = Design::open_with_root(
        doc,
        Catalog::with_builtins(),
        DesignConfig::default(),
        device,
    )
    .unwrap();

    // removing the unbound element leaves the derivation alone
    let unbound_el = design
        .elements()
        .iter()
        .find(|e| e.component() == Some(unbound))
        .unwrap()
        .id;
    design.remove(unbound_el).unwrap();
    assert_eq!(design.document().derivations().len(), 1);

    // removing the bound element empties and removes the derivation
    let bound_el = design
        .elements()
        .iter()
        .find(|e| e.component() == Some(bound))
        .unwrap()
        .id;
    design.remove(bound_el).unwrap();
    assert!(design.document().derivations().is_empty());
}

#[test]
fn test_registry_owned_design_forks_on_edit() {
    let mut doc = Document::new(NAMESPACE);
    let registry = doc.insert_definition(ComponentDefinition {
        id: Uuid::new_v4(),
        display_id: "igem_device".to_string(),
        name: None,
        namespace: "https://synbiohub.org/public".to_string(),
        role: PartRole::Unspecified,
        circular: false,
        sequence: None,
        components: Vec::new(),
        annotations: Vec::new(),
        constraints: Vec::new(),
    });

    let mut design = Design::open(doc, Catalog::with_builtins(), DesignConfig::default()).unwrap();
    assert!(matches!(
        design.read_only_reasons(),
        [ReadOnlyReason::RegistryOwned { .. }]
    ));

    // the default gate declines the fork
    let err = design.add_part(&builtin(PartRole::Promoter)).unwrap_err();
    assert!(matches!(err, CanvasError::NotEditable { .. }));
    assert_eq!(design.canvas_definition(), registry);

    design.set_gate(Box::new(AllowGate));
    design.add_part(&builtin(PartRole::Promoter)).unwrap();

    let forked = design.canvas_definition();
    assert_ne!(forked, registry);
    assert_eq!(
        design.document().definition(forked).unwrap().namespace,
        NAMESPACE
    );
    assert!(design.read_only_reasons().is_empty());
    // the registry original is untouched
    assert!(design
        .document()
        .definition(registry)
        .unwrap()
        .components
        .is_empty());
}

#[test]
fn test_scar_insertion_fills_uncovered_sequence() {
    let mut doc = Document::new(NAMESPACE);
    let device = doc
        .create_definition("device", PartRole::Unspecified)
        .unwrap();
    let gfp = doc.create_definition("gfp", PartRole::Cds).unwrap();
    let gfp_seq = doc.create_sequence("ATGAAA");
    doc.definition_mut(gfp).unwrap().sequence = Some(gfp_seq);
    let instance = doc.create_component(device, gfp).unwrap();

    // stored sequence is longer than the annotated child: GG before, TT after
    let stored = doc.create_sequence("GGATGAAATT");
    doc.definition_mut(device).unwrap().sequence = Some(stored);
    let annotation = doc.create_annotation(device, "gfp_anno").unwrap();
    let ann = doc.annotation_mut(device, annotation).unwrap();
    ann.component = Some(instance);
    ann.locations = vec![splice_core::Location::range(3, 8)];

    let mut design = Design::open_with_root(
        doc,
        Catalog::with_builtins(),
        DesignConfig::default(),
        device,
    )
    .unwrap();
    assert!(design
        .read_only_reasons()
        .iter()
        .any(|r| matches!(r, ReadOnlyReason::UncoveredSequence { .. })));

    let inserted = design.insert_scars().unwrap();
    assert_eq!(inserted, 2);
    assert!(design.read_only_reasons().is_empty());
    assert_eq!(canvas_sequence(&design).as_deref(), Some("GGATGAAATT"));

    let roles: Vec<PartRole> = design.elements().iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![PartRole::Scar, PartRole::Cds, PartRole::Scar]);
}

#[test]
fn test_scar_insertion_rejects_range_beyond_stored_sequence() {
    let mut doc = Document::new(NAMESPACE);
    let device = doc
        .create_definition("device", PartRole::Unspecified)
        .unwrap();
    let gfp = doc.create_definition("gfp", PartRole::Cds).unwrap();
    let gfp_seq = doc.create_sequence("ATGAAA");
    doc.definition_mut(gfp).unwrap().sequence = Some(gfp_seq);
    let instance = doc.create_component(device, gfp).unwrap();

    // the stored sequence is 10 bp, but the child claims [50, 60]
    let stored = doc.create_sequence("GGATGAAATT");
    doc.definition_mut(device).unwrap().sequence = Some(stored);
    let annotation = doc.create_annotation(device, "gfp_anno").unwrap();
    let ann = doc.annotation_mut(device, annotation).unwrap();
    ann.component = Some(instance);
    ann.locations = vec![splice_core::Location::range(50, 60)];

    let mut design = Design::open_with_root(
        doc,
        Catalog::with_builtins(),
        DesignConfig::default(),
        device,
    )
    .unwrap();
    let definitions = design.document().definitions().len();

    let err = design.insert_scars().unwrap_err();
    assert!(matches!(err, CanvasError::RangeBeyondSequence { .. }));
    // the failed operation left everything untouched
    assert_eq!(canvas_sequence(&design).as_deref(), Some("GGATGAAATT"));
    assert_eq!(design.elements().len(), 1);
    assert_eq!(design.document().definitions().len(), definitions);
}

#[test]
fn test_add_feature_rejects_component_bound_annotation() {
    let mut design = new_design();
    let element = add_with_sequence(&mut design, PartRole::Cds, "atg");
    let annotation = design.element(element).unwrap().annotation;

    let err = design.add_feature(annotation).unwrap_err();
    assert!(matches!(err, CanvasError::NotAFeature(_)));
    assert_eq!(design.elements().len(), 1);
}

#[test]
fn test_set_child_sequence_rejects_non_dna() {
    let mut design = new_design();
    let element = add_with_sequence(&mut design, PartRole::Cds, "atg");

    let err = design.set_child_sequence(element, "not dna!").unwrap_err();
    assert!(matches!(err, CanvasError::InvalidSequence));
    assert_eq!(canvas_sequence(&design).as_deref(), Some("ATG"));

    // placeholder bases are accepted
    design.set_child_sequence(element, "atgNNN").unwrap();
}

#[test]
fn test_registry_definition_not_mutated_on_load() {
    let mut doc = Document::new(NAMESPACE);
    let child = doc.create_definition("gfp", PartRole::Cds).unwrap();
    let registry = doc.insert_definition(ComponentDefinition {
        id: Uuid::new_v4(),
        display_id: "igem_device".to_string(),
        name: None,
        namespace: "https://synbiohub.org/public".to_string(),
        role: PartRole::Unspecified,
        circular: false,
        sequence: None,
        components: vec![ComponentInstance {
            id: Uuid::new_v4(),
            display_id: "gfp".to_string(),
            definition: child,
        }],
        annotations: Vec::new(),
        constraints: Vec::new(),
    });

    let mut design = Design::open(doc, Catalog::with_builtins(), DesignConfig::default()).unwrap();
    // loading never writes into the foreign-namespace definition
    assert!(design
        .document()
        .definition(registry)
        .unwrap()
        .annotations
        .is_empty());
    assert_eq!(design.elements().len(), 1);

    design.set_gate(Box::new(AllowGate));
    design.add_part(&builtin(PartRole::Promoter)).unwrap();

    let canvas = design.canvas_definition();
    assert_ne!(canvas, registry);
    // after the fork, every element carries a real annotation
    for el in design.elements() {
        assert!(design
            .document()
            .definition(canvas)
            .unwrap()
            .annotation(el.annotation)
            .is_some());
    }
}

#[test]
fn test_open_emits_design_loaded() {
    let mut design = new_design();
    let events = design.take_events();
    assert!(matches!(events[0], DesignEvent::DesignLoaded { .. }));

    add_with_sequence(&mut design, PartRole::Promoter, "ttgaca");
    let events = design.take_events();
    assert!(events.contains(&DesignEvent::DesignChanged));
    assert!(events
        .iter()
        .any(|e| matches!(e, DesignEvent::SelectionChanged { selected: Some(_) })));
}
