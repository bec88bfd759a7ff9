//! Combinatorial-variant bookkeeping for structural deletions.

use splice_document::Document;
use tracing::debug;
use uuid::Uuid;

use crate::error::CanvasError;

/// Remove every variant binding targeting the given component instance;
/// a derivation left with no bindings is removed with it. Returns whether
/// anything was pruned.
///
/// A linear scan over derivations × bindings; both collections are
/// bounded by design size.
pub fn prune_bindings_for(doc: &mut Document, component: Uuid) -> Result<bool, CanvasError> {
    let mut doomed = Vec::new();
    for derivation in doc.derivations() {
        for binding in &derivation.bindings {
            if binding.variable == component {
                doomed.push((derivation.id, binding.id));
            }
        }
    }

    let changed = !doomed.is_empty();
    for (derivation, binding) in doomed {
        doc.remove_variant_binding(derivation, binding)?;
        let emptied = doc
            .derivations()
            .iter()
            .find(|d| d.id == derivation)
            .is_some_and(|d| d.bindings.is_empty());
        if emptied {
            debug!(derivation = %derivation, "removing emptied derivation");
            doc.remove_derivation(derivation)?;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use splice_core::PartRole;

    use super::*;

    #[test]
    fn test_last_binding_removes_derivation() {
        let mut doc = Document::new("https://example.org/lab");
        let device = doc.create_definition("device", PartRole::Unspecified).unwrap();
        let child = doc.create_definition("p1", PartRole::Promoter).unwrap();
        let alt = doc.create_definition("p2", PartRole::Promoter).unwrap();
        let instance = doc.create_component(device, child).unwrap();

        let derivation = doc.create_derivation(device).unwrap();
        doc.add_variant_binding(derivation, instance, vec![alt])
            .unwrap();

        assert!(prune_bindings_for(&mut doc, instance).unwrap());
        assert!(doc.derivations().is_empty());
    }

    #[test]
    fn test_other_bindings_survive() {
        let mut doc = Document::new("https://example.org/lab");
        let device = doc.create_definition("device", PartRole::Unspecified).unwrap();
        let child = doc.create_definition("p1", PartRole::Promoter).unwrap();
        let other = doc.create_definition("rbs1", PartRole::Rbs).unwrap();
        let alt = doc.create_definition("p2", PartRole::Promoter).unwrap();
        let doomed = doc.create_component(device, child).unwrap();
        let kept = doc.create_component(device, other).unwrap();

        let derivation = doc.create_derivation(device).unwrap();
        doc.add_variant_binding(derivation, doomed, vec![alt]).unwrap();
        doc.add_variant_binding(derivation, kept, vec![alt]).unwrap();

        assert!(prune_bindings_for(&mut doc, doomed).unwrap());
        assert_eq!(doc.derivations().len(), 1);
        assert_eq!(doc.derivations()[0].bindings.len(), 1);
        assert_eq!(doc.derivations()[0].bindings[0].variable, kept);
    }

    #[test]
    fn test_unbound_component_prunes_nothing() {
        let mut doc = Document::new("https://example.org/lab");
        let device = doc.create_definition("device", PartRole::Unspecified).unwrap();
        let child = doc.create_definition("p1", PartRole::Promoter).unwrap();
        let alt = doc.create_definition("p2", PartRole::Promoter).unwrap();
        let bound = doc.create_component(device, child).unwrap();
        let unbound = doc.create_component(device, child).unwrap();

        let derivation = doc.create_derivation(device).unwrap();
        doc.add_variant_binding(derivation, bound, vec![alt]).unwrap();

        assert!(!prune_bindings_for(&mut doc, unbound).unwrap());
        assert_eq!(doc.derivations().len(), 1);
    }
}
