//! The consistency passes that keep the canvas definition's derived
//! artifacts in agreement with the element order. They always run as
//! positions → constraints → sequence derivation: positions must exist
//! before length bookkeeping means anything, and constraints must reflect
//! the just-updated order. Each pass is idempotent, so a pass can be
//! re-run after a partial failure without compounding damage.

use splice_core::{dna, Location};
use splice_document::Document;
use tracing::debug;
use uuid::Uuid;

use crate::element::{DesignElement, ElementKind};
use crate::error::CanvasError;
use crate::gate::{ConflictChoice, ConflictPolicy, EditGate};

/// Run all three passes.
pub fn rebuild(
    doc: &mut Document,
    canvas: Uuid,
    elements: &mut [DesignElement],
    policy: ConflictPolicy,
    gate: &mut dyn EditGate,
) -> Result<(), CanvasError> {
    regenerate_positions(doc, canvas, elements)?;
    regenerate_constraints(doc, canvas, elements)?;
    derive_sequence(doc, canvas, elements, policy, gate)
}

/// Rewrite each structural element's position annotation from the current
/// order: a contiguous 1-based `Range` of the child sequence's length when
/// the child has one, a `Generic` location otherwise. Name, role and
/// orientation carry over from the discarded annotation. Feature
/// annotations are user data and are left untouched.
pub fn regenerate_positions(
    doc: &mut Document,
    canvas: Uuid,
    elements: &mut [DesignElement],
) -> Result<(), CanvasError> {
    let mut cursor: u64 = 1;
    for el in elements.iter_mut() {
        let ElementKind::Structural {
            component,
            definition,
        } = el.kind
        else {
            continue;
        };

        let old = doc.definition(canvas)?.annotation(el.annotation).cloned();
        let (base, name, role) = match &old {
            Some(a) => (a.display_id.clone(), a.name.clone(), a.role),
            None => (format!("{}_anno", el.name), None, Some(el.role)),
        };
        if old.is_some() {
            doc.remove_annotation(canvas, el.annotation)?;
        }

        let length = match doc.definition(definition)?.sequence {
            Some(seq) => doc.sequence(seq)?.len() as u64,
            None => 0,
        };
        // A fresh annotation defaults to inline; the recorded orientation
        // is restored explicitly.
        let orientation = el.orientation;
        let location = if length > 0 {
            let range = Location::Range {
                start: cursor,
                end: cursor + length - 1,
                orientation,
            };
            cursor += length;
            range
        } else {
            Location::Generic { orientation }
        };

        let fresh = doc.create_annotation(canvas, &base)?;
        let annotation = doc.annotation_mut(canvas, fresh)?;
        annotation.component = Some(component);
        annotation.name = name;
        annotation.role = role.or(Some(el.role));
        annotation.locations = vec![location];
        el.annotation = fresh;
    }
    debug!(canvas = %canvas, end = cursor, "positions regenerated");
    Ok(())
}

/// Replace the definition's precedence constraints with one `precedes`
/// per adjacent pair in element order. Pairs where either side has no
/// instantiated component (pure features) are skipped. A constraint needs
/// two distinct subjects, so fewer than two elements is a no-op.
pub fn regenerate_constraints(
    doc: &mut Document,
    canvas: Uuid,
    elements: &[DesignElement],
) -> Result<(), CanvasError> {
    if elements.len() < 2 {
        return Ok(());
    }
    doc.clear_constraints(canvas)?;
    for pair in elements.windows(2) {
        let (Some(subject), Some(object)) = (pair[0].component(), pair[1].component()) else {
            continue;
        };
        doc.create_precedes(canvas, subject, object)?;
    }
    Ok(())
}

/// Re-derive the canvas definition's sequence from its children.
///
/// The implied sequence is the children's sequences concatenated in
/// element order, reverse-complemented for flipped elements. Placeholder
/// bases are stripped before comparing against the stored sequence. A
/// non-shorter implied sequence always wins; a shorter one goes through
/// the conflict policy, and in the keep outcome the stored sequence is
/// left untouched. The old sequence entity is only dropped after the
/// replacement exists and nothing else references it.
pub fn derive_sequence(
    doc: &mut Document,
    canvas: Uuid,
    elements: &[DesignElement],
    policy: ConflictPolicy,
    gate: &mut dyn EditGate,
) -> Result<(), CanvasError> {
    let has_structural = elements.iter().any(|e| e.is_structural());
    if !has_structural && !doc.definition(canvas)?.annotations.is_empty() {
        // Nothing to derive from; the annotations are the content.
        return Ok(());
    }

    let mut implied = String::new();
    for el in elements {
        let Some(definition) = el.definition() else {
            continue;
        };
        let Some(seq_id) = doc.definition(definition)?.sequence else {
            continue;
        };
        let child = &doc.sequence(seq_id)?.elements;
        if el.orientation.is_reverse() {
            implied.push_str(&dna::reverse_complement(child));
        } else {
            implied.push_str(child);
        }
    }

    let stored = match doc.definition(canvas)?.sequence {
        Some(id) => Some((id, doc.sequence(id)?.elements.clone())),
        None => None,
    };

    let replace = match &stored {
        None => !implied.is_empty(),
        Some((_, old)) => {
            if dna::normalized(&implied) == dna::normalized(old) {
                false
            } else if implied.len() >= old.len() {
                true
            } else {
                let choice = match policy {
                    ConflictPolicy::Overwrite => ConflictChoice::Overwrite,
                    ConflictPolicy::Keep => ConflictChoice::Keep,
                    ConflictPolicy::Ask => gate.resolve_conflict(old.len(), implied.len()),
                };
                choice == ConflictChoice::Overwrite
            }
        }
    };

    if replace {
        debug!(
            canvas = %canvas,
            old_len = stored.as_ref().map(|(_, s)| s.len()).unwrap_or(0),
            new_len = implied.len(),
            "derived sequence replaces stored one"
        );
        let fresh = doc.create_sequence(&implied);
        doc.definition_mut(canvas)?.sequence = Some(fresh);
        if let Some((old_id, _)) = stored {
            let still_used = doc.definitions().iter().any(|d| d.sequence == Some(old_id));
            if !still_used {
                doc.remove_sequence(old_id)?;
            }
        }
    }

    let circular = elements.iter().any(|e| e.is_backbone());
    doc.definition_mut(canvas)?.circular = circular;
    Ok(())
}
