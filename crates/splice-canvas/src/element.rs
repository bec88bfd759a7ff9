use serde::{Deserialize, Serialize};
use splice_core::{Orientation, PartRole};
use uuid::Uuid;

/// Inclusive 1-based coordinate span of a feature on the canvas sequence,
/// the union (min start, max end) of its annotation's precise locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpan {
    pub start: u64,
    pub end: u64,
}

impl FeatureSpan {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Proper containment: `other` sits strictly inside `self`. Equal
    /// spans do not contain each other.
    pub fn properly_contains(&self, other: &FeatureSpan) -> bool {
        (self.start <= other.start && self.end > other.end)
            || (self.start < other.start && self.end >= other.end)
    }
}

/// What a canvas element is backed by in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    /// A structural child: a component instance of another definition.
    Structural { component: Uuid, definition: Uuid },
    /// A free-standing feature: an annotation with no bound instance.
    Feature,
}

/// One visible unit on the canvas.
///
/// The element id is stable across consistency passes; the annotation id
/// changes whenever positions are regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignElement {
    pub id: Uuid,
    pub annotation: Uuid,
    pub kind: ElementKind,
    pub role: PartRole,
    pub name: String,
    pub orientation: Orientation,
    /// Present only for features with at least one precise location.
    pub span: Option<FeatureSpan>,
}

impl DesignElement {
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, ElementKind::Structural { .. })
    }

    pub fn is_feature(&self) -> bool {
        matches!(self.kind, ElementKind::Feature)
    }

    pub fn is_backbone(&self) -> bool {
        self.role.is_backbone()
    }

    pub fn component(&self) -> Option<Uuid> {
        match self.kind {
            ElementKind::Structural { component, .. } => Some(component),
            ElementKind::Feature => None,
        }
    }

    pub fn definition(&self) -> Option<Uuid> {
        match self.kind {
            ElementKind::Structural { definition, .. } => Some(definition),
            ElementKind::Feature => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proper_containment() {
        let a = FeatureSpan::new(1, 100);
        let b = FeatureSpan::new(10, 50);
        assert!(a.properly_contains(&b));
        assert!(!b.properly_contains(&a));
    }

    #[test]
    fn test_equal_spans_do_not_contain() {
        let a = FeatureSpan::new(5, 20);
        let b = FeatureSpan::new(5, 20);
        assert!(!a.properly_contains(&b));
        assert!(!b.properly_contains(&a));
    }

    #[test]
    fn test_shared_boundary_still_proper() {
        let outer = FeatureSpan::new(1, 100);
        assert!(outer.properly_contains(&FeatureSpan::new(1, 99)));
        assert!(outer.properly_contains(&FeatureSpan::new(2, 100)));
        assert!(!outer.properly_contains(&FeatureSpan::new(1, 100)));
    }
}
