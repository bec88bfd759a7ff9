use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{DesignElement, FeatureSpan};

/// One level of hierarchical zoom. A single stack of tagged levels
/// replaces separate definition/feature/kind stacks: popping inspects the
/// tag, so the two zoom modes can never fall out of lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "zoom", rename_all = "snake_case")]
pub enum ZoomLevel {
    /// Part-level focus: the definition that was displayed before
    /// focusing into a structural child.
    Definition { definition: Uuid },
    /// Feature-level focus: the range that was zoomed into. The canvas
    /// definition is unchanged at these levels; only visibility narrows.
    Feature { span: FeatureSpan },
}

/// The feature range the canvas is currently narrowed to, if the top of
/// the zoom stack is a feature level.
pub fn active_span(zoom: &[ZoomLevel]) -> Option<FeatureSpan> {
    match zoom.last() {
        Some(ZoomLevel::Feature { span }) => Some(*span),
        _ => None,
    }
}

/// Features eligible at the given zoom span: all features at the top
/// level, or those properly contained in the span when narrowed.
/// Spanless features only qualify at the top level.
fn candidates<'a>(
    elements: &'a [DesignElement],
    filter: Option<FeatureSpan>,
) -> impl Iterator<Item = &'a DesignElement> {
    elements.iter().filter(move |e| {
        if !e.is_feature() {
            return false;
        }
        match (filter, e.span) {
            (None, _) => true,
            (Some(outer), Some(span)) => outer.properly_contains(&span),
            (Some(_), None) => false,
        }
    })
}

/// The ids of features visible at the given zoom span: the candidates not
/// properly nested inside another candidate. Equal spans never hide each
/// other, and spanless features are never hidden.
pub fn visible_features(elements: &[DesignElement], filter: Option<FeatureSpan>) -> Vec<Uuid> {
    let pool: Vec<&DesignElement> = candidates(elements, filter).collect();
    pool.iter()
        .filter(|e| {
            let Some(span) = e.span else { return true };
            !pool
                .iter()
                .any(|other| other.id != e.id && matches!(other.span, Some(o) if o.properly_contains(&span)))
        })
        .map(|e| e.id)
        .collect()
}

/// A feature is composite when a strictly smaller feature at the current
/// zoom level nests inside its span; composite features can be focused
/// into.
pub fn is_composite(
    elements: &[DesignElement],
    filter: Option<FeatureSpan>,
    element: &DesignElement,
) -> bool {
    let Some(span) = element.span else {
        return false;
    };
    candidates(elements, filter).any(|other| {
        other.id != element.id && matches!(other.span, Some(o) if span.properly_contains(&o))
    })
}
