use serde::{Deserialize, Serialize};
use splice_core::{Location, PartRole};
use uuid::Uuid;

/// A part definition: the reusable description of a promoter, CDS,
/// backbone, composite device, etc. Owns its structural children
/// (component instances), its annotations, and its ordering constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub id: Uuid,
    pub display_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// URI prefix identifying who owns this definition. Definitions outside
    /// the document's own namespace are registry-owned and read-only.
    pub namespace: String,
    pub role: PartRole,
    #[serde(default)]
    pub circular: bool,
    #[serde(default)]
    pub sequence: Option<Uuid>,
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub constraints: Vec<SequenceConstraint>,
}

impl ComponentDefinition {
    pub fn component(&self, id: Uuid) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn annotation(&self, id: Uuid) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn annotation_mut(&mut self, id: Uuid) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// The annotation bound to a component instance, if any. At most one
    /// exists per instance.
    pub fn annotation_for_component(&self, component: Uuid) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.component == Some(component))
    }
}

/// A structural child: an instantiation of another definition inside a
/// parent definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: Uuid,
    pub display_id: String,
    pub definition: Uuid,
}

/// A placement record on the parent's sequence. Annotations referencing a
/// component instance describe where that child sits; annotations without
/// one are free-standing features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub display_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<PartRole>,
    #[serde(default)]
    pub component: Option<Uuid>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Annotation {
    pub fn has_precise_location(&self) -> bool {
        self.locations.iter().any(|l| l.is_precise())
    }

    /// Smallest start coordinate among precise locations.
    pub fn min_start(&self) -> Option<u64> {
        self.locations.iter().filter_map(|l| l.start()).min()
    }

    /// Largest end coordinate among precise locations.
    pub fn max_end(&self) -> Option<u64> {
        self.locations.iter().filter_map(|l| l.end()).max()
    }
}

/// `subject` precedes `object` in the parent's element order. Both sides
/// are component-instance ids owned by the same definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SequenceConstraint {
    pub id: Uuid,
    pub subject: Uuid,
    pub object: Uuid,
}

/// A stored nucleotide sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequence {
    pub id: Uuid,
    pub display_id: String,
    pub namespace: String,
    pub elements: String,
}

impl Sequence {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A combinatorial design: a template definition plus, per variable
/// position, the set of alternative definitions allowed there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinatorialDerivation {
    pub id: Uuid,
    pub display_id: String,
    pub template: Uuid,
    #[serde(default)]
    pub bindings: Vec<VariantBinding>,
}

/// Binds one variable position (a component instance of the template) to
/// its allowed variant definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantBinding {
    pub id: Uuid,
    pub variable: Uuid,
    #[serde(default)]
    pub variants: Vec<Uuid>,
}
