use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use splice_core::PartRole;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::{
    Annotation, CombinatorialDerivation, ComponentDefinition, ComponentInstance, Sequence,
    SequenceConstraint, VariantBinding,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid display id: {0}")]
    InvalidDisplayId(String),
    #[error("Unknown definition: {0}")]
    UnknownDefinition(Uuid),
    #[error("Unknown component instance: {0}")]
    UnknownComponent(Uuid),
    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(Uuid),
    #[error("Unknown sequence: {0}")]
    UnknownSequence(Uuid),
    #[error("Unknown derivation: {0}")]
    UnknownDerivation(Uuid),
    #[error("Unknown variant binding: {0}")]
    UnknownBinding(Uuid),
    #[error("Constraint endpoints must be distinct components of the same definition")]
    InvalidConstraint,
}

fn display_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid pattern"))
}

/// Turn an arbitrary label into a legal display id: identifier characters
/// only, never starting with a digit, never empty.
pub fn sanitize_display_id(base: &str) -> String {
    let mut id = display_id_pattern().replace_all(base.trim(), "_").to_string();
    if id.is_empty() {
        id.push_str("part");
    }
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    id
}

/// The design document: single owner of every identified entity. All
/// structural mutations go through it; it enforces display-id uniqueness
/// within each scope and referential validity of cross-entity links.
///
/// Collections are plain vectors scanned linearly; documents are bounded
/// by design size, not corpus size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The namespace the user may edit. Entities under any other
    /// namespace are registry-owned.
    namespace: String,
    definitions: Vec<ComponentDefinition>,
    sequences: Vec<Sequence>,
    derivations: Vec<CombinatorialDerivation>,
}

impl Document {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            definitions: Vec::new(),
            sequences: Vec::new(),
            derivations: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    // ---- persistence ----

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    // ---- lookups ----

    pub fn definition(&self, id: Uuid) -> Result<&ComponentDefinition, DocumentError> {
        self.definitions
            .iter()
            .find(|d| d.id == id)
            .ok_or(DocumentError::UnknownDefinition(id))
    }

    pub fn definition_mut(&mut self, id: Uuid) -> Result<&mut ComponentDefinition, DocumentError> {
        self.definitions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DocumentError::UnknownDefinition(id))
    }

    pub fn has_definition(&self, id: Uuid) -> bool {
        self.definitions.iter().any(|d| d.id == id)
    }

    pub fn definitions(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    pub fn sequence(&self, id: Uuid) -> Result<&Sequence, DocumentError> {
        self.sequences
            .iter()
            .find(|s| s.id == id)
            .ok_or(DocumentError::UnknownSequence(id))
    }

    /// Definitions not instantiated as a child of any other definition.
    pub fn root_definitions(&self) -> Vec<Uuid> {
        self.definitions
            .iter()
            .filter(|d| {
                !self
                    .definitions
                    .iter()
                    .any(|p| p.components.iter().any(|c| c.definition == d.id))
            })
            .map(|d| d.id)
            .collect()
    }

    pub fn is_editable(&self, definition: Uuid) -> Result<bool, DocumentError> {
        Ok(self.definition(definition)?.namespace == self.namespace)
    }

    // ---- definitions ----

    pub fn create_definition(
        &mut self,
        display_id: &str,
        role: PartRole,
    ) -> Result<Uuid, DocumentError> {
        let base = sanitize_display_id(display_id);
        let display_id = self.unique_definition_display_id(&base);
        let def = ComponentDefinition {
            id: Uuid::new_v4(),
            display_id,
            name: None,
            namespace: self.namespace.clone(),
            role,
            circular: false,
            sequence: None,
            components: Vec::new(),
            annotations: Vec::new(),
            constraints: Vec::new(),
        };
        let id = def.id;
        self.definitions.push(def);
        Ok(id)
    }

    /// Import a definition wholesale (loader / registry path). The caller
    /// supplies the full entity, typically under a foreign namespace.
    pub fn insert_definition(&mut self, def: ComponentDefinition) -> Uuid {
        let id = def.id;
        self.definitions.push(def);
        id
    }

    pub fn insert_sequence(&mut self, seq: Sequence) -> Uuid {
        let id = seq.id;
        self.sequences.push(seq);
        id
    }

    fn unique_definition_display_id(&self, base: &str) -> String {
        unique_among(base, |candidate| {
            self.definitions.iter().any(|d| d.display_id == candidate)
        })
    }

    // ---- component instances ----

    pub fn create_component(
        &mut self,
        parent: Uuid,
        child_definition: Uuid,
    ) -> Result<Uuid, DocumentError> {
        let child_display = self.definition(child_definition)?.display_id.clone();
        let parent = self.definition_mut(parent)?;
        let display_id = unique_among(&child_display, |candidate| {
            parent.components.iter().any(|c| c.display_id == candidate)
        });
        let instance = ComponentInstance {
            id: Uuid::new_v4(),
            display_id,
            definition: child_definition,
        };
        let id = instance.id;
        parent.components.push(instance);
        Ok(id)
    }

    pub fn remove_component(&mut self, parent: Uuid, component: Uuid) -> Result<(), DocumentError> {
        let parent = self.definition_mut(parent)?;
        let before = parent.components.len();
        parent.components.retain(|c| c.id != component);
        if parent.components.len() == before {
            return Err(DocumentError::UnknownComponent(component));
        }
        Ok(())
    }

    // ---- annotations ----

    pub fn create_annotation(&mut self, parent: Uuid, base: &str) -> Result<Uuid, DocumentError> {
        let base = sanitize_display_id(base);
        let parent = self.definition_mut(parent)?;
        let display_id = unique_among(&base, |candidate| {
            parent.annotations.iter().any(|a| a.display_id == candidate)
        });
        let annotation = Annotation {
            id: Uuid::new_v4(),
            display_id,
            name: None,
            role: None,
            component: None,
            locations: Vec::new(),
        };
        let id = annotation.id;
        parent.annotations.push(annotation);
        Ok(id)
    }

    pub fn remove_annotation(&mut self, parent: Uuid, annotation: Uuid) -> Result<(), DocumentError> {
        let parent = self.definition_mut(parent)?;
        let before = parent.annotations.len();
        parent.annotations.retain(|a| a.id != annotation);
        if parent.annotations.len() == before {
            return Err(DocumentError::UnknownAnnotation(annotation));
        }
        Ok(())
    }

    pub fn annotation_mut(
        &mut self,
        parent: Uuid,
        annotation: Uuid,
    ) -> Result<&mut Annotation, DocumentError> {
        self.definition_mut(parent)?
            .annotation_mut(annotation)
            .ok_or(DocumentError::UnknownAnnotation(annotation))
    }

    // ---- sequences ----

    pub fn create_sequence(&mut self, elements: &str) -> Uuid {
        let display_id = unique_among("seq", |candidate| {
            self.sequences.iter().any(|s| s.display_id == candidate)
        });
        let seq = Sequence {
            id: Uuid::new_v4(),
            display_id,
            namespace: self.namespace.clone(),
            elements: elements.to_uppercase(),
        };
        let id = seq.id;
        self.sequences.push(seq);
        id
    }

    pub fn remove_sequence(&mut self, id: Uuid) -> Result<(), DocumentError> {
        let before = self.sequences.len();
        self.sequences.retain(|s| s.id != id);
        if self.sequences.len() == before {
            return Err(DocumentError::UnknownSequence(id));
        }
        Ok(())
    }

    // ---- constraints ----

    /// Record that `subject` precedes `object` in the parent's order.
    pub fn create_precedes(
        &mut self,
        parent: Uuid,
        subject: Uuid,
        object: Uuid,
    ) -> Result<Uuid, DocumentError> {
        let parent = self.definition_mut(parent)?;
        if subject == object
            || parent.component(subject).is_none()
            || parent.component(object).is_none()
        {
            return Err(DocumentError::InvalidConstraint);
        }
        let constraint = SequenceConstraint {
            id: Uuid::new_v4(),
            subject,
            object,
        };
        let id = constraint.id;
        parent.constraints.push(constraint);
        Ok(id)
    }

    pub fn clear_constraints(&mut self, parent: Uuid) -> Result<(), DocumentError> {
        self.definition_mut(parent)?.constraints.clear();
        Ok(())
    }

    /// Drop constraints whose subject or object is the given component;
    /// used when a structural child is deleted.
    pub fn remove_constraints_referencing(
        &mut self,
        parent: Uuid,
        component: Uuid,
    ) -> Result<(), DocumentError> {
        self.definition_mut(parent)?
            .constraints
            .retain(|c| c.subject != component && c.object != component);
        Ok(())
    }

    // ---- copy-on-write fork ----

    /// Deep-copy a definition into the editable namespace under a fresh
    /// identity. Owned children (instances, annotations, constraints) get
    /// fresh ids with internal references remapped; references to other
    /// definitions and to the stored sequence are preserved.
    pub fn copy_with_new_identity(&mut self, definition: Uuid) -> Result<Uuid, DocumentError> {
        let mut copy = self.definition(definition)?.clone();
        copy.id = Uuid::new_v4();
        copy.namespace = self.namespace.clone();
        copy.display_id = self.unique_definition_display_id(&copy.display_id);

        let mut component_map = Vec::with_capacity(copy.components.len());
        for instance in &mut copy.components {
            let fresh = Uuid::new_v4();
            component_map.push((instance.id, fresh));
            instance.id = fresh;
        }
        let remap = |id: Uuid| {
            component_map
                .iter()
                .find(|(old, _)| *old == id)
                .map(|(_, new)| *new)
                .unwrap_or(id)
        };
        for annotation in &mut copy.annotations {
            annotation.id = Uuid::new_v4();
            annotation.component = annotation.component.map(remap);
        }
        for constraint in &mut copy.constraints {
            constraint.id = Uuid::new_v4();
            constraint.subject = remap(constraint.subject);
            constraint.object = remap(constraint.object);
        }

        let id = copy.id;
        self.definitions.push(copy);
        Ok(id)
    }

    // ---- combinatorial derivations ----

    pub fn derivations(&self) -> &[CombinatorialDerivation] {
        &self.derivations
    }

    pub fn create_derivation(&mut self, template: Uuid) -> Result<Uuid, DocumentError> {
        let template_display = self.definition(template)?.display_id.clone();
        let base = format!("{template_display}_derivation");
        let display_id = unique_among(&base, |candidate| {
            self.derivations.iter().any(|d| d.display_id == candidate)
        });
        let derivation = CombinatorialDerivation {
            id: Uuid::new_v4(),
            display_id,
            template,
            bindings: Vec::new(),
        };
        let id = derivation.id;
        self.derivations.push(derivation);
        Ok(id)
    }

    pub fn add_variant_binding(
        &mut self,
        derivation: Uuid,
        variable: Uuid,
        variants: Vec<Uuid>,
    ) -> Result<Uuid, DocumentError> {
        let index = self
            .derivations
            .iter()
            .position(|d| d.id == derivation)
            .ok_or(DocumentError::UnknownDerivation(derivation))?;
        let template = self.derivations[index].template;
        if self.definition(template)?.component(variable).is_none() {
            return Err(DocumentError::UnknownComponent(variable));
        }
        let derivation = &mut self.derivations[index];
        let binding = VariantBinding {
            id: Uuid::new_v4(),
            variable,
            variants,
        };
        let id = binding.id;
        derivation.bindings.push(binding);
        Ok(id)
    }

    pub fn remove_variant_binding(
        &mut self,
        derivation: Uuid,
        binding: Uuid,
    ) -> Result<(), DocumentError> {
        let derivation = self
            .derivations
            .iter_mut()
            .find(|d| d.id == derivation)
            .ok_or(DocumentError::UnknownDerivation(derivation))?;
        let before = derivation.bindings.len();
        derivation.bindings.retain(|b| b.id != binding);
        if derivation.bindings.len() == before {
            return Err(DocumentError::UnknownBinding(binding));
        }
        Ok(())
    }

    pub fn remove_derivation(&mut self, id: Uuid) -> Result<(), DocumentError> {
        let before = self.derivations.len();
        self.derivations.retain(|d| d.id != id);
        if self.derivations.len() == before {
            return Err(DocumentError::UnknownDerivation(id));
        }
        Ok(())
    }
}

/// Append a numeric suffix until the candidate no longer collides.
fn unique_among(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
