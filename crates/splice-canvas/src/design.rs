use serde::{Deserialize, Serialize};
use splice_catalog::{Catalog, Part};
use splice_core::{dna, Location, Orientation, PartRole};
use splice_document::{Document, DocumentError};
use tracing::debug;
use uuid::Uuid;

use crate::element::{DesignElement, ElementKind, FeatureSpan};
use crate::engine;
use crate::error::CanvasError;
use crate::events::DesignEvent;
use crate::gate::{ConflictPolicy, DenyGate, EditGate, ReadOnlyReason};
use crate::navigator::{self, ZoomLevel};
use crate::variants;

/// How the current element order was reconstructed at load time.
///
/// Precise locations win when every child has one, because coordinates are
/// unambiguous; constraint graphs in imported documents can be ambiguous
/// or cyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSource {
    PreciseLocations,
    DeclaredConstraints,
}

#[derive(Debug, Clone)]
pub struct DesignConfig {
    /// What to do when the derived sequence comes out shorter than the
    /// stored one.
    pub on_conflict: ConflictPolicy,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            on_conflict: ConflictPolicy::Ask,
        }
    }
}

/// The canvas state machine.
///
/// Owns the design document and keeps the ordered element list, the
/// displayed definition's derived artifacts, the zoom stacks, and the
/// selection coherent across mutations. UI layers render `elements()`,
/// drain `take_events()`, and call the mutating operations below.
pub struct Design {
    document: Document,
    catalog: Catalog,
    config: DesignConfig,
    gate: Box<dyn EditGate>,
    canvas: Uuid,
    elements: Vec<DesignElement>,
    selection: Option<Uuid>,
    zoom: Vec<ZoomLevel>,
    order_source: OrderSource,
    read_only: Vec<ReadOnlyReason>,
    visible: Vec<Uuid>,
    bulk: bool,
    events: Vec<DesignEvent>,
}

impl Design {
    /// Open a document on its root definition. With no root a default one
    /// is created; with several the caller must pick one and use
    /// [`Design::open_with_root`].
    pub fn open(
        mut document: Document,
        catalog: Catalog,
        config: DesignConfig,
    ) -> Result<Self, CanvasError> {
        let roots = document.root_definitions();
        let root = match roots.len() {
            0 => document.create_definition("design", PartRole::Unspecified)?,
            1 => roots[0],
            _ => return Err(CanvasError::AmbiguousRoot { candidates: roots }),
        };
        Self::open_with_root(document, catalog, config, root)
    }

    pub fn open_with_root(
        document: Document,
        catalog: Catalog,
        config: DesignConfig,
        root: Uuid,
    ) -> Result<Self, CanvasError> {
        document.definition(root)?;
        let mut design = Self {
            document,
            catalog,
            config,
            gate: Box::new(DenyGate),
            canvas: root,
            elements: Vec::new(),
            selection: None,
            zoom: Vec::new(),
            order_source: OrderSource::PreciseLocations,
            read_only: Vec::new(),
            visible: Vec::new(),
            bulk: false,
            events: Vec::new(),
        };
        design.reload()?;
        design.events.push(DesignEvent::DesignLoaded { canvas: root });
        Ok(design)
    }

    /// Replace the edit gate (fork confirmation, read-only override,
    /// conflict resolution). The default gate denies everything.
    pub fn set_gate(&mut self, gate: Box<dyn EditGate>) {
        self.gate = gate;
    }

    // ---- queries ----

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    pub fn element(&self, id: Uuid) -> Option<&DesignElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn selection(&self) -> Option<Uuid> {
        self.selection
    }

    pub fn canvas_definition(&self) -> Uuid {
        self.canvas
    }

    /// The definition at the bottom of the zoom hierarchy.
    pub fn root_definition(&self) -> Uuid {
        self.zoom
            .iter()
            .find_map(|l| match l {
                ZoomLevel::Definition { definition } => Some(*definition),
                ZoomLevel::Feature { .. } => None,
            })
            .unwrap_or(self.canvas)
    }

    /// The definition one part-level up, if any.
    pub fn parent_definition(&self) -> Option<Uuid> {
        self.zoom.iter().rev().find_map(|l| match l {
            ZoomLevel::Definition { definition } => Some(*definition),
            ZoomLevel::Feature { .. } => None,
        })
    }

    pub fn is_circular(&self) -> bool {
        self.document
            .definition(self.canvas)
            .map(|d| d.circular)
            .unwrap_or(false)
    }

    pub fn order_source(&self) -> OrderSource {
        self.order_source
    }

    /// Read-only conditions detected when the canvas was loaded.
    pub fn read_only_reasons(&self) -> &[ReadOnlyReason] {
        &self.read_only
    }

    /// Ids of the features visible at the current zoom level.
    pub fn visible_features(&self) -> &[Uuid] {
        &self.visible
    }

    pub fn can_focus_out(&self) -> bool {
        !self.zoom.is_empty()
    }

    pub fn can_focus_in(&self) -> bool {
        let Some(el) = self.selection.and_then(|id| self.element(id)) else {
            return false;
        };
        el.is_structural()
            || navigator::is_composite(&self.elements, navigator::active_span(&self.zoom), el)
    }

    /// Drain pending change notifications.
    pub fn take_events(&mut self) -> Vec<DesignEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- selection ----

    pub fn select(&mut self, element: Option<Uuid>) -> Result<(), CanvasError> {
        if let Some(id) = element {
            if self.element(id).is_none() {
                return Err(CanvasError::UnknownElement(id));
            }
        }
        self.set_selection(element);
        Ok(())
    }

    fn set_selection(&mut self, element: Option<Uuid>) {
        if self.selection != element {
            self.selection = element;
            self.events.push(DesignEvent::SelectionChanged { selected: element });
        }
    }

    // ---- structural mutations ----

    /// Add an instance of a catalog part as a new, empty child definition.
    pub fn add_part(&mut self, part: &Part) -> Result<Uuid, CanvasError> {
        if part.role.is_backbone() && self.elements.iter().any(|e| e.is_backbone()) {
            return Err(CanvasError::DuplicateBackbone {
                display_id: part.display_id_base.clone(),
            });
        }
        self.ensure_editable()?;
        let definition = self
            .document
            .create_definition(&part.display_id_base, part.role)?;
        self.document.definition_mut(definition)?.name = Some(part.name.clone());
        self.add_structural(definition, None)
    }

    /// Add a structural child for an existing definition, reusing the
    /// given component instance when one is supplied. Returns the new
    /// element's id.
    pub fn add_structural(
        &mut self,
        child_definition: Uuid,
        component: Option<Uuid>,
    ) -> Result<Uuid, CanvasError> {
        let child = self.document.definition(child_definition)?;
        let role = self.catalog.classify(&[child.role]);
        if role.is_backbone() && self.elements.iter().any(|e| e.is_backbone()) {
            return Err(CanvasError::DuplicateBackbone {
                display_id: child.display_id.clone(),
            });
        }
        self.ensure_editable()?;
        let id = self.push_structural(child_definition, component)?;
        self.after_mutation()?;
        self.set_selection(Some(id));
        Ok(id)
    }

    /// The ungated insertion shared by interactive adds, bulk loads, and
    /// scar insertion. Creates the instance and annotation as needed and
    /// places the element (backbone pinned to slot 0).
    fn push_structural(
        &mut self,
        child_definition: Uuid,
        component: Option<Uuid>,
    ) -> Result<Uuid, CanvasError> {
        let child = self.document.definition(child_definition)?.clone();
        let role = self.catalog.classify(&[child.role]);

        let component = match component {
            Some(c) => {
                self.document
                    .definition(self.canvas)?
                    .component(c)
                    .ok_or(DocumentError::UnknownComponent(c))?;
                c
            }
            None => self.document.create_component(self.canvas, child_definition)?,
        };

        let existing = self
            .document
            .definition(self.canvas)?
            .annotation_for_component(component)
            .map(|a| (a.id, a.locations.first().map(|l| l.orientation())));
        let (annotation, orientation) = match existing {
            Some((id, orientation)) => (id, orientation.unwrap_or_default()),
            None => {
                let display = self
                    .document
                    .definition(self.canvas)?
                    .component(component)
                    .map(|c| c.display_id.clone())
                    .unwrap_or_else(|| child.display_id.clone());
                let id = self
                    .document
                    .create_annotation(self.canvas, &format!("{display}_anno"))?;
                let ann = self.document.annotation_mut(self.canvas, id)?;
                ann.component = Some(component);
                ann.role = Some(role);
                (id, Orientation::Inline)
            }
        };

        let element = DesignElement {
            id: Uuid::new_v4(),
            annotation,
            kind: ElementKind::Structural {
                component,
                definition: child_definition,
            },
            role,
            name: child.name.clone().unwrap_or_else(|| child.display_id.clone()),
            orientation,
            span: None,
        };
        let id = element.id;
        debug!(element = %id, role = ?role, "adding structural element");
        if element.is_backbone() {
            self.elements.insert(0, element);
        } else {
            self.elements.push(element);
        }
        Ok(id)
    }

    /// Wrap a pre-existing component-less annotation of the canvas
    /// definition as a feature element.
    pub fn add_feature(&mut self, annotation: Uuid) -> Result<Uuid, CanvasError> {
        let def = self.document.definition(self.canvas)?;
        let ann = def
            .annotation(annotation)
            .ok_or(DocumentError::UnknownAnnotation(annotation))?;
        if ann.component.is_some() {
            return Err(CanvasError::NotAFeature(annotation));
        }
        let span = match (ann.min_start(), ann.max_end()) {
            (Some(start), Some(end)) => Some(FeatureSpan::new(start, end)),
            _ => None,
        };
        let roles: Vec<PartRole> = ann.role.into_iter().collect();
        let element = DesignElement {
            id: Uuid::new_v4(),
            annotation,
            kind: ElementKind::Feature,
            role: self.catalog.classify(&roles),
            name: ann
                .name
                .clone()
                .unwrap_or_else(|| ann.display_id.clone()),
            orientation: ann
                .locations
                .first()
                .map(|l| l.orientation())
                .unwrap_or_default(),
            span,
        };
        let id = element.id;
        self.elements.push(element);
        self.after_mutation()?;
        self.refresh_visibility();
        Ok(id)
    }

    /// Create a ranged annotation and wrap it as a feature in one step.
    pub fn create_feature(
        &mut self,
        name: &str,
        role: PartRole,
        start: u64,
        end: u64,
    ) -> Result<Uuid, CanvasError> {
        self.ensure_editable()?;
        let annotation = self.document.create_annotation(self.canvas, name)?;
        let ann = self.document.annotation_mut(self.canvas, annotation)?;
        ann.name = Some(name.to_string());
        ann.role = Some(role);
        ann.locations = vec![Location::range(start, end)];
        self.add_feature(annotation)
    }

    /// Remove an element: its annotation always, and for structural
    /// elements also the component, stale constraints, and any variant
    /// bindings targeting it.
    pub fn remove(&mut self, element: Uuid) -> Result<(), CanvasError> {
        let index = self
            .elements
            .iter()
            .position(|e| e.id == element)
            .ok_or(CanvasError::UnknownElement(element))?;
        self.ensure_editable()?;

        let el = self.elements[index].clone();
        debug!(element = %element, name = %el.name, "removing element");
        if self
            .document
            .definition(self.canvas)?
            .annotation(el.annotation)
            .is_some()
        {
            self.document.remove_annotation(self.canvas, el.annotation)?;
        }
        if let ElementKind::Structural { component, .. } = el.kind {
            self.document
                .remove_constraints_referencing(self.canvas, component)?;
            self.document.remove_component(self.canvas, component)?;
            variants::prune_bindings_for(&mut self.document, component)?;
        }
        self.elements.remove(index);
        if self.selection == Some(element) {
            self.set_selection(None);
        }
        self.after_mutation()?;
        self.refresh_visibility();
        Ok(())
    }

    /// Relocate an element by index. Returns whether anything moved:
    /// moving onto itself, moving the pinned backbone, or displacing it
    /// from slot 0 are all no-ops.
    pub fn move_element(&mut self, from: usize, to: usize) -> Result<bool, CanvasError> {
        if from >= self.elements.len() {
            return Err(CanvasError::InvalidIndex(from));
        }
        if to >= self.elements.len() {
            return Err(CanvasError::InvalidIndex(to));
        }
        if from == to {
            return Ok(false);
        }
        let backbone_present = self.elements.iter().any(|e| e.is_backbone());
        if backbone_present && (self.elements[from].is_backbone() || to == 0) {
            return Ok(false);
        }
        self.ensure_editable()?;
        let el = self.elements.remove(from);
        self.elements.insert(to, el);
        self.after_mutation()?;
        Ok(true)
    }

    /// Toggle the orientation of every location on the element's
    /// annotation. Order is unchanged.
    pub fn flip(&mut self, element: Uuid) -> Result<(), CanvasError> {
        let index = self
            .elements
            .iter()
            .position(|e| e.id == element)
            .ok_or(CanvasError::UnknownElement(element))?;
        self.ensure_editable()?;
        let annotation = self.elements[index].annotation;
        // The annotation can be dangling on a freshly forked registry
        // design; the element's orientation alone drives regeneration.
        if self
            .document
            .definition(self.canvas)?
            .annotation(annotation)
            .is_some()
        {
            let ann = self.document.annotation_mut(self.canvas, annotation)?;
            for location in &mut ann.locations {
                location.flip();
            }
        }
        let el = &mut self.elements[index];
        el.orientation = el.orientation.flipped();
        self.after_mutation()
    }

    /// Assign a sequence to a structural child's definition, forking the
    /// child first when it is registry-owned. Accepts A/C/G/T plus `N`
    /// placeholders, any case.
    pub fn set_child_sequence(&mut self, element: Uuid, bases: &str) -> Result<(), CanvasError> {
        if !dna::is_dna(&dna::normalized(bases)) {
            return Err(CanvasError::InvalidSequence);
        }
        let index = self
            .elements
            .iter()
            .position(|e| e.id == element)
            .ok_or(CanvasError::UnknownElement(element))?;
        let ElementKind::Structural {
            component,
            definition,
        } = self.elements[index].kind
        else {
            return Err(CanvasError::UnknownElement(element));
        };
        self.ensure_editable()?;

        let definition = if self.document.is_editable(definition)? {
            definition
        } else {
            let display_id = self.document.definition(definition)?.display_id.clone();
            if !self.gate.confirm_fork(&display_id) {
                return Err(CanvasError::NotEditable { display_id });
            }
            let fork = self.document.copy_with_new_identity(definition)?;
            let canvas = self.document.definition_mut(self.canvas)?;
            if let Some(instance) = canvas.components.iter_mut().find(|c| c.id == component) {
                instance.definition = fork;
            }
            self.elements[index].kind = ElementKind::Structural {
                component,
                definition: fork,
            };
            fork
        };

        let sequence = self.document.create_sequence(bases);
        self.document.definition_mut(definition)?.sequence = Some(sequence);
        self.after_mutation()
    }

    /// Fill every stretch of the stored sequence not covered by a child's
    /// annotated range with a scar part carrying that subsequence. Clears
    /// the uncovered-sequence read-only condition. Returns the number of
    /// scars inserted.
    pub fn insert_scars(&mut self) -> Result<usize, CanvasError> {
        let def = self.document.definition(self.canvas)?.clone();
        let Some(seq_id) = def.sequence else {
            return Err(CanvasError::NoStoredSequence {
                display_id: def.display_id,
            });
        };
        let stored = self.document.sequence(seq_id)?.elements.clone();

        let mut covered: Vec<(u64, u64)> = Vec::new();
        for el in self.elements.iter().filter(|e| e.is_structural()) {
            let ann = def
                .annotation(el.annotation)
                .ok_or(DocumentError::UnknownAnnotation(el.annotation))?;
            match (ann.min_start(), ann.max_end()) {
                (Some(start), Some(end)) => {
                    // Coordinates are 1-based; a range past the stored
                    // sequence cannot be reconciled by filling gaps.
                    if start == 0 || end > stored.len() as u64 {
                        return Err(CanvasError::RangeBeyondSequence {
                            start,
                            end,
                            stored_len: stored.len(),
                        });
                    }
                    covered.push((start, end));
                }
                _ => {
                    return Err(CanvasError::ReadOnly {
                        reasons: vec![ReadOnlyReason::MissingPreciseLocation {
                            component: el.component().unwrap_or(el.annotation),
                        }],
                    })
                }
            }
        }
        covered.sort_unstable();

        let mut gaps: Vec<(u64, u64)> = Vec::new();
        let mut cursor: u64 = 1;
        for (start, end) in covered {
            if start > cursor {
                gaps.push((cursor, start - 1));
            }
            cursor = cursor.max(end + 1);
        }
        if cursor <= stored.len() as u64 {
            gaps.push((cursor, stored.len() as u64));
        }
        if gaps.is_empty() {
            return Ok(0);
        }

        self.ensure_owned()?;
        debug!(canvas = %self.canvas, gaps = gaps.len(), "inserting scar elements");
        self.bulk = true;
        let result = self.insert_scar_elements(&stored, &gaps);
        self.bulk = false;
        result?;

        // One consistency pass over the re-sorted order.
        self.sort_by_annotated_start();
        self.after_mutation()?;
        self.read_only = detect_read_only(&self.document, self.canvas)?;
        Ok(gaps.len())
    }

    fn insert_scar_elements(
        &mut self,
        stored: &str,
        gaps: &[(u64, u64)],
    ) -> Result<(), CanvasError> {
        for (start, end) in gaps {
            let subsequence = &stored[(*start - 1) as usize..*end as usize];
            let definition = self.document.create_definition("scar", PartRole::Scar)?;
            let sequence = self.document.create_sequence(subsequence);
            let def = self.document.definition_mut(definition)?;
            def.name = Some("Assembly Scar".to_string());
            def.sequence = Some(sequence);

            let element = self.push_structural(definition, None)?;
            let annotation = self
                .element(element)
                .ok_or(CanvasError::UnknownElement(element))?
                .annotation;
            self.document.annotation_mut(self.canvas, annotation)?.locations =
                vec![Location::range(*start, *end)];
        }
        Ok(())
    }

    /// Re-sort structural elements by their annotated start coordinate;
    /// features keep their relative order after them, and the backbone
    /// stays pinned.
    fn sort_by_annotated_start(&mut self) {
        let def = match self.document.definition(self.canvas) {
            Ok(def) => def.clone(),
            Err(_) => return,
        };
        let start_of = |el: &DesignElement| -> u64 {
            def.annotation(el.annotation)
                .and_then(|a| a.min_start())
                .unwrap_or(u64::MAX)
        };
        let (mut structural, features): (Vec<_>, Vec<_>) = self
            .elements
            .drain(..)
            .partition(|e| e.is_structural());
        structural.sort_by_key(start_of);
        if let Some(pos) = structural.iter().position(|e| e.is_backbone()) {
            let backbone = structural.remove(pos);
            structural.insert(0, backbone);
        }
        self.elements = structural;
        self.elements.extend(features);
    }

    // ---- focus ----

    pub fn focus_in(&mut self) -> Result<(), CanvasError> {
        let selected = self.selection.ok_or(CanvasError::NoSelection)?;
        let el = self
            .element(selected)
            .ok_or(CanvasError::UnknownElement(selected))?
            .clone();
        match el.kind {
            ElementKind::Structural { definition, .. } => {
                self.zoom.push(ZoomLevel::Definition {
                    definition: self.canvas,
                });
                self.canvas = definition;
                self.reload()?;
                debug!(canvas = %self.canvas, depth = self.zoom.len(), "focused into definition");
            }
            ElementKind::Feature => {
                let filter = navigator::active_span(&self.zoom);
                if !navigator::is_composite(&self.elements, filter, &el) {
                    return Err(CanvasError::CannotFocus);
                }
                let span = el.span.ok_or(CanvasError::CannotFocus)?;
                self.zoom.push(ZoomLevel::Feature { span });
                self.refresh_visibility();
                debug!(?span, depth = self.zoom.len(), "focused into feature range");
            }
        }
        self.events.push(DesignEvent::FocusedIn { canvas: self.canvas });
        Ok(())
    }

    pub fn focus_out(&mut self) -> Result<(), CanvasError> {
        let level = self.zoom.pop().ok_or(CanvasError::CannotFocus)?;
        match level {
            ZoomLevel::Feature { .. } => {
                self.refresh_visibility();
            }
            ZoomLevel::Definition { definition } => {
                // A copy-on-write fork may have replaced an ancestor under
                // a new identity; keep popping until one still resolves.
                let mut target = definition;
                while !self.document.has_definition(target) {
                    match self.zoom.pop() {
                        Some(ZoomLevel::Definition { definition }) => target = definition,
                        Some(ZoomLevel::Feature { .. }) => continue,
                        None => break,
                    }
                }
                if self.document.has_definition(target) {
                    self.canvas = target;
                }
                self.reload()?;
            }
        }
        self.events.push(DesignEvent::FocusedOut { canvas: self.canvas });
        Ok(())
    }

    // ---- internals ----

    /// Run the consistency passes and queue the change event, unless a
    /// bulk edit is in flight (one pass runs at its end).
    fn after_mutation(&mut self) -> Result<(), CanvasError> {
        if self.bulk {
            return Ok(());
        }
        engine::rebuild(
            &mut self.document,
            self.canvas,
            &mut self.elements,
            self.config.on_conflict,
            self.gate.as_mut(),
        )?;
        self.events.push(DesignEvent::DesignChanged);
        Ok(())
    }

    fn refresh_visibility(&mut self) {
        let visible =
            navigator::visible_features(&self.elements, navigator::active_span(&self.zoom));
        if visible != self.visible {
            self.visible = visible;
            self.events.push(DesignEvent::PartVisibilityChanged);
        }
    }

    /// Gate check before a mutation: registry ownership is checked live
    /// (a fork clears it); diagnostic conditions were detected at load and
    /// need an explicit override.
    fn ensure_editable(&mut self) -> Result<(), CanvasError> {
        self.ensure_owned()?;
        let diagnostics: Vec<ReadOnlyReason> = self
            .read_only
            .iter()
            .filter(|r| !matches!(r, ReadOnlyReason::RegistryOwned { .. }))
            .cloned()
            .collect();
        if !diagnostics.is_empty() && !self.gate.allow_read_only_edit(&diagnostics) {
            return Err(CanvasError::ReadOnly {
                reasons: diagnostics,
            });
        }
        Ok(())
    }

    fn ensure_owned(&mut self) -> Result<(), CanvasError> {
        if self.document.is_editable(self.canvas)? {
            return Ok(());
        }
        let display_id = self.document.definition(self.canvas)?.display_id.clone();
        if !self.gate.confirm_fork(&display_id) {
            return Err(CanvasError::NotEditable { display_id });
        }
        self.fork_lineage()
    }

    /// Copy-on-write: fork the canvas definition into the editable
    /// namespace, then walk up the definition stack retargeting each
    /// parent's child instance, forking non-editable ancestors along the
    /// way. Element and selection identity survive the fork.
    fn fork_lineage(&mut self) -> Result<(), CanvasError> {
        let old_canvas = self.canvas;
        let new_canvas = self.document.copy_with_new_identity(old_canvas)?;
        debug!(old = %old_canvas, new = %new_canvas, "forking canvas definition");
        self.remap_elements(old_canvas, new_canvas)?;
        self.canvas = new_canvas;
        self.read_only
            .retain(|r| !matches!(r, ReadOnlyReason::RegistryOwned { .. }));

        let mut old_child = old_canvas;
        let mut new_child = new_canvas;
        for level in self.zoom.iter_mut().rev() {
            let ZoomLevel::Definition { definition } = level else {
                continue;
            };
            let ancestor = *definition;
            if self.document.is_editable(ancestor)? {
                retarget_child(&mut self.document, ancestor, old_child, new_child)?;
                return Ok(());
            }
            let fork = self.document.copy_with_new_identity(ancestor)?;
            retarget_child(&mut self.document, fork, old_child, new_child)?;
            *level = ZoomLevel::Definition { definition: fork };
            old_child = ancestor;
            new_child = fork;
        }
        Ok(())
    }

    /// After a fork the canvas children carry fresh ids; match them back
    /// to the elements by display id, which the copy preserves.
    fn remap_elements(&mut self, old_canvas: Uuid, new_canvas: Uuid) -> Result<(), CanvasError> {
        let old_def = self.document.definition(old_canvas)?.clone();
        let new_def = self.document.definition(new_canvas)?.clone();
        for el in &mut self.elements {
            if let Some(old_ann) = old_def.annotation(el.annotation) {
                if let Some(new_ann) = new_def
                    .annotations
                    .iter()
                    .find(|a| a.display_id == old_ann.display_id)
                {
                    el.annotation = new_ann.id;
                }
            }
            if let ElementKind::Structural { component, .. } = &mut el.kind {
                if let Some(old_instance) = old_def.component(*component) {
                    if let Some(new_instance) = new_def
                        .components
                        .iter()
                        .find(|c| c.display_id == old_instance.display_id)
                    {
                        *component = new_instance.id;
                    }
                }
            }
        }
        Ok(())
    }

    /// Rebuild the element list for the current canvas definition:
    /// normalize instance annotations, reconstruct the order, classify
    /// roles, pin the backbone, detect read-only conditions, and recompute
    /// feature visibility. Clears the selection.
    fn reload(&mut self) -> Result<(), CanvasError> {
        // Imported documents may omit instance annotations; create them
        // only when the definition is ours to write. A registry-owned
        // canvas stays untouched until an edit forks it.
        if self.document.is_editable(self.canvas)? {
            let missing: Vec<(Uuid, String)> = self
                .document
                .definition(self.canvas)?
                .components
                .iter()
                .filter(|c| {
                    self.document
                        .definition(self.canvas)
                        .ok()
                        .and_then(|d| d.annotation_for_component(c.id))
                        .is_none()
                })
                .map(|c| (c.id, c.display_id.clone()))
                .collect();
            for (component, display) in missing {
                let id = self
                    .document
                    .create_annotation(self.canvas, &format!("{display}_anno"))?;
                self.document.annotation_mut(self.canvas, id)?.component = Some(component);
            }
        }

        let def = self.document.definition(self.canvas)?.clone();

        let completely_annotated = def.components.iter().all(|c| {
            def.annotation_for_component(c.id)
                .map(|a| a.has_precise_location())
                .unwrap_or(false)
        });

        let ordered: Vec<Uuid> = if completely_annotated {
            self.order_source = OrderSource::PreciseLocations;
            let mut ids: Vec<(u64, usize, Uuid)> = def
                .components
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let start = def
                        .annotation_for_component(c.id)
                        .and_then(|a| a.min_start())
                        .unwrap_or(u64::MAX);
                    (start, i, c.id)
                })
                .collect();
            ids.sort_unstable();
            ids.into_iter().map(|(_, _, id)| id).collect()
        } else {
            self.order_source = OrderSource::DeclaredConstraints;
            topological_order(
                &def.components.iter().map(|c| c.id).collect::<Vec<_>>(),
                &def
                    .constraints
                    .iter()
                    .map(|c| (c.subject, c.object))
                    .collect::<Vec<_>>(),
            )
        };

        let mut elements = Vec::with_capacity(def.components.len() + def.annotations.len());
        for component in ordered {
            let instance = def
                .component(component)
                .ok_or(DocumentError::UnknownComponent(component))?;
            let child = self.document.definition(instance.definition)?;
            let annotation = def.annotation_for_component(component);
            let mut roles: Vec<PartRole> = annotation.and_then(|a| a.role).into_iter().collect();
            roles.push(child.role);
            elements.push(DesignElement {
                id: Uuid::new_v4(),
                // On a registry-owned canvas the annotation may not exist
                // yet; the id stays dangling until the first edit forks
                // the definition and the position pass creates one.
                annotation: annotation.map(|a| a.id).unwrap_or_else(Uuid::new_v4),
                kind: ElementKind::Structural {
                    component,
                    definition: instance.definition,
                },
                role: self.catalog.classify(&roles),
                name: annotation
                    .and_then(|a| a.name.clone())
                    .or_else(|| child.name.clone())
                    .unwrap_or_else(|| child.display_id.clone()),
                orientation: annotation
                    .and_then(|a| a.locations.first())
                    .map(|l| l.orientation())
                    .unwrap_or_default(),
                span: None,
            });
        }

        let mut features: Vec<&splice_document::Annotation> = def
            .annotations
            .iter()
            .filter(|a| a.component.is_none())
            .collect();
        features.sort_by_key(|a| a.min_start().unwrap_or(u64::MAX));
        for ann in features {
            let span = match (ann.min_start(), ann.max_end()) {
                (Some(start), Some(end)) => Some(FeatureSpan::new(start, end)),
                _ => None,
            };
            let roles: Vec<PartRole> = ann.role.into_iter().collect();
            elements.push(DesignElement {
                id: Uuid::new_v4(),
                annotation: ann.id,
                kind: ElementKind::Feature,
                role: self.catalog.classify(&roles),
                name: ann.name.clone().unwrap_or_else(|| ann.display_id.clone()),
                orientation: ann
                    .locations
                    .first()
                    .map(|l| l.orientation())
                    .unwrap_or_default(),
                span,
            });
        }

        // Pin the first backbone; malformed extras stay where they loaded.
        if let Some(pos) = elements.iter().position(|e| e.is_backbone()) {
            if pos != 0 {
                let backbone = elements.remove(pos);
                elements.insert(0, backbone);
            }
        }

        self.elements = elements;
        self.selection = None;
        self.read_only = detect_read_only(&self.document, self.canvas)?;
        self.visible =
            navigator::visible_features(&self.elements, navigator::active_span(&self.zoom));
        Ok(())
    }
}

fn retarget_child(
    doc: &mut Document,
    parent: Uuid,
    old_child: Uuid,
    new_child: Uuid,
) -> Result<(), CanvasError> {
    let parent = doc.definition_mut(parent)?;
    for instance in &mut parent.components {
        if instance.definition == old_child {
            instance.definition = new_child;
        }
    }
    Ok(())
}

/// Kahn's algorithm over `subject precedes object` edges, with document
/// order as the deterministic tie-break. When a cycle blocks progress the
/// remaining nodes are appended in document order instead of rejecting
/// the load.
fn topological_order(nodes: &[Uuid], edges: &[(Uuid, Uuid)]) -> Vec<Uuid> {
    let mut remaining: Vec<Uuid> = nodes.to_vec();
    let mut order = Vec::with_capacity(nodes.len());
    while !remaining.is_empty() {
        let next = remaining.iter().position(|id| {
            !edges
                .iter()
                .any(|(subject, object)| object == id && remaining.contains(subject))
        });
        match next {
            Some(index) => order.push(remaining.remove(index)),
            None => {
                order.extend(remaining.drain(..));
            }
        }
    }
    order
}

/// Pure read-only detection over the canvas definition. Diagnostic
/// conditions only apply when there is a stored sequence to reconcile
/// against.
pub fn detect_read_only(doc: &Document, canvas: Uuid) -> Result<Vec<ReadOnlyReason>, CanvasError> {
    let def = doc.definition(canvas)?;
    let mut reasons = Vec::new();
    if def.namespace != doc.namespace() {
        reasons.push(ReadOnlyReason::RegistryOwned {
            namespace: def.namespace.clone(),
        });
    }

    let Some(seq_id) = def.sequence else {
        return Ok(reasons);
    };
    if def.components.is_empty() {
        return Ok(reasons);
    }
    let stored_len = doc.sequence(seq_id)?.len();

    let mut ranges: Vec<(u64, u64)> = Vec::new();
    for instance in &def.components {
        match def
            .annotation_for_component(instance.id)
            .and_then(|a| a.min_start().zip(a.max_end()))
        {
            Some(range) => ranges.push(range),
            None => reasons.push(ReadOnlyReason::MissingPreciseLocation {
                component: instance.id,
            }),
        }
    }

    ranges.sort_unstable();
    let mut covered: u64 = 0;
    let mut cursor: u64 = 0;
    for (start, end) in ranges {
        let start = start.max(cursor + 1);
        if end >= start {
            covered += end - start + 1;
            cursor = end.max(cursor);
        }
    }
    if (stored_len as u64) > covered {
        reasons.push(ReadOnlyReason::UncoveredSequence {
            stored_len,
            covered_len: covered as usize,
        });
    }
    Ok(reasons)
}
