//! The live annotation list, its history and the selection cursors.

use tracing::debug;

use crate::annotation::{Annotation, AnnotationId};
use crate::history::History;

/// Owns every annotation in insertion order. The active (editing) id, when
/// set, is always the selected id as well.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    history: History,
    selected: Option<AnnotationId>,
    active: Option<AnnotationId>,
    next_id: u64,
}

impl AnnotationStore {
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn active(&self) -> Option<AnnotationId> {
        self.active
    }

    pub fn next_id(&mut self) -> AnnotationId {
        self.next_id += 1;
        AnnotationId(self.next_id)
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_annotation_mut(&mut self) -> Option<&mut Annotation> {
        let id = self.selected?;
        self.get_mut(id)
    }

    /// Append without snapshotting; the caller decides when to commit.
    pub fn add_annotation(&mut self, annotation: Annotation) {
        debug!(id = %annotation.id, "annotation added");
        self.annotations.push(annotation);
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.annotations.remove(index))
    }

    /// Remove a blank pin for good. The snapshot under the cursor forgets it
    /// too, so undo cannot bring it back.
    pub fn discard(&mut self, id: AnnotationId) -> Option<Annotation> {
        let removed = self.remove(id)?;
        let recorded = self
            .history
            .current()
            .is_some_and(|snapshot| snapshot.iter().any(|a| a.id == id));
        if recorded {
            self.history.replace_current(self.annotations.clone());
        }
        Some(removed)
    }

    /// Snapshot the live list into history.
    pub fn push_history(&mut self) {
        self.history.push(self.annotations.clone());
        debug!(
            len = self.history.len(),
            index = self.history.signed_index(),
            "history snapshot"
        );
    }

    /// Restore the previous snapshot. Undoing the first snapshot empties
    /// the list and the history. Pins recorded before any text was typed are
    /// not restored. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let Some(mut restored) = self.history.undo() else {
            return false;
        };
        restored.retain(|a| a.text().map_or(true, |text| !text.trim().is_empty()));
        self.annotations = restored;
        self.selected = None;
        self.active = None;
        debug!(index = self.history.signed_index(), "undo");
        true
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.history.clear();
        self.selected = None;
        self.active = None;
    }

    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selected = id;
        if self.active.is_some() && self.active != id {
            self.active = None;
        }
    }

    /// Mark `id` as the annotation being edited; it becomes selected too.
    pub fn activate(&mut self, id: AnnotationId) {
        self.selected = Some(id);
        self.active = Some(id);
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// 1-based rank of a text pin among text pins in store order.
    pub fn pin_number(&self, id: AnnotationId) -> Option<usize> {
        self.annotations
            .iter()
            .filter(|a| a.is_text_pin())
            .position(|a| a.id == id)
            .map(|rank| rank + 1)
    }
}
