//! Linear snapshot history for the annotation list.

use crate::annotation::Annotation;

/// Full-list snapshots plus a cursor. The cursor is `None` when the
/// history is empty and otherwise always indexes a stored snapshot.
#[derive(Clone, Debug, Default)]
pub struct History {
    snapshots: Vec<Vec<Annotation>>,
    index: Option<usize>,
}

impl History {
    /// Drop everything after the cursor, append `snapshot` and point at it.
    pub fn push(&mut self, snapshot: Vec<Annotation>) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(snapshot);
        self.index = Some(self.snapshots.len() - 1);
    }

    /// Step back one snapshot and return it. Stepping back from the first
    /// snapshot empties the history and yields an empty list, so there is
    /// nothing left to redo.
    pub fn undo(&mut self) -> Option<Vec<Annotation>> {
        match self.index {
            None => None,
            Some(0) => {
                self.clear();
                Some(Vec::new())
            }
            Some(i) => {
                self.index = Some(i - 1);
                Some(self.snapshots[i - 1].clone())
            }
        }
    }

    /// Overwrite the snapshot under the cursor without moving it. No-op on
    /// an empty history.
    pub fn replace_current(&mut self, snapshot: Vec<Annotation>) {
        if let Some(i) = self.index {
            self.snapshots[i] = snapshot;
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = None;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// The cursor with `-1` standing for an empty history.
    pub fn signed_index(&self) -> isize {
        self.index.map_or(-1, |i| i as isize)
    }

    pub fn current(&self) -> Option<&[Annotation]> {
        self.index.map(|i| self.snapshots[i].as_slice())
    }

    pub fn snapshots(&self) -> &[Vec<Annotation>] {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationId, Color4};
    use egui::pos2;

    fn list(ids: &[u64]) -> Vec<Annotation> {
        ids.iter()
            .map(|&id| Annotation::text_pin(AnnotationId(id), pos2(0.0, 0.0), Color4::default()))
            .collect()
    }

    #[test]
    fn starts_empty() {
        let history = History::default();
        assert!(history.is_empty());
        assert_eq!(history.signed_index(), -1);
        assert!(history.current().is_none());
    }

    #[test]
    fn push_advances_cursor() {
        let mut history = History::default();
        history.push(list(&[1]));
        history.push(list(&[1, 2]));

        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), Some(1));
        assert_eq!(history.current().map(<[_]>::len), Some(2));
    }

    #[test]
    fn push_after_undo_truncates() {
        let mut history = History::default();
        history.push(list(&[1]));
        history.push(list(&[1, 2]));
        history.push(list(&[1, 2, 3]));

        assert_eq!(history.undo().map(|l| l.len()), Some(2));
        assert_eq!(history.undo().map(|l| l.len()), Some(1));
        history.push(list(&[1, 4]));

        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), Some(1));
        assert_eq!(history.current().unwrap()[1].id, AnnotationId(4));
    }

    #[test]
    fn undo_past_first_snapshot_clears() {
        let mut history = History::default();
        history.push(list(&[1]));

        assert_eq!(history.undo(), Some(Vec::new()));
        assert!(history.is_empty());
        assert_eq!(history.signed_index(), -1);
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn replace_current_keeps_cursor_and_length() {
        let mut history = History::default();
        history.replace_current(list(&[9]));
        assert!(history.is_empty());

        history.push(list(&[1]));
        history.push(list(&[1, 2]));
        history.replace_current(list(&[1]));

        assert_eq!(history.len(), 2);
        assert_eq!(history.index(), Some(1));
        assert_eq!(history.current().map(<[_]>::len), Some(1));
        assert_eq!(history.undo().map(|l| l.len()), Some(1));
    }
}
