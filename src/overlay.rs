//! Text-element overlay: speech, thought and narration boxes layered over
//! the image by the generation pipeline.
//!
//! The element list belongs to the caller. The overlay only tracks
//! selection, drag and edit state, and reports changes as
//! [`OverlayEdit`]s for the caller to apply.

use egui::{pos2, vec2, Pos2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextElementKind {
    Dialogue,
    Narrative,
    Thoughts,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub fn pos(&self) -> Pos2 {
        pos2(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub id: String,
    /// Top-left of the fixed-size box, in logical units.
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: TextElementKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
}

impl TextElement {
    pub fn pos(&self) -> Pos2 {
        pos2(self.x, self.y)
    }

    /// Only dialogue bubbles expose a draggable anchor.
    pub fn has_draggable_anchor(&self) -> bool {
        self.kind == TextElementKind::Dialogue && self.anchor.is_some()
    }
}

/// Parse the element list produced by the generation pipeline.
pub fn parse_elements(json: &str) -> serde_json::Result<Vec<TextElement>> {
    serde_json::from_str(json)
}

/// A change the caller should apply to its element list.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayEdit {
    Move { id: String, x: f32, y: f32 },
    MoveAnchor { id: String, x: f32, y: f32 },
    Retext { id: String, text: String },
    Delete { id: String },
}

pub fn apply_overlay_edit(elements: &mut Vec<TextElement>, edit: &OverlayEdit) {
    match edit {
        OverlayEdit::Delete { id } => elements.retain(|e| &e.id != id),
        OverlayEdit::Move { id, x, y } => {
            if let Some(e) = elements.iter_mut().find(|e| &e.id == id) {
                e.x = *x;
                e.y = *y;
            }
        }
        OverlayEdit::MoveAnchor { id, x, y } => {
            if let Some(e) = elements.iter_mut().find(|e| &e.id == id) {
                e.anchor = Some(Anchor { x: *x, y: *y });
            }
        }
        OverlayEdit::Retext { id, text } => {
            if let Some(e) = elements.iter_mut().find(|e| &e.id == id) {
                e.text.clone_from(text);
            }
        }
    }
}

/// On-screen size of the logical canvas, used to turn pointer deltas in
/// screen pixels into logical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayScale {
    pub rendered: Vec2,
    pub logical: Vec2,
}

impl DisplayScale {
    pub fn new(rendered: Vec2, logical: Vec2) -> Self {
        Self { rendered, logical }
    }

    pub fn to_logical(&self, screen_delta: Vec2) -> Vec2 {
        vec2(
            screen_delta.x * self.logical.x / self.rendered.x.max(f32::EPSILON),
            screen_delta.y * self.logical.y / self.rendered.y.max(f32::EPSILON),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragTarget {
    Body,
    Anchor,
}

#[derive(Clone, Debug, PartialEq)]
struct OverlayDrag {
    id: String,
    target: DragTarget,
    last: Pos2,
}

#[derive(Clone, Debug, PartialEq)]
struct EditSession {
    id: String,
    original: String,
    buffer: String,
}

#[derive(Clone, Debug)]
pub struct TextOverlay {
    logical: Vec2,
    box_size: Vec2,
    clamp_margin: Option<f32>,
    selected: Option<String>,
    drag: Option<OverlayDrag>,
    editing: Option<EditSession>,
}

impl TextOverlay {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            logical: config.logical_size(),
            box_size: vec2(config.text_box.width, config.text_box.height),
            clamp_margin: config.text_box.clamp_margin,
            selected: None,
            drag: None,
            editing: None,
        }
    }

    pub fn box_size(&self) -> Vec2 {
        self.box_size
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<&str>) {
        self.selected = id.map(str::to_owned);
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.id.as_str())
    }

    /// Whether an inline editor holds focus; the canvas must then leave
    /// pointer-downs alone so the editor can commit on blur.
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.buffer.as_str())
    }

    pub fn edit_buffer_mut(&mut self) -> Option<&mut String> {
        self.editing.as_mut().map(|e| &mut e.buffer)
    }

    /// Size of the inline editor box. It keeps the stored width and grows
    /// downward to fit `text_height` plus `padding` on both sides, never
    /// shrinking below the stored box.
    pub fn editor_size(&self, text_height: f32, padding: f32) -> Vec2 {
        vec2(
            self.box_size.x,
            self.box_size.y.max(text_height + 2.0 * padding),
        )
    }

    /// Pointer went down on the body of element `id`.
    pub fn begin_drag(&mut self, id: &str, screen: Pos2) {
        self.selected = Some(id.to_owned());
        self.drag = Some(OverlayDrag {
            id: id.to_owned(),
            target: DragTarget::Body,
            last: screen,
        });
    }

    /// Pointer went down on the anchor handle of a selected dialogue
    /// element. Anything else is ignored.
    pub fn begin_anchor_drag(&mut self, element: &TextElement, screen: Pos2) -> bool {
        if !element.has_draggable_anchor()
            || self.selected.as_deref() != Some(element.id.as_str())
        {
            return false;
        }
        self.drag = Some(OverlayDrag {
            id: element.id.clone(),
            target: DragTarget::Anchor,
            last: screen,
        });
        true
    }

    /// Advance a drag by the pointer delta since the previous frame.
    pub fn drag_to(
        &mut self,
        screen: Pos2,
        scale: DisplayScale,
        elements: &[TextElement],
    ) -> Option<OverlayEdit> {
        let drag = self.drag.as_mut()?;
        let delta = scale.to_logical(screen - drag.last);
        drag.last = screen;
        let target = drag.target;
        let element = elements.iter().find(|e| e.id == drag.id)?;

        match target {
            DragTarget::Body => {
                let moved = self.clamp_box(element.pos() + delta);
                Some(OverlayEdit::Move {
                    id: element.id.clone(),
                    x: moved.x,
                    y: moved.y,
                })
            }
            DragTarget::Anchor => {
                let anchor = element.anchor?;
                let moved = pos2(
                    (anchor.x + delta.x).clamp(0.0, self.logical.x),
                    (anchor.y + delta.y).clamp(0.0, self.logical.y),
                );
                Some(OverlayEdit::MoveAnchor {
                    id: element.id.clone(),
                    x: moved.x,
                    y: moved.y,
                })
            }
        }
    }

    pub fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!(id = %drag.id, target = ?drag.target, "overlay drag finished");
        }
    }

    fn clamp_box(&self, pos: Pos2) -> Pos2 {
        let Some(margin) = self.clamp_margin else {
            return pos;
        };
        let max = self.logical - self.box_size - vec2(margin, margin);
        pos2(
            pos.x.clamp(margin, max.x.max(margin)),
            pos.y.clamp(margin, max.y.max(margin)),
        )
    }

    /// Double-click: open the inline editor on the element's text.
    pub fn begin_edit(&mut self, element: &TextElement) {
        self.selected = Some(element.id.clone());
        self.drag = None;
        self.editing = Some(EditSession {
            id: element.id.clone(),
            original: element.text.clone(),
            buffer: element.text.clone(),
        });
    }

    /// Blur or Escape: close the editor, reporting the new text if it
    /// changed.
    pub fn commit_edit(&mut self) -> Option<OverlayEdit> {
        let session = self.editing.take()?;
        if session.buffer == session.original {
            return None;
        }
        debug!(id = %session.id, "text element retexted");
        Some(OverlayEdit::Retext {
            id: session.id,
            text: session.buffer,
        })
    }

    /// Remove the selected element, clearing selection and edit state.
    pub fn delete_selected(&mut self) -> Option<OverlayEdit> {
        let id = self.selected.take()?;
        self.editing = None;
        self.drag = None;
        debug!(%id, "text element deleted");
        Some(OverlayEdit::Delete { id })
    }
}
