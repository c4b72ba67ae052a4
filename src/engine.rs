//! Pointer/keyboard state machine driving the annotation store.

use egui::{Pos2, Vec2};
use tracing::{debug, info, warn};

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, Color4, ShapeKind};
use crate::compositor::{self, ImageSource};
use crate::config::EngineConfig;
use crate::geometry::{self, CursorKind, Handle};
use crate::history::History;
use crate::render::{self, RasterSurface, Surface};
use crate::store::AnnotationStore;

// ── Tool / Interaction State ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Arrow,
    Rectangle,
    Circle,
    Text,
}

impl Tool {
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            Tool::Arrow => Some(ShapeKind::Arrow),
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Circle => Some(ShapeKind::Circle),
            Tool::Text => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    /// Rubber-banding a new shape from a fixed gesture start.
    Drawing { start: Pos2 },
    /// `last` is re-based on every move frame.
    Moving { last: Pos2 },
    Resizing { handle: Handle, last: Pos2 },
}

/// What the caller knows about focus when a pointer goes down.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerContext {
    /// A text-element editor outside the canvas holds focus and must be
    /// allowed to commit on blur before the canvas reacts.
    pub external_editor_focused: bool,
}

/// Whether the canvas took the pointer-down. `Ignored` means the caller
/// must let the event's default handling (blur) proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerResponse {
    Ignored,
    Consumed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
}

/// Where keyboard focus sits when a key is pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFocus {
    Canvas,
    /// The inline editor of the active text pin.
    PinEditor,
    /// Any other text input on the page.
    TextInput,
}

// ── Engine ──────────────────────────────────────────────────────────────────

pub struct AnnotationEngine {
    config: EngineConfig,
    store: AnnotationStore,
    tool: Option<Tool>,
    color: Color4,
    state: InteractionState,
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnnotationEngine {
    pub fn new(config: EngineConfig) -> Self {
        let color = config.default_color;
        Self {
            config,
            store: AnnotationStore::default(),
            tool: None,
            color,
            state: InteractionState::Idle,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn history(&self) -> &History {
        self.store.history()
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.store.selected()
    }

    pub fn active(&self) -> Option<AnnotationId> {
        self.store.active()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Option<Tool>) {
        debug!(?tool, "tool armed");
        self.tool = tool;
    }

    pub fn color(&self) -> Color4 {
        self.color
    }

    pub fn set_color(&mut self, color: Color4) {
        self.color = color;
    }

    pub fn undo(&mut self) -> bool {
        self.state = InteractionState::Idle;
        self.store.undo()
    }

    pub fn clear(&mut self) {
        self.state = InteractionState::Idle;
        self.store.clear();
    }

    // ── Pointer ─────────────────────────────────────────────────────────────

    pub fn pointer_down(&mut self, point: Pos2, ctx: PointerContext) -> PointerResponse {
        if ctx.external_editor_focused {
            return PointerResponse::Ignored;
        }

        let previous_active = self.store.active();
        if previous_active.is_some() {
            self.commit_active_annotation();
        }

        // Handles of the selected shape sit on its edge, so they win over
        // the body hit-test that would otherwise start a move.
        if let Some(handle) = self.selected_shape_handle(point) {
            debug!(?handle, "resize started");
            self.state = InteractionState::Resizing {
                handle,
                last: point,
            };
            return PointerResponse::Consumed;
        }

        if let Some(hit) = self.hit_test(point) {
            let is_pin = self.store.get(hit).is_some_and(Annotation::is_text_pin);
            if is_pin && previous_active != Some(hit) {
                self.store.activate(hit);
            } else {
                self.store.select(Some(hit));
            }
            debug!(id = %hit, "move started");
            self.state = InteractionState::Moving { last: point };
            return PointerResponse::Consumed;
        }

        self.store.select(None);
        match self.tool {
            None => {}
            Some(Tool::Text) => {
                let id = self.store.next_id();
                self.store
                    .add_annotation(Annotation::text_pin(id, point, self.color));
                self.store.push_history();
                self.store.activate(id);
            }
            Some(tool) => {
                if let Some(kind) = tool.shape_kind() {
                    let id = self.store.next_id();
                    self.store
                        .add_annotation(Annotation::shape(id, kind, point, self.color));
                    self.store.select(Some(id));
                    self.state = InteractionState::Drawing { start: point };
                }
            }
        }
        PointerResponse::Consumed
    }

    /// Advance the current gesture. Returns the cursor to show.
    pub fn pointer_move(&mut self, point: Pos2) -> CursorKind {
        match self.state {
            InteractionState::Idle => self.cursor_for(point),
            InteractionState::Moving { last } => {
                let delta = point - last;
                self.state = InteractionState::Moving { last: point };
                if let Some(selected) = self.store.selected_annotation_mut() {
                    selected.translate(delta.x, delta.y);
                }
                CursorKind::Move
            }
            InteractionState::Drawing { start } => {
                if let Some(selected) = self.store.selected_annotation_mut() {
                    rubber_band(selected, start, point);
                }
                CursorKind::Crosshair
            }
            InteractionState::Resizing { handle, last } => {
                let delta: Vec2 = point - last;
                self.state = InteractionState::Resizing {
                    handle,
                    last: point,
                };
                if let Some(selected) = self.store.selected_annotation_mut() {
                    selected.drag_handle(handle, delta.x, delta.y);
                }
                handle.cursor()
            }
        }
    }

    /// Finish the current gesture: normalise the shape, snapshot, and disarm
    /// the tool after a fresh draw. Returns whether a gesture was committed.
    pub fn pointer_up(&mut self) -> bool {
        let finished = std::mem::replace(&mut self.state, InteractionState::Idle);
        if finished == InteractionState::Idle {
            return false;
        }

        if let Some(selected) = self.store.selected_annotation_mut() {
            selected.normalize();
        }
        self.store.push_history();

        if matches!(finished, InteractionState::Drawing { .. }) {
            self.tool = None;
        }
        debug!(gesture = ?finished, "gesture committed");
        true
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.pointer_up()
    }

    /// Cursor feedback for a hover at `point` with no gesture in flight.
    /// Only the selected shape shows resize cursors; anything else under
    /// the pointer can just be moved.
    pub fn cursor_for(&self, point: Pos2) -> CursorKind {
        let active = self.store.active();
        let on_selected = self
            .store
            .selected_annotation()
            .filter(|a| Some(a.id) != active)
            .and_then(|a| geometry::cursor_for_position(point, a, &self.config));
        if let Some(cursor) = on_selected {
            return cursor;
        }
        let hovered = self
            .store
            .annotations()
            .iter()
            .filter(|a| Some(a.id) != active)
            .any(|a| geometry::is_point_in_shape(point, a, &self.config));
        if hovered {
            return CursorKind::Move;
        }
        match self.tool {
            None => CursorKind::Default,
            Some(Tool::Text) => CursorKind::Text,
            Some(_) => CursorKind::Crosshair,
        }
    }

    fn hit_test(&self, point: Pos2) -> Option<AnnotationId> {
        self.store
            .annotations()
            .iter()
            .rev()
            .find(|a| geometry::is_point_in_shape(point, a, &self.config))
            .map(|a| a.id)
    }

    fn selected_shape_handle(&self, point: Pos2) -> Option<Handle> {
        let selected = self.store.selected_annotation()?;
        if selected.is_text_pin() {
            return None;
        }
        geometry::handle_at(point, selected, &self.config)
    }

    // ── Text pins ───────────────────────────────────────────────────────────

    /// Text of the pin currently being edited, for the inline editor to
    /// write into.
    pub fn active_text_mut(&mut self) -> Option<&mut String> {
        let id = self.store.active()?;
        match &mut self.store.get_mut(id)?.kind {
            AnnotationKind::TextPin { text } => Some(text),
            _ => None,
        }
    }

    pub fn set_active_text(&mut self, text: impl Into<String>) {
        if let Some(current) = self.active_text_mut() {
            *current = text.into();
        }
    }

    /// Close the active pin editor. An empty pin is discarded; a pin whose
    /// text changed since the last snapshot is recorded. Either way the
    /// armed tool is released. Returns `false` when nothing was active.
    pub fn commit_active_annotation(&mut self) -> bool {
        let Some(id) = self.store.active() else {
            return false;
        };
        self.store.deactivate();
        self.tool = None;

        let Some(text) = self.store.get(id).and_then(Annotation::text) else {
            return true;
        };
        if text.trim().is_empty() {
            self.store.discard(id);
            debug!(%id, "discarded empty text pin");
            return true;
        }

        let unchanged = self
            .store
            .history()
            .current()
            .and_then(|snapshot| snapshot.iter().find(|a| a.id == id))
            .and_then(Annotation::text)
            .is_some_and(|recorded| recorded == text);
        if !unchanged {
            self.store.push_history();
        }
        debug!(%id, "text pin committed");
        true
    }

    // ── Keyboard ────────────────────────────────────────────────────────────

    /// Returns whether the key was handled. Delete/Backspace typed into a
    /// text input are left to that input.
    pub fn key_down(&mut self, key: Key, focus: KeyFocus) -> bool {
        match (key, focus) {
            (Key::Escape, KeyFocus::PinEditor) => self.commit_active_annotation(),
            (Key::Delete | Key::Backspace, KeyFocus::Canvas) => self.delete_selected(),
            _ => false,
        }
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.store.selected() else {
            return false;
        };
        if self.store.remove(id).is_none() {
            return false;
        }
        self.state = InteractionState::Idle;
        self.store.push_history();
        debug!(%id, "annotation deleted");
        true
    }

    // ── Output ──────────────────────────────────────────────────────────────

    pub fn render(&self, surface: &mut impl Surface) {
        render::render_annotations(&self.store, &self.config, surface);
    }

    /// Flatten the base image and (optionally) the annotation layer at the
    /// image's native resolution, encoded as PNG. Selection and editing
    /// state are cleared first so no handles leak into the output. `None`
    /// when the image cannot be loaded or encoded.
    pub fn get_composited_image(
        &mut self,
        source: &(impl ImageSource + ?Sized),
        include_annotations: bool,
    ) -> Option<Vec<u8>> {
        self.commit_active_annotation();
        self.store.select(None);

        let layer = include_annotations.then(|| {
            let mut surface = RasterSurface::for_config(&self.config);
            self.render(&mut surface);
            surface.into_image()
        });

        let composited = match compositor::composite(source, layer.as_ref()) {
            Ok(image) => image,
            Err(e) => {
                warn!("Cannot composite: {}", e);
                return None;
            }
        };
        match compositor::encode_png(&composited) {
            Ok(bytes) => {
                info!(
                    width = composited.width(),
                    height = composited.height(),
                    include_annotations,
                    "composited image"
                );
                Some(bytes)
            }
            Err(e) => {
                warn!("Cannot encode composited image: {}", e);
                None
            }
        }
    }
}

/// Stretch a freshly drawn shape from `start` to `point`. Size may go
/// negative; it is normalised on commit.
fn rubber_band(shape: &mut Annotation, start: Pos2, point: Pos2) {
    shape.x = start.x;
    shape.y = start.y;
    if let AnnotationKind::Arrow { points, .. } = &mut shape.kind {
        *points = [start.x, start.y, point.x, point.y];
    }
    shape.set_size(point.x - start.x, point.y - start.y);
}
