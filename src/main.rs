use std::path::{Path, PathBuf};

use bubble_annotate::bubble::{self, MeasuredLayout};
use bubble_annotate::compositor::ImageSource;
use bubble_annotate::geometry::CursorKind;
use bubble_annotate::overlay::{apply_overlay_edit, parse_elements, DisplayScale, TextElement};
use bubble_annotate::render::{self, StrokeStyle, Surface};
use bubble_annotate::{
    AnnotationEngine, Color4, EngineConfig, InteractionState, Key, KeyFocus, PointerContext,
    PointerResponse, TextElementKind, TextOverlay, Tool,
};
use eframe::egui;
use egui::{pos2, vec2, Pos2, Rect, Vec2};
use image::DynamicImage;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str =
    "Usage: bubble-annotate <image.png|jpg> [--elements layout.json] [--config config.json]";

const ELLIPSE_SEGMENTS: usize = 64;
const BUBBLE_OUTLINE: Color4 = Color4::rgb(0.15, 0.15, 0.15);
const NARRATIVE_FILL: egui::Color32 = egui::Color32::from_rgb(255, 248, 214);
const SELECTION: egui::Color32 = egui::Color32::from_rgb(0, 120, 255);
const ANCHOR_HANDLE_SIZE: f32 = 14.0;
const PIN_EDITOR_WIDTH: f32 = 220.0;
const ELEMENT_FONT_SIZE: f32 = 18.0;
const ELEMENT_PADDING: f32 = 8.0;

// ── Canvas View ─────────────────────────────────────────────────────────────

/// Where the logical canvas currently sits on screen.
#[derive(Clone, Copy, Debug)]
struct CanvasView {
    rect: Rect,
    logical: Vec2,
}

impl CanvasView {
    fn scale(&self) -> Vec2 {
        vec2(
            self.rect.width() / self.logical.x,
            self.rect.height() / self.logical.y,
        )
    }

    fn to_screen(&self, p: Pos2) -> Pos2 {
        let s = self.scale();
        self.rect.min + vec2(p.x * s.x, p.y * s.y)
    }

    fn to_logical(&self, p: Pos2) -> Pos2 {
        let s = self.scale();
        let rel = p - self.rect.min;
        pos2(
            rel.x / s.x.max(f32::EPSILON),
            rel.y / s.y.max(f32::EPSILON),
        )
    }

    fn len_to_screen(&self, len: f32) -> f32 {
        let s = self.scale();
        len * (s.x + s.y) * 0.5
    }

    fn rect_to_logical(&self, r: Rect) -> Rect {
        Rect::from_min_max(self.to_logical(r.min), self.to_logical(r.max))
    }
}

// ── Painter Surface ─────────────────────────────────────────────────────────

/// Draws annotations through an egui painter, mapping logical units onto
/// the on-screen image.
struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    view: CanvasView,
}

impl PainterSurface<'_> {
    fn stroke(&self, stroke: StrokeStyle) -> egui::Stroke {
        egui::Stroke::new(
            self.view.len_to_screen(stroke.width).max(1.0),
            stroke.color.to_egui(),
        )
    }

    fn path(&self, points: Vec<Pos2>, closed: bool, style: StrokeStyle) {
        let mut screen: Vec<Pos2> = points
            .into_iter()
            .map(|p| self.view.to_screen(p))
            .collect();
        let stroke = self.stroke(style);
        match style.dash {
            Some(dash) => {
                if closed {
                    if let Some(&first) = screen.first() {
                        screen.push(first);
                    }
                }
                let dash = self.view.len_to_screen(dash).max(1.0);
                self.painter
                    .extend(egui::Shape::dashed_line(&screen, stroke, dash, dash));
            }
            None if closed => {
                self.painter.add(egui::Shape::closed_line(screen, stroke));
            }
            None => {
                self.painter.add(egui::Shape::line(screen, stroke));
            }
        }
    }
}

fn ellipse_points(rect: Rect) -> Vec<Pos2> {
    let (c, rx, ry) = (rect.center(), rect.width() / 2.0, rect.height() / 2.0);
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = (i as f32 / ELLIPSE_SEGMENTS as f32) * std::f32::consts::TAU;
            pos2(c.x + rx * t.cos(), c.y + ry * t.sin())
        })
        .collect()
}

impl Surface for PainterSurface<'_> {
    fn clear(&mut self) {
        // egui repaints from scratch every frame.
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: StrokeStyle) {
        self.path(vec![from, to], false, stroke);
    }

    fn fill_polygon(&mut self, points: &[Pos2], color: Color4) {
        let screen = points.iter().map(|&p| self.view.to_screen(p)).collect();
        self.painter.add(egui::Shape::convex_polygon(
            screen,
            color.to_egui(),
            egui::Stroke::NONE,
        ));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color4) {
        let screen = Rect::from_min_max(
            self.view.to_screen(rect.min),
            self.view.to_screen(rect.max),
        );
        self.painter.rect_filled(screen, 0.0, color.to_egui());
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color4) {
        self.painter.circle_filled(
            self.view.to_screen(center),
            self.view.len_to_screen(radius),
            color.to_egui(),
        );
    }

    fn stroke_circle(&mut self, center: Pos2, radius: f32, stroke: StrokeStyle) {
        let bounds = Rect::from_center_size(center, vec2(radius * 2.0, radius * 2.0));
        self.path(ellipse_points(bounds), true, stroke);
    }

    fn stroke_ellipse(&mut self, rect: Rect, stroke: StrokeStyle) {
        self.path(ellipse_points(rect), true, stroke);
    }

    fn text_centered(&mut self, center: Pos2, text: &str, size: f32, color: Color4) {
        self.painter.text(
            self.view.to_screen(center),
            egui::Align2::CENTER_CENTER,
            text,
            egui::FontId::proportional(self.view.len_to_screen(size).max(6.0)),
            color.to_egui(),
        );
    }
}

fn cursor_icon(kind: CursorKind) -> egui::CursorIcon {
    match kind {
        CursorKind::Default => egui::CursorIcon::Default,
        CursorKind::Crosshair => egui::CursorIcon::Crosshair,
        CursorKind::Text => egui::CursorIcon::Text,
        CursorKind::Move => egui::CursorIcon::Move,
        CursorKind::Grab => egui::CursorIcon::Grab,
        CursorKind::NwseResize => egui::CursorIcon::ResizeNwSe,
        CursorKind::NeswResize => egui::CursorIcon::ResizeNeSw,
    }
}

fn paint_bubble(painter: &egui::Painter, rect: Rect, kind: TextElementKind, selected: bool) {
    let (rounding, fill) = match kind {
        TextElementKind::Dialogue => (12.0, egui::Color32::WHITE),
        TextElementKind::Thoughts => (rect.height() / 2.0, egui::Color32::WHITE),
        TextElementKind::Narrative => (2.0, NARRATIVE_FILL),
    };
    painter.rect_filled(rect, rounding, fill);
    painter.rect_stroke(
        rect,
        rounding,
        egui::Stroke::new(1.5, BUBBLE_OUTLINE.to_egui()),
        egui::StrokeKind::Inside,
    );
    if selected {
        painter.rect_stroke(
            rect.expand(3.0),
            rounding,
            egui::Stroke::new(2.0, SELECTION),
            egui::StrokeKind::Outside,
        );
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

struct AnnotateApp {
    image_path: PathBuf,
    texture: Option<egui::TextureHandle>,
    image_size: (f32, f32),
    raw_image: Option<DynamicImage>,

    engine: AnnotationEngine,
    color: [f32; 3],
    focus_pin_editor: bool,

    elements: Vec<TextElement>,
    overlay: TextOverlay,
    layout: MeasuredLayout,
    focus_element_editor: bool,

    status: Option<String>,

    // pan & zoom
    pan: Vec2,
    zoom: f32,
    panning: bool,
}

impl AnnotateApp {
    fn new(image_path: PathBuf, config: EngineConfig, elements: Vec<TextElement>) -> Self {
        let raw_image = match image_path.load() {
            Ok(img) => Some(img),
            Err(e) => {
                warn!("{}", e);
                None
            }
        };
        let image_size = raw_image
            .as_ref()
            .map(|img| (img.width() as f32, img.height() as f32))
            .unwrap_or((config.logical_width, config.logical_height));

        let overlay = TextOverlay::new(&config);
        let engine = AnnotationEngine::new(config);
        let [r, g, b, _] = engine.color().to_rgba8().map(|c| c as f32 / 255.0);

        Self {
            image_path,
            texture: None,
            image_size,
            raw_image,
            engine,
            color: [r, g, b],
            focus_pin_editor: false,
            elements,
            overlay,
            layout: MeasuredLayout::default(),
            focus_element_editor: false,
            status: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            panning: false,
        }
    }

    /// The image fitted into the canvas, then panned and zoomed.
    fn image_rect_on_screen(&self, canvas_rect: Rect) -> Rect {
        let (w, h) = self.image_size;
        let fit = (canvas_rect.width() / w).min(canvas_rect.height() / h);
        Rect::from_center_size(
            canvas_rect.center() + self.pan,
            vec2(w, h) * fit * self.zoom,
        )
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(ref img) = self.raw_image {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture = Some(ctx.load_texture(
                "image",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }
    }

    fn export(&mut self, include_annotations: bool) {
        let stem = self
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let Some(target) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(format!("{stem}_annotated.png"))
            .save_file()
        else {
            return;
        };

        let Some(bytes) = self
            .engine
            .get_composited_image(self.image_path.as_path(), include_annotations)
        else {
            self.status = Some("Export failed, see log".into());
            return;
        };
        match std::fs::write(&target, bytes) {
            Ok(()) => {
                info!("Exported to {:?}", target);
                self.status = Some(format!("Saved {}", target.display()));
            }
            Err(e) => {
                warn!("Cannot write {:?}: {}", target, e);
                self.status = Some(format!("Cannot write {}", target.display()));
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        let (undo, export, delete) = ctx.input(|i| {
            (
                i.modifiers.command && i.key_pressed(egui::Key::Z),
                i.modifiers.command && i.key_pressed(egui::Key::S),
                i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace),
            )
        });

        if undo && !typing {
            self.engine.undo();
        }
        if export {
            self.export(true);
        }
        if delete {
            if !typing && self.overlay.selected().is_some() {
                if let Some(edit) = self.overlay.delete_selected() {
                    apply_overlay_edit(&mut self.elements, &edit);
                }
            } else {
                let focus = if typing {
                    KeyFocus::TextInput
                } else {
                    KeyFocus::Canvas
                };
                self.engine.key_down(Key::Delete, focus);
            }
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let mut tool = self.engine.tool();
                ui.selectable_value(&mut tool, None, "Select");
                ui.selectable_value(&mut tool, Some(Tool::Arrow), "Arrow");
                ui.selectable_value(&mut tool, Some(Tool::Rectangle), "Rectangle");
                ui.selectable_value(&mut tool, Some(Tool::Circle), "Circle");
                ui.selectable_value(&mut tool, Some(Tool::Text), "Text");
                if tool != self.engine.tool() {
                    self.engine.set_tool(tool);
                }
                ui.separator();
                ui.label("Color:");
                if ui.color_edit_button_rgb(&mut self.color).changed() {
                    let [r, g, b] = self.color;
                    self.engine.set_color(Color4::rgb(r, g, b));
                }
                ui.separator();
                if ui
                    .add_enabled(!self.engine.history().is_empty(), egui::Button::new("Undo"))
                    .clicked()
                {
                    self.engine.undo();
                }
                if ui.button("Clear").clicked() {
                    self.engine.clear();
                }
                if ui
                    .add_enabled(self.engine.selected().is_some(), egui::Button::new("Delete"))
                    .clicked()
                {
                    self.engine.delete_selected();
                }
                ui.separator();
                if ui.button("Export").clicked() {
                    self.export(true);
                }
                if ui.button("Export image only").clicked() {
                    self.export(false);
                }
                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.zoom * 100.0));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
    }

    fn handle_pan_zoom(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let canvas_rect = response.rect;

        // Middle mouse button pans.
        let middle_down = ctx.input(|i| i.pointer.middle_down());
        if middle_down {
            self.pan += ctx.input(|i| i.pointer.delta());
            self.panning = true;
        } else {
            self.panning = false;
        }

        let scroll_delta = ctx.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta != 0.0 && response.hovered() {
            let zoom_factor = 1.0 + scroll_delta * 0.002;
            let new_zoom = (self.zoom * zoom_factor).clamp(0.1, 10.0);
            if let Some(cursor) = response.hover_pos() {
                let cursor_rel = cursor - canvas_rect.center() - self.pan;
                self.pan -= cursor_rel * (new_zoom / self.zoom - 1.0);
            }
            self.zoom = new_zoom;
        }
    }

    /// Forward primary-button pointer events to the engine.
    fn handle_canvas_pointer(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        view: CanvasView,
    ) {
        if self.panning {
            return;
        }
        let (pressed, released, latest) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
            )
        });
        let Some(pos) = latest else {
            return;
        };
        let inside = view.rect.contains(pos);

        if pressed && response.hovered() && inside {
            let before = self.engine.active();
            let pointer_ctx = PointerContext {
                external_editor_focused: self.overlay.is_editing(),
            };
            if self.engine.pointer_down(view.to_logical(pos), pointer_ctx)
                == PointerResponse::Consumed
            {
                self.overlay.select(None);
                let active = self.engine.active();
                if active.is_some() && active != before {
                    self.focus_pin_editor = true;
                }
            }
        }

        let gesture = self.engine.state() != InteractionState::Idle;
        if gesture && !inside {
            self.engine.pointer_leave();
            return;
        }
        if response.hovered() || gesture {
            let cursor = self.engine.pointer_move(view.to_logical(pos));
            if response.hovered() {
                ctx.set_cursor_icon(cursor_icon(cursor));
            }
        }
        if released {
            self.engine.pointer_up();
        }
    }

    /// Inline editor for the active text pin, floating next to it.
    fn pin_editor(&mut self, ctx: &egui::Context, view: CanvasView) {
        let Some(id) = self.engine.active() else {
            return;
        };
        let Some(pin) = self.engine.store().get(id) else {
            return;
        };
        let radius = view.len_to_screen(self.engine.config().pin_radius);
        let at = view.to_screen(pin.origin()) - vec2(radius, 0.0);
        let color = pin.color.to_egui();
        let number = self.engine.store().pin_number(id).unwrap_or_default();

        let request_focus = std::mem::take(&mut self.focus_pin_editor);
        let engine = &mut self.engine;
        let mut closed = false;
        egui::Area::new(egui::Id::new(("pin_editor", id.0)))
            .fixed_pos(at)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(format!("Note {number}"))
                            .color(color)
                            .strong(),
                    );
                    let Some(text) = engine.active_text_mut() else {
                        return;
                    };
                    let te = ui.add(
                        egui::TextEdit::multiline(text)
                            .desired_rows(3)
                            .desired_width(PIN_EDITOR_WIDTH)
                            .hint_text("Type a note"),
                    );
                    if request_focus {
                        te.request_focus();
                    }
                    closed = te.lost_focus();
                });
            });

        if closed {
            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                engine.key_down(Key::Escape, KeyFocus::PinEditor);
            } else {
                engine.commit_active_annotation();
            }
        }
    }

    /// Speech, thought and narration boxes, plus the anchor handle of the
    /// selected dialogue bubble.
    fn text_elements(&mut self, ctx: &egui::Context, view: CanvasView) {
        let scale = DisplayScale::new(view.rect.size(), view.logical);
        let s = view.scale();
        let box_size = self.overlay.box_size();
        let box_screen = vec2(box_size.x * s.x, box_size.y * s.y);
        let font = egui::FontId::proportional(view.len_to_screen(ELEMENT_FONT_SIZE).max(6.0));
        let padding = view.len_to_screen(ELEMENT_PADDING);

        // The open editor grows with its content.
        let editor_screen = self.overlay.edit_buffer().map(|buffer| {
            let galley = ctx.fonts(|f| {
                f.layout(
                    buffer.to_owned(),
                    font.clone(),
                    BUBBLE_OUTLINE.to_egui(),
                    box_screen.x - 2.0 * padding,
                )
            });
            let grown = self
                .overlay
                .editor_size(galley.size().y / s.y, ELEMENT_PADDING);
            vec2(grown.x * s.x, grown.y * s.y)
        });
        let pointer = ctx.input(|i| i.pointer.interact_pos());

        let elements = &self.elements;
        let overlay = &mut self.overlay;
        let layout = &mut self.layout;
        let focus_editor = &mut self.focus_element_editor;
        let mut edits = Vec::new();

        for element in elements {
            let selected = overlay.selected() == Some(element.id.as_str());
            let editing = overlay.editing() == Some(element.id.as_str());

            egui::Area::new(egui::Id::new(("text_element", element.id.as_str())))
                .fixed_pos(view.to_screen(element.pos()))
                .order(egui::Order::Middle)
                .show(ctx, |ui| {
                    let size = match editor_screen {
                        Some(grown) if editing => grown,
                        _ => box_screen,
                    };
                    let (rect, response) =
                        ui.allocate_exact_size(size, egui::Sense::click_and_drag());
                    paint_bubble(ui.painter(), rect, element.kind, selected);
                    let inner = rect.shrink(padding);

                    if editing {
                        if let Some(buffer) = overlay.edit_buffer_mut() {
                            let te = ui.put(
                                inner,
                                egui::TextEdit::multiline(buffer)
                                    .frame(false)
                                    .desired_rows(1)
                                    .desired_width(inner.width())
                                    .font(font.clone()),
                            );
                            if std::mem::take(focus_editor) {
                                te.request_focus();
                            }
                            if te.lost_focus() {
                                edits.extend(overlay.commit_edit());
                            }
                        }
                    } else {
                        let text_color = BUBBLE_OUTLINE.to_egui();
                        let galley = ui.painter().layout(
                            element.text.clone(),
                            font.clone(),
                            text_color,
                            inner.width(),
                        );
                        ui.painter().galley(inner.min, galley, text_color);
                    }

                    if response.drag_started() {
                        if let Some(p) = pointer {
                            overlay.begin_drag(&element.id, p);
                        }
                    } else if response.dragged() {
                        if let Some(p) = pointer {
                            edits.extend(overlay.drag_to(p, scale, elements));
                        }
                    }
                    if response.drag_stopped() {
                        overlay.end_drag();
                    }
                    if response.clicked() {
                        overlay.select(Some(&element.id));
                    }
                    if response.double_clicked() {
                        overlay.begin_edit(element);
                        *focus_editor = true;
                    }
                    if response.hovered() && !editing {
                        ctx.set_cursor_icon(egui::CursorIcon::Move);
                    }

                    if selected && !editing {
                        let close = Rect::from_min_size(
                            rect.right_top() + vec2(-24.0, 4.0),
                            vec2(20.0, 20.0),
                        );
                        if ui.put(close, egui::Button::new("✕").small()).clicked() {
                            edits.extend(overlay.delete_selected());
                        }
                    }

                    layout.record(element.id.clone(), view.rect_to_logical(rect));
                });

            if !(selected && element.has_draggable_anchor()) {
                continue;
            }
            let Some(anchor) = element.anchor else {
                continue;
            };
            let half = ANCHOR_HANDLE_SIZE / 2.0;
            egui::Area::new(egui::Id::new(("anchor", element.id.as_str())))
                .fixed_pos(view.to_screen(anchor.pos()) - vec2(half, half))
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    let (rect, response) = ui.allocate_exact_size(
                        vec2(ANCHOR_HANDLE_SIZE, ANCHOR_HANDLE_SIZE),
                        egui::Sense::drag(),
                    );
                    ui.painter().circle(
                        rect.center(),
                        half,
                        SELECTION,
                        egui::Stroke::new(1.5, egui::Color32::WHITE),
                    );
                    if response.drag_started() {
                        if let Some(p) = pointer {
                            overlay.begin_anchor_drag(element, p);
                        }
                    } else if response.dragged() {
                        if let Some(p) = pointer {
                            edits.extend(overlay.drag_to(p, scale, elements));
                        }
                    }
                    if response.drag_stopped() {
                        overlay.end_drag();
                    }
                    if response.hovered() {
                        ctx.set_cursor_icon(egui::CursorIcon::Grab);
                    }
                });
        }

        for edit in &edits {
            apply_overlay_edit(&mut self.elements, edit);
        }
        self.layout
            .retain_ids(self.elements.iter().map(|e| e.id.as_str()));
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);
        self.handle_shortcuts(ctx);
        self.toolbar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            self.handle_pan_zoom(ctx, &response);
            let view = CanvasView {
                rect: self.image_rect_on_screen(canvas_rect),
                logical: self.engine.config().logical_size(),
            };

            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    view.rect,
                    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            // Annotations and bubble connectors share the canvas painter,
            // clipped to the image.
            let clipped = painter.with_clip_rect(view.rect.intersect(canvas_rect));
            let mut surface = PainterSurface {
                painter: &clipped,
                view,
            };
            self.engine.render(&mut surface);
            let connectors = bubble::compute_connectors(
                &self.elements,
                &self.layout,
                &self.engine.config().bubble,
            );
            render::render_connectors(&connectors, &mut surface, Color4::WHITE, BUBBLE_OUTLINE);

            self.handle_canvas_pointer(ctx, &response, view);
            self.pin_editor(ctx, view);
            self.text_elements(ctx, view);
        });
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

struct Args {
    image: PathBuf,
    elements: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut image = None;
    let mut elements = None;
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--elements" => {
                elements = Some(PathBuf::from(args.next().ok_or("--elements needs a path")?));
            }
            "--config" => {
                config = Some(PathBuf::from(args.next().ok_or("--config needs a path")?));
            }
            _ if image.is_none() => image = Some(PathBuf::from(arg)),
            other => return Err(format!("Unexpected argument: {other}")),
        }
    }
    Ok(Args {
        image: image.ok_or("Missing image path")?,
        elements,
        config,
    })
}

fn load_elements(path: &Path) -> Vec<TextElement> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|data| parse_elements(&data).map_err(|e| e.to_string()));
    match parsed {
        Ok(elements) => {
            info!("Loaded {} text elements from {:?}", elements.len(), path);
            elements
        }
        Err(e) => {
            warn!("Cannot load text elements from {:?}: {}", path, e);
            Vec::new()
        }
    }
}

fn main() -> eframe::Result {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bubble_annotate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            std::process::exit(1);
        }
    };
    if !args.image.exists() {
        eprintln!("File not found: {}", args.image.display());
        std::process::exit(1);
    }

    let config = match &args.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };
    let elements = args
        .elements
        .as_deref()
        .map(load_elements)
        .unwrap_or_default();

    let title = format!(
        "bubble-annotate: {}",
        args.image
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotateApp::new(args.image, config, elements)))),
    )
}
