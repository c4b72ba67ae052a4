//! Surface-agnostic annotation renderer.
//!
//! The same drawing code feeds the on-screen painter and the raster layer
//! used for export; each backend implements [`Surface`].

mod raster;

pub use raster::RasterSurface;

use egui::{pos2, vec2, Pos2, Rect};

use crate::annotation::{AnnotationKind, Color4};
use crate::bubble::{Connector, ConnectorShape};
use crate::config::EngineConfig;
use crate::geometry;
use crate::store::AnnotationStore;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: Color4,
    /// Dash length; gaps are the same length.
    pub dash: Option<f32>,
}

impl StrokeStyle {
    pub fn solid(width: f32, color: Color4) -> Self {
        Self {
            width,
            color,
            dash: None,
        }
    }

    pub fn dashed(width: f32, color: Color4, dash: f32) -> Self {
        Self {
            width,
            color,
            dash: Some(dash),
        }
    }
}

/// A 2D drawing target addressed in logical canvas coordinates.
pub trait Surface {
    fn clear(&mut self);
    fn line(&mut self, from: Pos2, to: Pos2, stroke: StrokeStyle);
    fn fill_polygon(&mut self, points: &[Pos2], color: Color4);
    fn fill_rect(&mut self, rect: Rect, color: Color4);
    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color4);
    fn stroke_circle(&mut self, center: Pos2, radius: f32, stroke: StrokeStyle);
    fn stroke_ellipse(&mut self, rect: Rect, stroke: StrokeStyle);
    /// Draw `text` centred on `center`, `size` units tall.
    fn text_centered(&mut self, center: Pos2, text: &str, size: f32, color: Color4);

    fn stroke_rect(&mut self, rect: Rect, stroke: StrokeStyle) {
        let corners = [
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
        ];
        for i in 0..4 {
            self.line(corners[i], corners[(i + 1) % 4], stroke);
        }
    }
}

const PIN_RING_WIDTH: f32 = 2.0;
const SELECTION_RING_GAP: f32 = 4.0;
const SELECTION_DASH: f32 = 4.0;
const SELECTION_STROKE_WIDTH: f32 = 1.5;

/// Arrowhead tips for a shaft ending at `end`, each edge `angle` radians
/// off the reversed shaft direction.
pub fn arrowhead(start: Pos2, end: Pos2, length: f32, angle: f32) -> [Pos2; 2] {
    let heading = (end.y - start.y).atan2(end.x - start.x);
    [heading - angle, heading + angle]
        .map(|a| pos2(end.x - length * a.cos(), end.y - length * a.sin()))
}

/// Clear `surface` and redraw every annotation in insertion order, then
/// the selection affordance. The pin being edited is left to its editor.
pub fn render_annotations(
    store: &AnnotationStore,
    config: &EngineConfig,
    surface: &mut impl Surface,
) {
    surface.clear();

    let mut pin_rank = 0;
    for annotation in store.annotations() {
        let stroke = StrokeStyle::solid(config.stroke_width, annotation.color);
        match &annotation.kind {
            AnnotationKind::Rectangle { .. } => surface.stroke_rect(annotation.bounds(), stroke),
            AnnotationKind::Circle { .. } => surface.stroke_ellipse(annotation.bounds(), stroke),
            AnnotationKind::Arrow { points, .. } => {
                let start = pos2(points[0], points[1]);
                let end = pos2(points[2], points[3]);
                surface.line(start, end, stroke);
                let [left, right] =
                    arrowhead(start, end, config.arrowhead_length, config.arrowhead_angle());
                surface.fill_polygon(&[end, left, right], annotation.color);
            }
            AnnotationKind::TextPin { .. } => {
                pin_rank += 1;
                if store.active() == Some(annotation.id) {
                    continue;
                }
                let center = annotation.origin();
                surface.fill_circle(center, config.pin_radius, annotation.color);
                surface.stroke_circle(
                    center,
                    config.pin_radius,
                    StrokeStyle::solid(PIN_RING_WIDTH, Color4::WHITE),
                );
                surface.text_centered(
                    center,
                    &pin_rank.to_string(),
                    config.pin_radius,
                    Color4::WHITE,
                );
            }
        }
    }

    if let Some(selected) = store.selected_annotation() {
        let color = config.selection_color;
        if selected.is_text_pin() {
            surface.stroke_circle(
                selected.origin(),
                config.pin_radius + SELECTION_RING_GAP,
                StrokeStyle::dashed(SELECTION_STROKE_WIDTH, color, SELECTION_DASH),
            );
        } else {
            surface.stroke_rect(
                selected.bounds(),
                StrokeStyle::solid(SELECTION_STROKE_WIDTH, color),
            );
            let size = vec2(config.handle_size, config.handle_size);
            for (_, at) in geometry::resize_handles(selected) {
                surface.fill_rect(Rect::from_center_size(at, size), color);
            }
        }
    }
}

/// Draw dialogue tails and thought trails. `fill` is the bubble colour,
/// `outline` its border.
pub fn render_connectors(
    connectors: &[Connector],
    surface: &mut impl Surface,
    fill: Color4,
    outline: Color4,
) {
    for connector in connectors {
        match &connector.shape {
            ConnectorShape::Tail(tail) => {
                let points = tail.points();
                surface.fill_polygon(&points, fill);
                surface.line(points[0], points[1], StrokeStyle::solid(1.5, outline));
                surface.line(points[1], points[2], StrokeStyle::solid(1.5, outline));
            }
            ConnectorShape::Trail(trail) => {
                for bubble in &trail.circles {
                    surface.fill_circle(bubble.center, bubble.radius, fill);
                    surface.stroke_circle(
                        bubble.center,
                        bubble.radius,
                        StrokeStyle::dashed(1.5, outline, 3.0),
                    );
                }
            }
        }
    }
}
