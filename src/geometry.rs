//! Hit-testing and handle geometry. Pure functions over logical coordinates.

use egui::{pos2, Pos2};

use crate::annotation::{Annotation, AnnotationKind};
use crate::config::EngineConfig;

/// Named grab points on a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    Start,
    End,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Pointer affordance shown over the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorKind {
    Default,
    Crosshair,
    Text,
    Move,
    Grab,
    /// Top-left / bottom-right diagonal.
    NwseResize,
    /// Top-right / bottom-left diagonal.
    NeswResize,
}

impl Handle {
    pub fn cursor(self) -> CursorKind {
        match self {
            Handle::Start | Handle::End => CursorKind::Grab,
            Handle::TopLeft | Handle::BottomRight => CursorKind::NwseResize,
            Handle::TopRight | Handle::BottomLeft => CursorKind::NeswResize,
        }
    }
}

/// Distance from `p` to the segment `a..b`, projecting onto the segment.
pub fn point_to_segment_dist(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq < f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

pub fn is_point_in_shape(point: Pos2, annotation: &Annotation, config: &EngineConfig) -> bool {
    match &annotation.kind {
        AnnotationKind::TextPin { .. } => point.distance(annotation.origin()) < config.pin_radius,
        AnnotationKind::Arrow { points, .. } => {
            let a = pos2(points[0], points[1]);
            let b = pos2(points[2], points[3]);
            let buffer = config.arrow_bbox_buffer;
            let in_box = point.x >= a.x.min(b.x) - buffer
                && point.x <= a.x.max(b.x) + buffer
                && point.y >= a.y.min(b.y) - buffer
                && point.y <= a.y.max(b.y) + buffer;
            in_box && point_to_segment_dist(point, a, b) < config.arrow_hit_threshold
        }
        // Circles hit-test against their bounding box, not the ellipse.
        AnnotationKind::Rectangle { .. } | AnnotationKind::Circle { .. } => {
            let bounds = annotation.bounds();
            point.x >= bounds.min.x
                && point.x <= bounds.max.x
                && point.y >= bounds.min.y
                && point.y <= bounds.max.y
        }
    }
}

/// Handles of a shape: the raw endpoints for arrows, the four box
/// corners otherwise. Text pins have none.
pub fn resize_handles(annotation: &Annotation) -> Vec<(Handle, Pos2)> {
    match annotation.kind {
        AnnotationKind::TextPin { .. } => Vec::new(),
        AnnotationKind::Arrow { points, .. } => vec![
            (Handle::Start, pos2(points[0], points[1])),
            (Handle::End, pos2(points[2], points[3])),
        ],
        AnnotationKind::Rectangle { width, height } | AnnotationKind::Circle { width, height } => {
            let (x, y) = (annotation.x, annotation.y);
            vec![
                (Handle::TopLeft, pos2(x, y)),
                (Handle::TopRight, pos2(x + width, y)),
                (Handle::BottomLeft, pos2(x, y + height)),
                (Handle::BottomRight, pos2(x + width, y + height)),
            ]
        }
    }
}

/// The handle under `point`, if any, within half the handle size.
pub fn handle_at(point: Pos2, annotation: &Annotation, config: &EngineConfig) -> Option<Handle> {
    let reach = config.handle_size / 2.0;
    resize_handles(annotation)
        .into_iter()
        .find(|(_, at)| (point.x - at.x).abs() <= reach && (point.y - at.y).abs() <= reach)
        .map(|(handle, _)| handle)
}

pub fn cursor_for_position(
    point: Pos2,
    annotation: &Annotation,
    config: &EngineConfig,
) -> Option<CursorKind> {
    if let Some(handle) = handle_at(point, annotation, config) {
        return Some(handle.cursor());
    }
    is_point_in_shape(point, annotation, config).then_some(CursorKind::Move)
}
