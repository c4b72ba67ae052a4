use egui::{pos2, Pos2, Rect};
use serde::{Deserialize, Serialize};

use crate::geometry::Handle;

// ── Colour ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const WHITE: Color4 = Color4::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn to_egui(&self) -> egui::Color32 {
        let [r, g, b, a] = self.to_rgba8();
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }

    pub fn from_egui(c: egui::Color32) -> Self {
        let [r, g, b, a] = c.to_srgba_unmultiplied();
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

impl Default for Color4 {
    fn default() -> Self {
        Self::rgb(1.0, 0.0, 0.0)
    }
}

// ── Annotations ─────────────────────────────────────────────────────────────

/// Opaque identity of an annotation, stable across moves and undo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Arrow,
    Rectangle,
    Circle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationKind {
    TextPin {
        text: String,
    },
    /// `points` is `[x1, y1, x2, y2]` and is the authoritative geometry;
    /// the bounding box is derived from it on commit.
    Arrow {
        width: f32,
        height: f32,
        points: [f32; 4],
    },
    Rectangle {
        width: f32,
        height: f32,
    },
    Circle {
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub x: f32,
    pub y: f32,
    pub color: Color4,
    #[serde(flatten)]
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn text_pin(id: AnnotationId, at: Pos2, color: Color4) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            color,
            kind: AnnotationKind::TextPin {
                text: String::new(),
            },
        }
    }

    /// A zero-size shape anchored at `at`, ready to be rubber-banded.
    pub fn shape(id: AnnotationId, kind: ShapeKind, at: Pos2, color: Color4) -> Self {
        let kind = match kind {
            ShapeKind::Arrow => AnnotationKind::Arrow {
                width: 0.0,
                height: 0.0,
                points: [at.x, at.y, at.x, at.y],
            },
            ShapeKind::Rectangle => AnnotationKind::Rectangle {
                width: 0.0,
                height: 0.0,
            },
            ShapeKind::Circle => AnnotationKind::Circle {
                width: 0.0,
                height: 0.0,
            },
        };
        Self {
            id,
            x: at.x,
            y: at.y,
            color,
            kind,
        }
    }

    pub fn origin(&self) -> Pos2 {
        pos2(self.x, self.y)
    }

    pub fn is_text_pin(&self) -> bool {
        matches!(self.kind, AnnotationKind::TextPin { .. })
    }

    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self.kind {
            AnnotationKind::TextPin { .. } => None,
            AnnotationKind::Arrow { .. } => Some(ShapeKind::Arrow),
            AnnotationKind::Rectangle { .. } => Some(ShapeKind::Rectangle),
            AnnotationKind::Circle { .. } => Some(ShapeKind::Circle),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            AnnotationKind::TextPin { text } => Some(text),
            _ => None,
        }
    }

    /// Signed `(width, height)` of a shape; `None` for text pins.
    pub fn size(&self) -> Option<(f32, f32)> {
        match self.kind {
            AnnotationKind::TextPin { .. } => None,
            AnnotationKind::Arrow { width, height, .. }
            | AnnotationKind::Rectangle { width, height }
            | AnnotationKind::Circle { width, height } => Some((width, height)),
        }
    }

    pub fn set_size(&mut self, w: f32, h: f32) {
        match &mut self.kind {
            AnnotationKind::TextPin { .. } => {}
            AnnotationKind::Arrow { width, height, .. }
            | AnnotationKind::Rectangle { width, height }
            | AnnotationKind::Circle { width, height } => {
                *width = w;
                *height = h;
            }
        }
    }

    pub fn arrow_points(&self) -> Option<(Pos2, Pos2)> {
        match self.kind {
            AnnotationKind::Arrow { points, .. } => {
                Some((pos2(points[0], points[1]), pos2(points[2], points[3])))
            }
            _ => None,
        }
    }

    /// Normalised bounding box of a shape. Text pins yield an empty rect
    /// at their centre.
    pub fn bounds(&self) -> Rect {
        match self.size() {
            Some((w, h)) => Rect::from_two_pos(self.origin(), pos2(self.x + w, self.y + h)),
            None => Rect::from_min_max(self.origin(), self.origin()),
        }
    }

    /// Translate the annotation, keeping arrow endpoints in lockstep.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        if let AnnotationKind::Arrow { points, .. } = &mut self.kind {
            points[0] += dx;
            points[1] += dy;
            points[2] += dx;
            points[3] += dy;
        }
    }

    /// Drag one handle by `(dx, dy)`, leaving the opposite corner (or the
    /// other arrow endpoint) where it is.
    pub fn drag_handle(&mut self, handle: Handle, dx: f32, dy: f32) {
        match (&mut self.kind, handle) {
            (AnnotationKind::Arrow { points, .. }, Handle::Start) => {
                points[0] += dx;
                points[1] += dy;
            }
            (AnnotationKind::Arrow { points, .. }, Handle::End) => {
                points[2] += dx;
                points[3] += dy;
            }
            (
                AnnotationKind::Rectangle { width, height }
                | AnnotationKind::Circle { width, height },
                corner,
            ) => match corner {
                Handle::TopLeft => {
                    self.x += dx;
                    self.y += dy;
                    *width -= dx;
                    *height -= dy;
                }
                Handle::TopRight => {
                    self.y += dy;
                    *width += dx;
                    *height -= dy;
                }
                Handle::BottomLeft => {
                    self.x += dx;
                    *width -= dx;
                    *height += dy;
                }
                Handle::BottomRight => {
                    *width += dx;
                    *height += dy;
                }
                Handle::Start | Handle::End => {
                    unreachable!("arrow handle {corner:?} on a box shape")
                }
            },
            (kind, handle) => unreachable!("handle {handle:?} on {kind:?}"),
        }
        if self.shape_kind() == Some(ShapeKind::Arrow) {
            self.normalize();
        }
    }

    /// Bring a shape back to its committed form: non-negative size with
    /// `x, y` at the top-left, arrows re-deriving their box from `points`.
    pub fn normalize(&mut self) {
        match &mut self.kind {
            AnnotationKind::TextPin { .. } => {}
            AnnotationKind::Arrow {
                width,
                height,
                points,
            } => {
                let [x1, y1, x2, y2] = *points;
                self.x = x1.min(x2);
                self.y = y1.min(y2);
                *width = (x2 - x1).abs();
                *height = (y2 - y1).abs();
            }
            AnnotationKind::Rectangle { width, height }
            | AnnotationKind::Circle { width, height } => {
                if *width < 0.0 {
                    self.x += *width;
                    *width = -*width;
                }
                if *height < 0.0 {
                    self.y += *height;
                    *height = -*height;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_flips_negative_rectangle() {
        let mut rect = Annotation::shape(
            AnnotationId(1),
            ShapeKind::Rectangle,
            pos2(300.0, 300.0),
            Color4::default(),
        );
        rect.set_size(-200.0, -200.0);
        rect.normalize();

        assert_eq!((rect.x, rect.y), (100.0, 100.0));
        assert_eq!(rect.size(), Some((200.0, 200.0)));
    }

    #[test]
    fn normalize_derives_arrow_box_from_points() {
        let mut arrow = Annotation {
            id: AnnotationId(1),
            x: 0.0,
            y: 0.0,
            color: Color4::default(),
            kind: AnnotationKind::Arrow {
                width: -1.0,
                height: -1.0,
                points: [150.0, 20.0, 50.0, 80.0],
            },
        };
        arrow.normalize();

        assert_eq!((arrow.x, arrow.y), (50.0, 20.0));
        assert_eq!(arrow.size(), Some((100.0, 60.0)));
        assert_eq!(
            arrow.arrow_points(),
            Some((pos2(150.0, 20.0), pos2(50.0, 80.0)))
        );
    }

    #[test]
    fn translate_moves_arrow_points() {
        let mut arrow = Annotation::shape(
            AnnotationId(3),
            ShapeKind::Arrow,
            pos2(10.0, 10.0),
            Color4::default(),
        );
        arrow.translate(5.0, -2.0);

        assert_eq!(arrow.origin(), pos2(15.0, 8.0));
        assert_eq!(arrow.arrow_points(), Some((pos2(15.0, 8.0), pos2(15.0, 8.0))));
    }

    #[test]
    fn serializes_with_type_tag() {
        let pin = Annotation::text_pin(AnnotationId(7), pos2(1.0, 2.0), Color4::default());
        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["type"], "TextPin");
        assert_eq!(json["text"], "");

        let back: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, pin);
    }

    #[test]
    fn color_round_trips_through_egui() {
        let c = Color4::rgb(0.0, 1.0, 0.0);
        assert_eq!(Color4::from_egui(c.to_egui()), c);
    }
}
