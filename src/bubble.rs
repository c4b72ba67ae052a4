//! Connector geometry between a text bubble and the subject it points at:
//! a triangular tail for dialogue, a trail of shrinking circles for
//! thoughts.

use std::collections::HashMap;

use egui::{pos2, Pos2, Rect, Vec2};

use crate::config::BubbleConfig;
use crate::overlay::{TextElement, TextElementKind};

/// Where a text element actually ended up on screen, in logical units.
pub trait LayoutMeasure {
    fn measure(&self, id: &str) -> Option<Rect>;
}

/// Rects recorded by whoever laid the elements out, keyed by element id.
#[derive(Clone, Debug, Default)]
pub struct MeasuredLayout {
    rects: HashMap<String, Rect>,
}

impl MeasuredLayout {
    pub fn record(&mut self, id: impl Into<String>, rect: Rect) {
        self.rects.insert(id.into(), rect);
    }

    /// Forget elements that no longer exist.
    pub fn retain_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: Vec<&str> = ids.into_iter().collect();
        self.rects.retain(|id, _| keep.contains(&id.as_str()));
    }
}

impl LayoutMeasure for MeasuredLayout {
    fn measure(&self, id: &str) -> Option<Rect> {
        self.rects.get(id).copied()
    }
}

/// Assumes every element occupies its fixed box at its stored position.
pub struct FixedBoxLayout<'a> {
    pub elements: &'a [TextElement],
    pub size: Vec2,
}

impl LayoutMeasure for FixedBoxLayout<'_> {
    fn measure(&self, id: &str) -> Option<Rect> {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| Rect::from_min_size(e.pos(), self.size))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DialogueTail {
    /// The two base points on the bubble edge.
    pub base: [Pos2; 2],
    pub tip: Pos2,
}

impl DialogueTail {
    pub fn points(&self) -> [Pos2; 3] {
        [self.base[0], self.tip, self.base[1]]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailCircle {
    pub center: Pos2,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThoughtTrail {
    pub circles: [TrailCircle; 2],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConnectorShape {
    Tail(DialogueTail),
    Trail(ThoughtTrail),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
    pub id: String,
    pub shape: ConnectorShape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Horizontal,
    Vertical,
}

/// Clamp that tolerates an empty range by collapsing to its middle.
fn clamp_span(v: f32, lo: f32, hi: f32) -> f32 {
    if lo > hi {
        (lo + hi) / 2.0
    } else {
        v.clamp(lo, hi)
    }
}

/// Where the ray from the rect's centre along `dir` leaves the rect.
fn rect_exit(rect: Rect, dir: Vec2) -> Option<(Pos2, Edge)> {
    let c = rect.center();
    let mut best: Option<(f32, Pos2, Edge)> = None;
    let mut consider = |t: f32, p: Pos2, edge: Edge| {
        if t > 0.0 && best.map_or(true, |(bt, _, _)| t < bt) {
            best = Some((t, p, edge));
        }
    };

    if dir.x != 0.0 {
        for x in [rect.min.x, rect.max.x] {
            let t = (x - c.x) / dir.x;
            let y = c.y + t * dir.y;
            if (rect.min.y..=rect.max.y).contains(&y) {
                consider(t, pos2(x, y), Edge::Vertical);
            }
        }
    }
    if dir.y != 0.0 {
        for y in [rect.min.y, rect.max.y] {
            let t = (y - c.y) / dir.y;
            let x = c.x + t * dir.x;
            if (rect.min.x..=rect.max.x).contains(&x) {
                consider(t, pos2(x, y), Edge::Horizontal);
            }
        }
    }
    best.map(|(_, p, edge)| (p, edge))
}

pub fn dialogue_tail(bubble: Rect, anchor: Pos2, config: &BubbleConfig) -> Option<DialogueTail> {
    let dir = anchor - bubble.center();
    if dir.length() < config.min_anchor_distance {
        return None;
    }
    let (exit, edge) = rect_exit(bubble, dir)?;

    let hw = config.tail_half_width;
    let m = config.tail_edge_margin;
    let base = match edge {
        Edge::Horizontal => {
            let (lo, hi) = (bubble.min.x + m, bubble.max.x - m);
            [
                pos2(clamp_span(exit.x - hw, lo, hi), exit.y),
                pos2(clamp_span(exit.x + hw, lo, hi), exit.y),
            ]
        }
        Edge::Vertical => {
            let (lo, hi) = (bubble.min.y + m, bubble.max.y - m);
            [
                pos2(exit.x, clamp_span(exit.y - hw, lo, hi)),
                pos2(exit.x, clamp_span(exit.y + hw, lo, hi)),
            ]
        }
    };
    Some(DialogueTail { base, tip: anchor })
}

/// Two circles walking out from the bubble, which is treated as an
/// ellipse with semi-axes of half the width and a fraction of the height.
pub fn thought_trail(bubble: Rect, anchor: Pos2, config: &BubbleConfig) -> Option<ThoughtTrail> {
    let center = bubble.center();
    let dir = anchor - center;
    let len = dir.length();
    let a = bubble.width() / 2.0;
    let b = bubble.height() * config.thought_vertical_ratio;
    if len < config.min_anchor_distance || a <= 0.0 || b <= 0.0 {
        return None;
    }

    let u = dir / len;
    let t = 1.0 / ((u.x / a).powi(2) + (u.y / b).powi(2)).sqrt();
    let exit = center + u * t;

    let [r0, r1] = config.thought_radii;
    let gap = config.thought_gap;
    let first = exit + u * (gap + r0);
    let second = first + u * (r0 + gap + r1);
    Some(ThoughtTrail {
        circles: [
            TrailCircle {
                center: first,
                radius: r0,
            },
            TrailCircle {
                center: second,
                radius: r1,
            },
        ],
    })
}

/// Connectors for every anchored dialogue/thought element that the layout
/// can measure.
pub fn compute_connectors(
    elements: &[TextElement],
    layout: &impl LayoutMeasure,
    config: &BubbleConfig,
) -> Vec<Connector> {
    elements
        .iter()
        .filter_map(|element| {
            let anchor = element.anchor?.pos();
            let rect = layout.measure(&element.id)?;
            let shape = match element.kind {
                TextElementKind::Dialogue => {
                    ConnectorShape::Tail(dialogue_tail(rect, anchor, config)?)
                }
                TextElementKind::Thoughts => {
                    ConnectorShape::Trail(thought_trail(rect, anchor, config)?)
                }
                TextElementKind::Narrative => return None,
            };
            Some(Connector {
                id: element.id.clone(),
                shape,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Anchor;
    use assert_matches::assert_matches;
    use egui::vec2;

    fn bubble() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(250.0, 100.0))
    }

    fn close(a: Pos2, b: Pos2) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn tail_exits_right_edge() {
        let tail = dialogue_tail(bubble(), pos2(400.0, 50.0), &BubbleConfig::default()).unwrap();
        assert!(close(tail.base[0], pos2(250.0, 40.0)));
        assert!(close(tail.base[1], pos2(250.0, 60.0)));
        assert_eq!(tail.tip, pos2(400.0, 50.0));
    }

    #[test]
    fn tail_exits_bottom_edge() {
        let tail = dialogue_tail(bubble(), pos2(125.0, 300.0), &BubbleConfig::default()).unwrap();
        assert!(close(tail.base[0], pos2(115.0, 100.0)));
        assert!(close(tail.base[1], pos2(135.0, 100.0)));
    }

    #[test]
    fn tail_base_stays_off_the_corner() {
        // Ray leaves the bottom edge at x = 248, just short of the corner.
        let tail = dialogue_tail(bubble(), pos2(371.0, 150.0), &BubbleConfig::default()).unwrap();
        assert!(close(tail.base[0], pos2(238.0, 100.0)));
        assert!(close(tail.base[1], pos2(245.0, 100.0)));
    }

    #[test]
    fn anchor_near_center_has_no_tail() {
        let config = BubbleConfig::default();
        assert_eq!(dialogue_tail(bubble(), pos2(130.0, 55.0), &config), None);
        assert_eq!(thought_trail(bubble(), pos2(125.0, 50.0), &config), None);
    }

    #[test]
    fn thought_trail_walks_outward() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 100.0));
        let trail = thought_trail(rect, pos2(100.0, 300.0), &BubbleConfig::default()).unwrap();

        let [first, second] = trail.circles;
        assert!(close(first.center, pos2(100.0, 104.0)));
        assert_eq!(first.radius, 10.0);
        assert!(close(second.center, pos2(100.0, 124.0)));
        assert_eq!(second.radius, 6.0);
    }

    #[test]
    fn connectors_follow_element_kind() {
        let anchor = Some(Anchor { x: 600.0, y: 600.0 });
        let elements = vec![
            TextElement {
                id: "d".into(),
                x: 0.0,
                y: 0.0,
                kind: TextElementKind::Dialogue,
                text: String::new(),
                anchor,
            },
            TextElement {
                id: "t".into(),
                x: 0.0,
                y: 0.0,
                kind: TextElementKind::Thoughts,
                text: String::new(),
                anchor,
            },
            TextElement {
                id: "n".into(),
                x: 0.0,
                y: 0.0,
                kind: TextElementKind::Narrative,
                text: String::new(),
                anchor,
            },
            TextElement {
                id: "loose".into(),
                x: 0.0,
                y: 0.0,
                kind: TextElementKind::Dialogue,
                text: String::new(),
                anchor: None,
            },
        ];
        let layout = FixedBoxLayout {
            elements: &elements,
            size: vec2(250.0, 100.0),
        };

        let connectors = compute_connectors(&elements, &layout, &BubbleConfig::default());
        assert_eq!(connectors.len(), 2);
        assert_matches!(connectors[0].shape, ConnectorShape::Tail(_));
        assert_matches!(connectors[1].shape, ConnectorShape::Trail(_));
    }

    #[test]
    fn measured_layout_prefers_recorded_rects() {
        let mut layout = MeasuredLayout::default();
        layout.record("a", bubble());
        layout.record("b", bubble());
        layout.retain_ids(["a"]);

        assert_eq!(layout.measure("a"), Some(bubble()));
        assert_eq!(layout.measure("b"), None);
    }
}
