//! Text elements loaded from a pipeline layout, edited through the overlay
//! and connected to their subjects.

use assert_matches::assert_matches;
use bubble_annotate::bubble::{compute_connectors, ConnectorShape, FixedBoxLayout, MeasuredLayout};
use bubble_annotate::overlay::{apply_overlay_edit, parse_elements, DisplayScale, OverlayEdit};
use bubble_annotate::{EngineConfig, TextElement, TextElementKind, TextOverlay};
use egui::{pos2, vec2, Rect};

const LAYOUT: &str = r#"[
    {"id": "speech", "x": 100, "y": 80, "type": "dialogue", "text": "Over here!",
     "anchor": {"x": 600, "y": 500}},
    {"id": "idea", "x": 600, "y": 60, "type": "thoughts", "text": "Hmm",
     "anchor": {"x": 700, "y": 400}},
    {"id": "caption", "x": 20, "y": 900, "type": "narrative", "text": "Meanwhile"}
]"#;

fn elements() -> Vec<TextElement> {
    parse_elements(LAYOUT).expect("layout parses")
}

fn fixed(elements: &[TextElement]) -> FixedBoxLayout<'_> {
    FixedBoxLayout {
        elements,
        size: vec2(250.0, 100.0),
    }
}

#[test]
fn layout_yields_one_connector_per_anchored_bubble() {
    let elements = elements();
    assert_eq!(elements[2].kind, TextElementKind::Narrative);
    assert_eq!(elements[2].anchor, None);

    let config = EngineConfig::default();
    let connectors = compute_connectors(&elements, &fixed(&elements), &config.bubble);

    assert_eq!(connectors.len(), 2);
    assert_eq!(connectors[0].id, "speech");
    assert_matches!(connectors[0].shape, ConnectorShape::Tail(tail) if tail.tip == pos2(600.0, 500.0));
    assert_eq!(connectors[1].id, "idea");
    assert_matches!(connectors[1].shape, ConnectorShape::Trail(_));
}

#[test]
fn tail_disappears_when_anchor_sits_on_the_bubble_centre() {
    let mut elements = elements();
    apply_overlay_edit(
        &mut elements,
        &OverlayEdit::MoveAnchor {
            id: "speech".into(),
            x: 228.0,
            y: 132.0,
        },
    );

    let config = EngineConfig::default();
    let connectors = compute_connectors(&elements, &fixed(&elements), &config.bubble);
    assert!(connectors.iter().all(|c| c.id != "speech"));
}

#[test]
fn measured_rects_override_stored_positions() {
    let elements = elements();
    let mut layout = MeasuredLayout::default();
    // The renderer wrapped "speech" into a taller box than the stored one,
    // which moves the exit point onto its right edge.
    layout.record(
        "speech",
        Rect::from_min_size(pos2(100.0, 80.0), vec2(250.0, 300.0)),
    );

    let config = EngineConfig::default();
    let connectors = compute_connectors(&elements, &layout, &config.bubble);

    assert_eq!(connectors.len(), 1, "unmeasured elements get no connector");
    assert_matches!(connectors[0].shape, ConnectorShape::Tail(tail) => {
        assert!(tail.base.iter().all(|p| (p.x - 350.0).abs() < 1e-3));
    });
}

#[test]
fn dragging_a_bubble_on_a_shrunken_display() {
    let config = EngineConfig::default();
    let mut overlay = TextOverlay::new(&config);
    let mut elements = elements();
    let scale = DisplayScale::new(vec2(256.0, 256.0), config.logical_size());

    overlay.begin_drag("speech", pos2(50.0, 50.0));
    for screen in [pos2(60.0, 50.0), pos2(70.0, 60.0)] {
        let edit = overlay
            .drag_to(screen, scale, &elements)
            .expect("drag produces a move");
        apply_overlay_edit(&mut elements, &edit);
    }
    overlay.end_drag();

    // 20x10 screen pixels at quarter size is 80x40 logical.
    assert_eq!(elements[0].pos(), pos2(180.0, 120.0));
    assert_eq!(overlay.selected(), Some("speech"));
    assert!(!overlay.is_dragging());
}

#[test]
fn retext_and_delete_flow() {
    let config = EngineConfig::default();
    let mut overlay = TextOverlay::new(&config);
    let mut elements = elements();

    overlay.begin_edit(&elements[1]);
    assert!(overlay.is_editing());
    if let Some(buffer) = overlay.edit_buffer_mut() {
        buffer.push_str("...");
    }
    let edit = overlay.commit_edit().expect("text changed");
    apply_overlay_edit(&mut elements, &edit);
    assert_eq!(elements[1].text, "Hmm...");

    let delete = overlay.delete_selected().expect("idea is selected");
    apply_overlay_edit(&mut elements, &delete);
    assert_eq!(elements.len(), 2);
    assert!(elements.iter().all(|e| e.id != "idea"));
    assert_eq!(overlay.selected(), None);
}
