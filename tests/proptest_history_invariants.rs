//! Property-based invariants for the annotation history under arbitrary
//! gesture sequences:
//!
//! 1. The history cursor stays within [-1, len - 1].
//! 2. Undoing `len` times always empties the annotation list.
//! 3. After a committed gesture the live list matches the current snapshot.

use bubble_annotate::{AnnotationEngine, Key, KeyFocus, PointerContext, Tool};
use egui::{pos2, Pos2};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    Draw { tool: Tool, from: Pos2, to: Pos2 },
    Drag { from: Pos2, to: Pos2 },
    Type(String),
    Delete,
    Undo,
    Clear,
}

fn point_strategy() -> impl Strategy<Value = Pos2> {
    (0.0f32..1024.0, 0.0f32..1024.0).prop_map(|(x, y)| pos2(x, y))
}

fn tool_strategy() -> impl Strategy<Value = Tool> {
    prop_oneof![
        Just(Tool::Arrow),
        Just(Tool::Rectangle),
        Just(Tool::Circle),
        Just(Tool::Text),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (tool_strategy(), point_strategy(), point_strategy())
            .prop_map(|(tool, from, to)| Op::Draw { tool, from, to }),
        2 => (point_strategy(), point_strategy()).prop_map(|(from, to)| Op::Drag { from, to }),
        1 => "[a-z ]{0,6}".prop_map(Op::Type),
        1 => Just(Op::Delete),
        2 => Just(Op::Undo),
        1 => Just(Op::Clear),
    ]
}

fn apply(engine: &mut AnnotationEngine, op: &Op) {
    match op {
        Op::Draw { tool, from, to } => {
            engine.set_tool(Some(*tool));
            engine.pointer_down(*from, PointerContext::default());
            engine.pointer_move(*to);
            engine.pointer_up();
        }
        Op::Drag { from, to } => {
            engine.set_tool(None);
            engine.pointer_down(*from, PointerContext::default());
            engine.pointer_move(*to);
            engine.pointer_up();
        }
        Op::Type(text) => engine.set_active_text(text.clone()),
        Op::Delete => {
            engine.key_down(Key::Delete, KeyFocus::Canvas);
        }
        Op::Undo => {
            engine.undo();
        }
        Op::Clear => engine.clear(),
    }
}

fn assert_cursor_in_range(engine: &AnnotationEngine) -> Result<(), TestCaseError> {
    let history = engine.history();
    let index = history.signed_index();
    prop_assert!(
        (-1..history.len() as isize).contains(&index),
        "history index {} out of range for len {}",
        index,
        history.len()
    );
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Cursor stays in range
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn history_index_stays_in_range(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut engine = AnnotationEngine::default();
        for op in &ops {
            apply(&mut engine, op);
            assert_cursor_in_range(&engine)?;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Undo len times empties the list
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn undo_len_times_empties(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut engine = AnnotationEngine::default();
        for op in &ops {
            apply(&mut engine, op);
        }

        let len = engine.history().len();
        for _ in 0..len {
            engine.undo();
            assert_cursor_in_range(&engine)?;
        }
        prop_assert!(engine.annotations().is_empty());
        prop_assert_eq!(engine.history().signed_index(), -1);
        prop_assert!(!engine.undo(), "undo on an empty history must be a no-op");
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Committed shapes are snapshotted
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn committed_shape_matches_snapshot(
        ops in prop::collection::vec(op_strategy(), 0..20),
        from in point_strategy(),
        to in point_strategy(),
    ) {
        let mut engine = AnnotationEngine::default();
        for op in &ops {
            apply(&mut engine, op);
        }
        engine.commit_active_annotation();

        apply(&mut engine, &Op::Draw { tool: Tool::Rectangle, from, to });
        let current = engine.history().current().map(<[_]>::to_vec);
        prop_assert_eq!(current.as_deref(), Some(engine.annotations()));

        let drawn = engine.annotations().last().and_then(|a| a.size());
        if let Some((w, h)) = drawn {
            prop_assert!(w >= 0.0 && h >= 0.0, "committed size must be normalised");
        }
    }
}
