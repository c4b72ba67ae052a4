//! Annotation engine for marking up a generated image: arrows, boxes,
//! ellipses and numbered text pins drawn on a fixed logical canvas, plus
//! the speech/thought/narration overlay and a compositor that flattens
//! everything at the image's native resolution.

pub mod annotation;
pub mod bubble;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod history;
pub mod overlay;
pub mod render;
pub mod store;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, Color4, ShapeKind};
pub use config::EngineConfig;
pub use engine::{
    AnnotationEngine, InteractionState, Key, KeyFocus, PointerContext, PointerResponse, Tool,
};
pub use error::{AnnotateError, Result};
pub use overlay::{TextElement, TextElementKind, TextOverlay};
