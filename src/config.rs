//! Engine tunables, loadable from a JSON file.
//!
//! Every field carries a serde default so a partial file only overrides
//! what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::annotation::Color4;
use crate::error::{AnnotateError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width of the logical canvas every coordinate is stored in.
    pub logical_width: f32,
    /// Height of the logical canvas every coordinate is stored in.
    pub logical_height: f32,

    /// Radius of a text pin, both for drawing and hit-testing.
    pub pin_radius: f32,
    /// Max distance from an arrow's stroke that still counts as a hit.
    pub arrow_hit_threshold: f32,
    /// Slack added around an arrow's bounding box before hit-testing.
    pub arrow_bbox_buffer: f32,
    /// Side of the square resize handles.
    pub handle_size: f32,
    pub arrowhead_length: f32,
    /// Angle between the shaft and each arrowhead edge, in degrees.
    pub arrowhead_angle_deg: f32,
    pub stroke_width: f32,

    pub default_color: Color4,
    pub selection_color: Color4,

    pub text_box: TextBoxConfig,
    pub bubble: BubbleConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBoxConfig {
    pub width: f32,
    pub height: f32,
    /// Margin kept between a dragged box and the canvas edge.
    /// `None` lets boxes leave the canvas.
    pub clamp_margin: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    /// Half of the dialogue tail's base, measured along the exited edge.
    pub tail_half_width: f32,
    /// Tail base points stay this far inside the exited edge's ends.
    pub tail_edge_margin: f32,
    /// Anchors closer than this to the bubble centre draw no connector.
    pub min_anchor_distance: f32,
    /// Vertical semi-axis of the thought ellipse, as a fraction of height.
    pub thought_vertical_ratio: f32,
    pub thought_radii: [f32; 2],
    pub thought_gap: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logical_width: 1024.0,
            logical_height: 1024.0,
            pin_radius: 15.0,
            arrow_hit_threshold: 5.0,
            arrow_bbox_buffer: 5.0,
            handle_size: 8.0,
            arrowhead_length: 10.0,
            arrowhead_angle_deg: 30.0,
            stroke_width: 3.0,
            default_color: Color4::default(),
            selection_color: Color4::rgb(0.0, 120.0 / 255.0, 1.0),
            text_box: TextBoxConfig::default(),
            bubble: BubbleConfig::default(),
        }
    }
}

impl Default for TextBoxConfig {
    fn default() -> Self {
        Self {
            width: 250.0,
            height: 100.0,
            clamp_margin: Some(0.0),
        }
    }
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            tail_half_width: 10.0,
            tail_edge_margin: 5.0,
            min_anchor_distance: 10.0,
            thought_vertical_ratio: 0.4,
            thought_radii: [10.0, 6.0],
            thought_gap: 4.0,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| AnnotateError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&data).map_err(|source| AnnotateError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        info!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Like [`EngineConfig::load`], but any failure falls back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default engine config: {}", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.logical_width <= 0.0 || self.logical_height <= 0.0 {
            return Err(AnnotateError::InvalidConfig(format!(
                "logical canvas must be positive, got {}x{}",
                self.logical_width, self.logical_height
            )));
        }
        if self.pin_radius <= 0.0 || self.handle_size <= 0.0 {
            return Err(AnnotateError::InvalidConfig(
                "pin radius and handle size must be positive".into(),
            ));
        }
        if self.text_box.width <= 0.0 || self.text_box.height <= 0.0 {
            return Err(AnnotateError::InvalidConfig(
                "text box size must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn logical_size(&self) -> egui::Vec2 {
        egui::vec2(self.logical_width, self.logical_height)
    }

    pub fn arrowhead_angle(&self) -> f32 {
        self.arrowhead_angle_deg.to_radians()
    }
}
