use egui::{pos2, Pos2, Rect};
use image::{Pixel, Rgba, RgbaImage};

use super::{StrokeStyle, Surface};
use crate::annotation::Color4;
use crate::config::EngineConfig;

const ELLIPSE_SEGMENTS: usize = 64;

/// 3×5 bitmaps for pin numbers, one row per byte, high bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Transparent RGBA layer, one pixel per logical unit.
pub struct RasterSurface {
    img: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbaImage::new(width, height),
        }
    }

    pub fn for_config(config: &EngineConfig) -> Self {
        Self::new(
            config.logical_width.round().max(1.0) as u32,
            config.logical_height.round().max(1.0) as u32,
        )
    }

    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    pub fn into_image(self) -> RgbaImage {
        self.img
    }

    fn blend(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.img.width() as i32 || y >= self.img.height() as i32 {
            return;
        }
        self.img
            .get_pixel_mut(x as u32, y as u32)
            .blend(&Rgba(color));
    }

    /// Stamp a square brush along the segment, skipping dash gaps.
    fn stamp_line(&mut self, from: Pos2, to: Pos2, stroke: StrokeStyle) {
        let color = stroke.color.to_rgba8();
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len = (dx * dx + dy * dy).sqrt();
        let steps = (len * 2.0).ceil().max(1.0) as i32;
        let half_t = (stroke.width / 2.0).max(0.5) as i32;

        let mut last: Option<(i32, i32)> = None;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            if let Some(dash) = stroke.dash {
                if ((len * t) / dash) as i32 % 2 == 1 {
                    continue;
                }
            }
            let cx = (from.x + dx * t).round() as i32;
            let cy = (from.y + dy * t).round() as i32;
            if last == Some((cx, cy)) {
                continue;
            }
            last = Some((cx, cy));
            for oy in -half_t..=half_t {
                for ox in -half_t..=half_t {
                    self.blend(cx + ox, cy + oy, color);
                }
            }
        }
    }

    fn polyline(&mut self, points: &[Pos2], stroke: StrokeStyle) {
        // Dashes are measured along the whole outline, not per segment.
        let mut travelled = 0.0;
        for pair in points.windows(2) {
            let seg = pair[0].distance(pair[1]);
            let draw = match stroke.dash {
                Some(dash) => ((travelled + seg / 2.0) / dash) as i32 % 2 == 0,
                None => true,
            };
            if draw {
                self.stamp_line(pair[0], pair[1], StrokeStyle { dash: None, ..stroke });
            }
            travelled += seg;
        }
    }
}

fn ellipse_points(center: Pos2, rx: f32, ry: f32) -> Vec<Pos2> {
    (0..=ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = (i as f32 / ELLIPSE_SEGMENTS as f32) * std::f32::consts::TAU;
            pos2(center.x + rx * t.cos(), center.y + ry * t.sin())
        })
        .collect()
}

/// Even-odd point-in-polygon test.
fn polygon_contains(points: &[Pos2], p: Pos2) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl Surface for RasterSurface {
    fn clear(&mut self) {
        for pixel in self.img.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: StrokeStyle) {
        self.stamp_line(from, to, stroke);
    }

    fn fill_polygon(&mut self, points: &[Pos2], color: Color4) {
        if points.len() < 3 {
            return;
        }
        let bounds = Rect::from_points(points);
        let color = color.to_rgba8();
        for y in bounds.min.y.floor() as i32..=bounds.max.y.ceil() as i32 {
            for x in bounds.min.x.floor() as i32..=bounds.max.x.ceil() as i32 {
                if polygon_contains(points, pos2(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color4) {
        let color = color.to_rgba8();
        for y in rect.min.y.round() as i32..rect.max.y.round() as i32 {
            for x in rect.min.x.round() as i32..rect.max.x.round() as i32 {
                self.blend(x, y, color);
            }
        }
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Color4) {
        let color = color.to_rgba8();
        let r = radius.ceil() as i32;
        let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
        for oy in -r..=r {
            for ox in -r..=r {
                if ((ox * ox + oy * oy) as f32) <= radius * radius {
                    self.blend(cx + ox, cy + oy, color);
                }
            }
        }
    }

    fn stroke_circle(&mut self, center: Pos2, radius: f32, stroke: StrokeStyle) {
        self.polyline(&ellipse_points(center, radius, radius), stroke);
    }

    fn stroke_ellipse(&mut self, rect: Rect, stroke: StrokeStyle) {
        let points = ellipse_points(rect.center(), rect.width() / 2.0, rect.height() / 2.0);
        self.polyline(&points, stroke);
    }

    fn text_centered(&mut self, center: Pos2, text: &str, size: f32, color: Color4) {
        // Only digits have glyphs; anything else just advances.
        let scale = (size / 5.0).round().max(1.0) as i32;
        let advance = 4 * scale;
        let total_w = advance * text.chars().count() as i32 - scale;
        let left = center.x.round() as i32 - total_w / 2;
        let top = center.y.round() as i32 - (5 * scale) / 2;
        let color = color.to_rgba8();

        for (n, ch) in text.chars().enumerate() {
            let Some(glyph) = ch.to_digit(10).map(|d| DIGITS[d as usize]) else {
                continue;
            };
            let gx = left + n as i32 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if bits & (0b100 >> col) == 0 {
                        continue;
                    }
                    for sy in 0..scale {
                        for sx in 0..scale {
                            self.blend(
                                gx + col * scale + sx,
                                top + row as i32 * scale + sy,
                                color,
                            );
                        }
                    }
                }
            }
        }
    }
}
