//! Rendering module
//!
//! Games draw through the `Painter` trait in playfield coordinates
//! (900×540, y down). In the browser that is a Canvas2D context; natively
//! and in tests it is a recording `DisplayList`.

#[cfg(target_arch = "wasm32")]
pub mod canvas2d;
pub mod display_list;

#[cfg(target_arch = "wasm32")]
pub use canvas2d::Canvas2dPainter;
pub use display_list::{DisplayList, DrawCommand};

use glam::Vec2;

use crate::sim::collision::Rect;

/// RGBA, each channel in `[0, 1]`
pub type Color = [f32; 4];

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Immediate-mode 2D drawing surface
pub trait Painter {
    /// Start a frame: reset offset/glow and fill the whole playfield
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, width: f32);
    fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32);
    /// Closed outline through `points`
    fn polygon(&mut self, points: &[Vec2], color: Color, width: f32);
    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Color, align: TextAlign);
    /// Neon glow for subsequent shapes (`blur = 0` turns it off)
    fn set_glow(&mut self, blur: f32, color: Color);
    /// Translate subsequent drawing (screen shake)
    fn set_offset(&mut self, offset: Vec2);

    fn fill(&mut self, rect: &Rect, color: Color) {
        self.fill_rect(rect.x, rect.y, rect.w, rect.h, color);
    }
}

/// Same color with alpha scaled by `a`
#[inline]
pub fn fade(color: Color, a: f32) -> Color {
    [color[0], color[1], color[2], color[3] * a.clamp(0.0, 1.0)]
}

/// CSS `rgba()` string for a color
pub fn css(color: Color) -> String {
    format!(
        "rgba({},{},{},{:.3})",
        (color[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (color[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (color[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        color[3].clamp(0.0, 1.0)
    )
}

/// Neon palette shared by all games
pub mod colors {
    use super::Color;

    pub const BACKGROUND: Color = [0.02, 0.02, 0.07, 1.0];
    pub const GRID: Color = [0.25, 0.2, 0.5, 0.18];
    pub const TEXT: Color = [0.94, 0.96, 1.0, 1.0];
    pub const DIM: Color = [0.55, 0.6, 0.78, 1.0];
    pub const OVERLAY: Color = [0.0, 0.0, 0.0, 0.55];

    pub const CYAN: Color = [0.43, 1.0, 0.94, 1.0];
    pub const PINK: Color = [1.0, 0.345, 0.451, 1.0];
    pub const RED: Color = [1.0, 0.353, 0.478, 1.0];
    pub const GOLD: Color = [1.0, 0.906, 0.38, 1.0];
    pub const GREEN: Color = [0.42, 1.0, 0.55, 1.0];
    pub const PURPLE: Color = [0.72, 0.45, 1.0, 1.0];
    pub const ORANGE: Color = [1.0, 0.62, 0.25, 1.0];
    pub const BLUE: Color = [0.35, 0.6, 1.0, 1.0];

    /// Brick rows cycle through these
    pub const BRICK_ROWS: [Color; 6] = [PINK, ORANGE, GOLD, GREEN, CYAN, PURPLE];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css() {
        assert_eq!(css([1.0, 0.0, 0.5, 1.0]), "rgba(255,0,128,1.000)");
        assert_eq!(css([2.0, -1.0, 0.0, 0.25]), "rgba(255,0,0,0.250)");
    }

    #[test]
    fn test_fade() {
        assert_eq!(fade(colors::CYAN, 0.5)[3], 0.5);
        assert_eq!(fade(colors::CYAN, 3.0)[3], 1.0);
    }
}
