//! Recording painter for native runs and tests

use glam::Vec2;

use super::{Color, Painter, TextAlign};

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Color },
    StrokeRect { x: f32, y: f32, w: f32, h: f32, color: Color },
    FillCircle { center: Vec2, radius: f32, color: Color },
    StrokeCircle { center: Vec2, radius: f32, color: Color },
    Line { from: Vec2, to: Vec2, color: Color },
    Polygon { points: Vec<Vec2>, color: Color },
    Text { text: String, pos: Vec2, size: f32, color: Color },
    Glow { blur: f32 },
    Offset(Vec2),
}

/// Painter that records the current frame. `clear` starts a new frame.
#[derive(Debug, Default)]
pub struct DisplayList {
    pub commands: Vec<DrawCommand>,
    frames: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames started so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// All text drawn this frame, joined by newlines
    pub fn text_dump(&self) -> String {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Painter for DisplayList {
    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.frames += 1;
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.commands.push(DrawCommand::FillRect { x, y, w, h, color });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, _width: f32) {
        self.commands.push(DrawCommand::StrokeRect { x, y, w, h, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, _width: f32) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, color });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, _width: f32) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn polygon(&mut self, points: &[Vec2], color: Color, _width: f32) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Color, _align: TextAlign) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            size,
            color,
        });
    }

    fn set_glow(&mut self, blur: f32, _color: Color) {
        self.commands.push(DrawCommand::Glow { blur });
    }

    fn set_offset(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Offset(offset));
    }
}
