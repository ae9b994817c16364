//! Canvas2D painter (browser only)

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Color, Painter, TextAlign, css};
use crate::consts::{HEIGHT, WIDTH};
use crate::{ArcadeError, Result};

/// Painter over a device-pixel-ratio scaled 2D context
pub struct Canvas2dPainter {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    scale: f64,
}

impl Canvas2dPainter {
    /// Size the canvas backing store for the display and grab its 2D context.
    ///
    /// Fails with `SurfaceUnavailable` if the element is missing or the
    /// browser refuses a 2D context; the caller must not start the run.
    pub fn attach(canvas_id: &str) -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ArcadeError::SurfaceUnavailable("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| ArcadeError::SurfaceUnavailable("no document".into()))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| ArcadeError::SurfaceUnavailable(format!("#{canvas_id} not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ArcadeError::SurfaceUnavailable(format!("#{canvas_id} is not a canvas")))?;

        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or_else(|| ArcadeError::SurfaceUnavailable("2d context refused".into()))?;

        let scale = window.device_pixel_ratio().max(1.0);
        canvas.set_width((WIDTH as f64 * scale) as u32);
        canvas.set_height((HEIGHT as f64 * scale) as u32);
        log::info!("Canvas ready at {}x dpr", scale);

        let painter = Self { canvas, ctx, scale };
        painter.apply_offset(Vec2::ZERO);
        Ok(painter)
    }

    /// Map client (CSS pixel) coordinates to playfield coordinates
    pub fn to_playfield(&self, client_x: f64, client_y: f64) -> Vec2 {
        let rect = self.canvas.get_bounding_client_rect();
        let w = rect.width().max(1.0);
        let h = rect.height().max(1.0);
        Vec2::new(
            ((client_x - rect.left()) * WIDTH as f64 / w) as f32,
            ((client_y - rect.top()) * HEIGHT as f64 / h) as f32,
        )
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn apply_offset(&self, offset: Vec2) {
        let s = self.scale;
        let _ = self
            .ctx
            .set_transform(s, 0.0, 0.0, s, offset.x as f64 * s, offset.y as f64 * s);
    }

    fn circle_path(&self, center: Vec2, radius: f32) {
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius.max(0.0) as f64,
            0.0,
            std::f64::consts::TAU,
        );
    }
}

impl Painter for Canvas2dPainter {
    fn clear(&mut self, color: Color) {
        self.apply_offset(Vec2::ZERO);
        self.ctx.set_shadow_blur(0.0);
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_rect(0.0, 0.0, WIDTH as f64, HEIGHT as f64);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color, width: f32) {
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ctx.set_fill_style_str(&css(color));
        self.circle_path(center, radius);
        self.ctx.fill();
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color, width: f32) {
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width as f64);
        self.circle_path(center, radius);
        self.ctx.stroke();
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(from.x as f64, from.y as f64);
        self.ctx.line_to(to.x as f64, to.y as f64);
        self.ctx.stroke();
    }

    fn polygon(&mut self, points: &[Vec2], color: Color, width: f32) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(first.x as f64, first.y as f64);
        for p in rest {
            self.ctx.line_to(p.x as f64, p.y as f64);
        }
        self.ctx.close_path();
        self.ctx.stroke();
    }

    fn text(&mut self, text: &str, pos: Vec2, size: f32, color: Color, align: TextAlign) {
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.set_font(&format!("700 {}px 'Courier New', monospace", size.round()));
        self.ctx.set_text_align(align.as_str());
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }

    fn set_glow(&mut self, blur: f32, color: Color) {
        self.ctx.set_shadow_blur(blur as f64);
        self.ctx.set_shadow_color(&css(color));
    }

    fn set_offset(&mut self, offset: Vec2) {
        self.apply_offset(offset);
    }
}
