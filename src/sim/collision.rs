//! Collision primitives shared by every game
//!
//! Only two tests exist: circle vs circle and circle vs axis-aligned rect.
//! Both are boundary-inclusive and apply no epsilon.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::clamp;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Point inside or on the edge
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Closest point of the rect to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            clamp(p.x, self.x, self.right()),
            clamp(p.y, self.y, self.bottom()),
        )
    }
}

/// Euclidean distance
#[inline]
pub fn dist(a: Vec2, b: Vec2) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// True iff the circles touch or overlap
#[inline]
pub fn circle_hits_circle(a: Vec2, ar: f32, b: Vec2, br: f32) -> bool {
    dist(a, b) <= ar + br
}

/// True iff the circle touches or overlaps the rect (closest-point test)
#[inline]
pub fn circle_hits_rect(c: Vec2, r: f32, rect: &Rect) -> bool {
    let d = c - rect.closest_point(c);
    d.x * d.x + d.y * d.y <= r * r
}
