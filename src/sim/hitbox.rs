//! Axis-aligned hitboxes
//!
//! All collision in the game is rectangle overlap; there is no narrow phase.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in playfield space (+y down)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Hitbox {
    /// Build from a top-left corner and a size
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    /// Build around a center point
    pub fn centered(center: Vec2, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Same size, moved to a new top-left corner
    pub fn moved_to(&self, left: f32, top: f32) -> Self {
        Self::new(left, top, self.width(), self.height())
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Fully inside `outer` (edges may coincide)
    pub fn is_within(&self, outer: &Hitbox) -> bool {
        self.left >= outer.left
            && self.right <= outer.right
            && self.top >= outer.top
            && self.bottom <= outer.bottom
    }

    /// Clamp position so the box lies inside `outer`
    pub fn clamped_to(&self, outer: &Hitbox) -> Self {
        let left = self.left.clamp(outer.left, (outer.right - self.width()).max(outer.left));
        let top = self.top.clamp(outer.top, (outer.bottom - self.height()).max(outer.top));
        self.moved_to(left, top)
    }
}

/// Free-function form used by collision resolution
#[inline]
pub fn overlaps(a: &Hitbox, b: &Hitbox) -> bool {
    a.overlaps(b)
}
