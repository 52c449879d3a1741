//! Frame and explosion descriptors
//!
//! The raster data itself belongs to the renderer. The simulation only carries
//! which sprite, which animation frame and which tint to paint.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Sprite families known to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKind {
    Player,
    PlayerBullet,
    EnemyBullet,
    Shrapnel,
    ExplosionCenter,
    PhaserBeam,
    Star,
    Scout,
    Diver,
    Gunship,
    Sweeper,
    Asteroid,
    Mothership,
}

/// Packed 0xRRGGBB
pub type Color = u32;

pub mod palette {
    use super::Color;

    pub const WHITE: Color = 0xFFFFFF;
    pub const RED: Color = 0xFF3030;
    pub const ORANGE: Color = 0xFF9F1A;
    pub const YELLOW: Color = 0xFFE14D;
    pub const GREEN: Color = 0x4DFF6A;
    pub const CYAN: Color = 0x3DE8FF;
    pub const BLUE: Color = 0x4D7CFF;
    pub const MAGENTA: Color = 0xE04DFF;
    pub const GREY: Color = 0x9A9A9A;
}

/// A single tinted animation frame of a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoredFrame {
    pub sprite: SpriteKind,
    pub index: u8,
    pub color: Color,
}

impl ColoredFrame {
    pub const fn new(sprite: SpriteKind, index: u8, color: Color) -> Self {
        Self {
            sprite,
            index,
            color,
        }
    }
}

/// Speed policy for a shrapnel batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShrapnelSpeed {
    /// Every particle uses the same speed
    Shared(f32),
    /// One speed per angle (the last entry repeats if the list is short)
    Individual(Vec<f32>),
}

impl ShrapnelSpeed {
    pub fn speed_for(&self, index: usize) -> f32 {
        match self {
            ShrapnelSpeed::Shared(speed) => *speed,
            ShrapnelSpeed::Individual(speeds) => speeds
                .get(index)
                .or_else(|| speeds.last())
                .copied()
                .unwrap_or(0.0),
        }
    }
}

/// Everything needed to spawn an explosion batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionAsset {
    pub center_frame: ColoredFrame,
    /// Ticks the center flash stays visible
    pub center_delay: u64,
    pub shrapnel_frame: ColoredFrame,
    /// One shrapnel particle per angle
    pub angles: Vec<f32>,
    pub speed: ShrapnelSpeed,
    /// Per-tick speed multiplier
    pub acceleration: f32,
}

/// Explosion families; combined with a tint to form an enemy's colored explosion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExplosionKind {
    /// Center flash only
    Pop,
    Small,
    Large,
    /// Irregular burst with individually assigned speeds
    Rubble,
    Player,
}

/// An explosion kind tinted in its owner's color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoredExplosion {
    pub kind: ExplosionKind,
    pub color: Color,
}

impl ColoredExplosion {
    pub const fn new(kind: ExplosionKind, color: Color) -> Self {
        Self { kind, color }
    }

    pub fn asset(&self) -> ExplosionAsset {
        let center_frame = ColoredFrame::new(SpriteKind::ExplosionCenter, 0, self.color);
        let shrapnel_frame = ColoredFrame::new(SpriteKind::Shrapnel, 0, self.color);
        match self.kind {
            ExplosionKind::Pop => ExplosionAsset {
                center_frame,
                center_delay: 10,
                shrapnel_frame,
                angles: Vec::new(),
                speed: ShrapnelSpeed::Shared(0.0),
                acceleration: 1.0,
            },
            ExplosionKind::Small => ExplosionAsset {
                center_frame,
                center_delay: 20,
                shrapnel_frame,
                angles: ring(6, 0.0),
                speed: ShrapnelSpeed::Shared(3.0),
                acceleration: 0.98,
            },
            ExplosionKind::Large => ExplosionAsset {
                center_frame: ColoredFrame::new(SpriteKind::ExplosionCenter, 1, self.color),
                center_delay: 30,
                shrapnel_frame,
                angles: ring(12, TAU / 24.0),
                speed: ShrapnelSpeed::Shared(4.0),
                acceleration: 0.985,
            },
            ExplosionKind::Rubble => ExplosionAsset {
                center_frame,
                center_delay: 25,
                shrapnel_frame: ColoredFrame::new(SpriteKind::Shrapnel, 1, self.color),
                angles: ring(8, TAU / 16.0),
                speed: ShrapnelSpeed::Individual(vec![2.0, 3.5, 2.5, 4.0, 2.0, 3.0, 4.5, 2.5]),
                acceleration: 0.97,
            },
            ExplosionKind::Player => ExplosionAsset {
                center_frame: ColoredFrame::new(SpriteKind::ExplosionCenter, 1, self.color),
                center_delay: 45,
                shrapnel_frame,
                angles: ring(16, 0.0),
                speed: ShrapnelSpeed::Shared(5.0),
                acceleration: 0.99,
            },
        }
    }
}

/// `count` evenly spaced angles starting at `offset`
pub fn ring(count: usize, offset: f32) -> Vec<f32> {
    (0..count)
        .map(|i| crate::normalize_angle(offset + TAU * i as f32 / count as f32))
        .collect()
}
