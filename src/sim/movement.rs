//! Enemy movement providers
//!
//! A provider maps an enemy's current state to its next center and heading.
//! Providers are stateless; anything they need to remember (anchor, sway
//! phase, spawn tick) lives on the enemy itself.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::hitbox::Hitbox;
use super::state::{EnemyState, Tick};
use crate::consts::ANGLE_DOWN;
use crate::{direction, normalize_angle};

/// Result of one movement step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub center: Vec2,
    pub angle: f32,
    pub anchor: Vec2,
    pub sway_phase: f32,
}

/// Per-archetype movement
pub trait MovementProvider {
    fn advance(&self, enemy: &EnemyState, tick: Tick, bounds: &Hitbox) -> Motion;
}

/// Sway side to side around an anchor that slowly sinks towards a floor
#[derive(Debug, Clone, Copy)]
pub struct Formation {
    /// Horizontal sway amplitude
    pub sway: f32,
    /// Ticks per full sway
    pub period: f32,
    /// Anchor descent per tick per unit of speed
    pub descent: f32,
    /// Lowest anchor position, as a fraction of the playfield height
    pub floor: f32,
}

impl Default for Formation {
    fn default() -> Self {
        Self {
            sway: 40.0,
            period: 240.0,
            descent: 0.05,
            floor: 0.45,
        }
    }
}

impl MovementProvider for Formation {
    fn advance(&self, enemy: &EnemyState, _tick: Tick, bounds: &Hitbox) -> Motion {
        let floor = bounds.top + bounds.height() * self.floor;
        let anchor = Vec2::new(
            enemy.anchor.x,
            (enemy.anchor.y + self.descent * enemy.speed).min(floor),
        );
        // Boosted survivors sway faster from where they are, never jump
        let phase = (enemy.sway_phase + TAU * enemy.speed.max(0.1) / self.period) % TAU;
        Motion {
            center: Vec2::new(anchor.x + self.sway * phase.sin(), anchor.y),
            angle: ANGLE_DOWN,
            anchor,
            sway_phase: phase,
        }
    }
}

/// Straight line that reflects off the side walls, the ceiling and a floor line
#[derive(Debug, Clone, Copy)]
pub struct Bounce {
    /// Floor as a fraction of the playfield height
    pub floor: f32,
}

impl Default for Bounce {
    fn default() -> Self {
        Self { floor: 0.6 }
    }
}

impl MovementProvider for Bounce {
    fn advance(&self, enemy: &EnemyState, _tick: Tick, bounds: &Hitbox) -> Motion {
        let half = Vec2::new(enemy.hitbox.width(), enemy.hitbox.height()) / 2.0;
        let floor = bounds.top + bounds.height() * self.floor;
        let mut angle = enemy.angle;
        let mut center = enemy.center + direction(angle) * enemy.speed;

        if center.x - half.x < bounds.left || center.x + half.x > bounds.right {
            angle = PI - angle;
            center.x = center.x.clamp(bounds.left + half.x, bounds.right - half.x);
        }
        if center.y - half.y < bounds.top || center.y + half.y > floor {
            angle = -angle;
            center.y = center.y.clamp(bounds.top + half.y, floor - half.y);
        }
        Motion {
            center,
            angle: normalize_angle(angle),
            anchor: enemy.anchor,
            sway_phase: enemy.sway_phase,
        }
    }
}

/// Fall along the heading, wrapping back to the top once fully below the field
#[derive(Debug, Clone, Copy, Default)]
pub struct Drift;

impl MovementProvider for Drift {
    fn advance(&self, enemy: &EnemyState, _tick: Tick, bounds: &Hitbox) -> Motion {
        let half_h = enemy.hitbox.height() / 2.0;
        let mut center = enemy.center + direction(enemy.angle) * enemy.speed;
        if center.y - half_h > bounds.bottom {
            center.y = bounds.top - half_h;
        }
        center.x = wrap(center.x, bounds.left, bounds.right);
        Motion {
            center,
            angle: enemy.angle,
            anchor: enemy.anchor,
            sway_phase: enemy.sway_phase,
        }
    }
}

/// Swoop down in a sine wave around the anchor column, then start over at the top
#[derive(Debug, Clone, Copy)]
pub struct Dive {
    pub amplitude: f32,
    /// Vertical distance per full wave
    pub wavelength: f32,
}

impl Default for Dive {
    fn default() -> Self {
        Self {
            amplitude: 90.0,
            wavelength: 260.0,
        }
    }
}

impl MovementProvider for Dive {
    fn advance(&self, enemy: &EnemyState, _tick: Tick, bounds: &Hitbox) -> Motion {
        let half_w = enemy.hitbox.width() / 2.0;
        let half_h = enemy.hitbox.height() / 2.0;
        let mut y = enemy.center.y + enemy.speed;
        if y - half_h > bounds.bottom {
            y = bounds.top + half_h;
        }
        let phase = TAU * (y - enemy.anchor.y) / self.wavelength;
        let x = (enemy.anchor.x + self.amplitude * phase.sin())
            .clamp(bounds.left + half_w, bounds.right - half_w);
        let center = Vec2::new(x, y);
        let delta = center - enemy.center;
        let angle = if delta.length_squared() > f32::EPSILON && delta.y > 0.0 {
            delta.y.atan2(delta.x)
        } else {
            ANGLE_DOWN
        };
        Motion {
            center,
            angle,
            anchor: enemy.anchor,
            sway_phase: enemy.sway_phase,
        }
    }
}

fn wrap(value: f32, min: f32, max: f32) -> f32 {
    let span = max - min;
    if span <= 0.0 {
        return min;
    }
    (value - min).rem_euclid(span) + min
}

/// Animation frame for an entity spawned at `spawned_at`
pub fn animation_frame(spawned_at: Tick, tick: Tick, frames: u8, interval: u64) -> u8 {
    if frames <= 1 || interval == 0 {
        return 0;
    }
    ((tick.saturating_sub(spawned_at) / interval) % frames as u64) as u8
}
