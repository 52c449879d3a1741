//! Nova Barrage - a tick-driven arcade shooter engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (scheduler, state store, levels, fire control,
//!   collisions, particles)
//! - `render`: Renderer sink trait and draw primitives handed to the host
//! - `settings`: Data-driven configuration (dimensions, balance, debugging)
//! - `autopilot`: Demo input that plays the game unattended

pub mod autopilot;
pub mod error;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::{EngineError, SettingsError};
pub use settings::{Dimensions, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use std::f32::consts::FRAC_PI_2;

    /// Screen space: +y points down, so "down" is a quarter turn clockwise
    pub const ANGLE_DOWN: f32 = FRAC_PI_2;
    pub const ANGLE_UP: f32 = -FRAC_PI_2;

    /// Minimum ticks between two shots of the same enemy
    pub const MIN_FIRE_SPACING: u64 = 50;
    /// One-in-N chance for sporadic straight-down shooters
    pub const SPORADIC_FIRE_ODDS: u32 = 20;
    /// Angular spread between repeated shots of one candidate in a volley
    pub const VOLLEY_SPREAD: f32 = 0.12;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 39.0;
    pub const PLAYER_HEIGHT: f32 = 27.0;
    pub const PLAYER_BULLET_WIDTH: f32 = 3.0;
    pub const PLAYER_BULLET_HEIGHT: f32 = 12.0;

    /// Enemy bullet defaults
    pub const ENEMY_BULLET_WIDTH: f32 = 6.0;
    pub const ENEMY_BULLET_HEIGHT: f32 = 9.0;

    /// Shrapnel size
    pub const SHRAPNEL_SIZE: f32 = 6.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Angle of the ray from `from` to `to` in screen space
#[inline]
pub fn angle_towards(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Absolute shortest difference between two angles, in [0, π]
#[inline]
pub fn angle_difference(a: f32, b: f32) -> f32 {
    normalize_angle(a - b).abs()
}

/// Unit direction for an angle
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_angle_difference_wraps() {
        assert!((angle_difference(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-4);
        assert!(angle_difference(1.0, 1.0) < 1e-6);
    }

    #[test]
    fn test_down_points_down_screen() {
        let d = direction(consts::ANGLE_DOWN);
        assert!(d.y > 0.99);
        assert!(d.x.abs() < 1e-4);
    }

    #[test]
    fn test_angle_towards() {
        let a = angle_towards(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0));
        assert!((a - consts::ANGLE_DOWN).abs() < 1e-5);
    }
}
