//! The stock endless campaign
//!
//! Six level templates repeat forever. Every pass through the cycle adds a
//! bullet to each fire cap, shortens the fire interval and speeds the enemies up.

use std::f32::consts::FRAC_PI_4;
use std::rc::Rc;

use glam::Vec2;

use super::fire_control::{AimedSalvo, ShipsToFire, StraightDown};
use super::level::{EnemySpawn, LevelFactory, LevelPlan, WinCondition};
use super::state::{Archetype, MovementLimit};
use crate::consts::ANGLE_DOWN;
use crate::error::EngineError;
use crate::settings::Dimensions;

/// Number of distinct level templates
pub const TEMPLATES: u32 = 6;

/// Fastest allowed firing cadence
const MIN_FIRE_INTERVAL: u64 = 5;

fn armed(strategy: impl ShipsToFire + 'static) -> Option<Rc<dyn ShipsToFire>> {
    Some(Rc::new(strategy))
}

pub struct Campaign {
    dimensions: Dimensions,
}

impl Campaign {
    pub fn new(dimensions: Dimensions) -> Self {
        Self { dimensions }
    }

    /// `cols` x `rows` block of one archetype, centered horizontally, first row at `top`
    fn grid(&self, archetype: Archetype, rows: usize, cols: usize, top: f32, spacing: Vec2) -> Vec<EnemySpawn> {
        let width = spacing.x * (cols.saturating_sub(1)) as f32;
        let left = (self.dimensions.width - width) / 2.0;
        let mut out = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                out.push(EnemySpawn {
                    archetype,
                    at: Vec2::new(
                        left + spacing.x * col as f32,
                        self.dimensions.top_offset + top + spacing.y * row as f32,
                    ),
                    angle: ANGLE_DOWN,
                });
            }
        }
        out
    }

    /// Ships spread along a row, alternating diagonal headings
    fn sweep_row(&self, archetype: Archetype, count: usize, top: f32) -> Vec<EnemySpawn> {
        let step = self.dimensions.width / (count + 1) as f32;
        (0..count)
            .map(|i| EnemySpawn {
                archetype,
                at: Vec2::new(step * (i + 1) as f32, self.dimensions.top_offset + top),
                angle: if i % 2 == 0 {
                    FRAC_PI_4
                } else {
                    3.0 * FRAC_PI_4
                },
            })
            .collect()
    }
}

impl LevelFactory for Campaign {
    fn build(&self, level: u32) -> Result<LevelPlan, EngineError> {
        if level == 0 {
            return Err(EngineError::InvalidLevel {
                level,
                details: "levels are numbered from 1".into(),
            });
        }
        let template = (level - 1) % TEMPLATES;
        let cycle = ((level - 1) / TEMPLATES) as usize;
        let extra = cycle;
        let interval = |base: u64| base.saturating_sub(2 * cycle as u64).max(MIN_FIRE_INTERVAL);
        let speed_scale = 1.0 + 0.15 * cycle as f32;
        let cell = Vec2::new(60.0, 45.0);

        let (title, enemies, win, fire_control, fire_interval, movement_limit): (
            &str,
            Vec<EnemySpawn>,
            WinCondition,
            Option<Rc<dyn ShipsToFire>>,
            u64,
            MovementLimit,
        ) = match template {
            0 => (
                "FIRST CONTACT",
                self.grid(Archetype::Scout, 2, 8, 60.0, cell),
                WinCondition::Clear,
                armed(StraightDown {
                    max_bullets: 3 + extra,
                    ..StraightDown::max_three_down()
                }),
                interval(20),
                MovementLimit::Sideways,
            ),
            1 => {
                let mut enemies = self.grid(Archetype::Scout, 1, 6, 60.0, cell);
                enemies.extend(self.grid(Archetype::Diver, 1, 6, 110.0, cell));
                (
                    "DIVE BOMBERS",
                    enemies,
                    WinCondition::Clear,
                    armed(AimedSalvo {
                        max_bullets: 3 + extra,
                    }),
                    interval(25),
                    MovementLimit::Unrestricted,
                )
            }
            2 => {
                let mut enemies = self.grid(Archetype::Gunship, 1, 4, 70.0, Vec2::new(120.0, 0.0));
                enemies.extend(self.sweep_row(Archetype::Sweeper, 4, 160.0));
                (
                    "HOLD THE LINE",
                    enemies,
                    WinCondition::Survive { ticks: 1800 },
                    armed(AimedSalvo {
                        max_bullets: 4 + extra,
                    }),
                    interval(30),
                    MovementLimit::Unrestricted,
                )
            }
            3 => (
                "ROCK FIELD",
                self.grid(Archetype::Asteroid, 1, 5, 20.0, Vec2::new(150.0, 0.0)),
                WinCondition::Attrition {
                    cap: 16 + 4 * extra,
                    concurrent: 6,
                    interval: 45,
                },
                None,
                0,
                MovementLimit::Sideways,
            ),
            4 => {
                let mut enemies = self.sweep_row(Archetype::Sweeper, 6, 60.0);
                enemies.extend(self.grid(Archetype::Scout, 1, 8, 130.0, cell));
                (
                    "SWEEPERS",
                    enemies,
                    WinCondition::Clear,
                    armed(StraightDown::sporadic(5 + extra)),
                    1,
                    MovementLimit::Unrestricted,
                )
            }
            _ => {
                let mut enemies = self.grid(Archetype::Mothership, 1, 1, 60.0, cell);
                enemies.extend(self.grid(Archetype::Gunship, 1, 2, 120.0, Vec2::new(240.0, 0.0)));
                enemies.extend(self.grid(Archetype::Scout, 1, 6, 180.0, cell));
                (
                    "MOTHERSHIP",
                    enemies,
                    WinCondition::Clear,
                    armed(AimedSalvo {
                        max_bullets: 5 + extra,
                    }),
                    interval(20),
                    MovementLimit::Unrestricted,
                )
            }
        };

        Ok(LevelPlan {
            title: title.to_string(),
            enemies,
            win,
            fire_control,
            fire_interval,
            movement_limit,
            speed_scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign() -> Campaign {
        Campaign::new(Dimensions::default())
    }

    #[test]
    fn test_every_template_is_valid() {
        let c = campaign();
        for level in 1..=TEMPLATES * 3 {
            let plan = c.build(level).unwrap();
            plan.validate(level).unwrap();
        }
    }

    #[test]
    fn test_spawns_inside_field() {
        let c = campaign();
        let bounds = Dimensions::default().bounds();
        for level in 1..=TEMPLATES {
            for spawn in c.build(level).unwrap().enemies {
                assert!(spawn.at.x > bounds.left && spawn.at.x < bounds.right, "level {level}");
                assert!(spawn.at.y > bounds.top && spawn.at.y < bounds.bottom, "level {level}");
            }
        }
    }

    #[test]
    fn test_difficulty_rises_each_cycle() {
        let c = campaign();
        let first = c.build(1).unwrap();
        let again = c.build(1 + TEMPLATES).unwrap();
        assert_eq!(first.title, again.title);
        assert!(again.fire_interval < first.fire_interval);
        assert!(again.speed_scale > first.speed_scale);
        let cap = |p: &LevelPlan| p.fire_control.as_ref().map(|f| f.max_bullets());
        assert_eq!(cap(&again), cap(&first).map(|n| n + 1));
    }

    #[test]
    fn test_level_zero_rejected() {
        assert!(campaign().build(0).is_err());
    }
}
