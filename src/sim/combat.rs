//! Per-level combat logic
//!
//! Registered by a level once its enemies are on the field and removed again
//! when the level is disposed. Each frame, in order: a resolved phaser lands,
//! player specials fire, enemies move, the level's fire control gets its
//! round, then collisions are detected and resolved against one snapshot.

use std::rc::Rc;

use super::collision;
use super::draw;
use super::fire_control::{self, ShipsToFire};
use super::movement::animation_frame;
use super::phaser;
use super::scheduler::{FrameContext, UpdateHandler};
use super::state::{EnemyState, Tick};
use super::store::Action;
use crate::error::EngineError;

pub struct CombatHandler {
    fire_control: Option<Rc<dyn ShipsToFire>>,
    /// Ticks between firing rounds
    fire_interval: u64,
    started: Tick,
}

impl CombatHandler {
    pub fn new(fire_control: Option<Rc<dyn ShipsToFire>>, fire_interval: u64, started: Tick) -> Self {
        Self {
            fire_control,
            fire_interval,
            started,
        }
    }

    fn firing_round(&self, tick: Tick) -> bool {
        self.fire_interval > 0
            && tick > self.started
            && (tick - self.started) % self.fire_interval == 0
    }
}

/// Every enemy one movement step and animation frame further
pub fn advance_enemies(ctx: &FrameContext<'_>, enemies: &[EnemyState]) -> Result<Vec<EnemyState>, EngineError> {
    let bounds = ctx.settings().dimensions.bounds();
    let tick = ctx.tick;
    let mut moved = Vec::with_capacity(enemies.len());
    for enemy in enemies {
        let profile = ctx.world.bestiary.profile(enemy.archetype)?;
        let motion = profile.movement.advance(enemy, tick, &bounds);
        let mut next = enemy.clone();
        next.recenter(motion.center);
        next.angle = motion.angle;
        next.anchor = motion.anchor;
        next.sway_phase = motion.sway_phase;
        next.current_frame_index =
            animation_frame(enemy.spawned_at, tick, profile.frames, profile.frame_interval);
        moved.push(next);
    }
    Ok(moved)
}

impl UpdateHandler for CombatHandler {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        if !ctx.snapshot().enemy_level.phase.is_combat() {
            return Ok(());
        }

        phaser::resolve_phaser(ctx);

        let keys = ctx.snapshot().keyboard.pressed;
        if keys.self_destruct {
            collision::self_destruct(ctx);
        }
        if keys.phaser {
            phaser::fire_phaser(ctx);
        }

        let state = ctx.snapshot();
        if !state.enemy_level.enemies.is_empty() {
            let moved = advance_enemies(ctx, &state.enemy_level.enemies)?;
            ctx.dispatch(Action::UpdateEnemies(moved));
        }

        if let Some(strategy) = &self.fire_control {
            if self.firing_round(ctx.tick) {
                fire_control::fire(ctx, strategy.as_ref())?;
            }
        }

        let field = ctx.snapshot();
        let found = collision::detect(&field);
        if !found.is_empty() {
            collision::resolve(ctx, &found);
        }

        let after = ctx.snapshot();
        draw::queue_enemies(ctx.draws, &after.enemy_level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::fire_control::StraightDown;
    use crate::sim::state::{Archetype, Keys, LevelPhase, PhaserState};
    use crate::sim::test_support::{Harness, bullet, enemy};

    fn active(h: &mut Harness) {
        h.dispatch(Action::SetLevelPhase(LevelPhase::Active));
    }

    fn handler(interval: u64) -> CombatHandler {
        CombatHandler::new(Some(Rc::new(StraightDown::max_three_down())), interval, 0)
    }

    #[test]
    fn test_idle_outside_combat_phases() {
        let mut h = Harness::new();
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0)]));
        h.dispatch(Action::SetLevelPhase(LevelPhase::Banner { until: 100 }));
        let before = h.snapshot().enemy_level.enemies[0].clone();
        handler(1).update(&mut h.ctx(60)).unwrap();
        assert_eq!(h.snapshot().enemy_level.enemies[0], before);
        assert!(h.draws.is_empty());
    }

    #[test]
    fn test_enemies_move_and_fire_on_interval() {
        let mut h = Harness::new();
        active(&mut h);
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0)]));
        let mut combat = handler(10);

        combat.update(&mut h.ctx(55)).unwrap();
        let snap = h.snapshot();
        assert_ne!(snap.enemy_level.enemies[0].center.x, 300.0);
        assert!(snap.enemy_level.bullets.is_empty());

        combat.update(&mut h.ctx(60)).unwrap();
        let snap = h.snapshot();
        assert_eq!(snap.enemy_level.bullets.len(), 1);
        assert_eq!(snap.enemy_level.enemies[0].last_fire_tick, 60);
        assert!(!h.draws.is_empty());
    }

    #[test]
    fn test_pressed_phaser_starts_beam() {
        let mut h = Harness::new();
        active(&mut h);
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0)]));
        h.dispatch(Action::SetKeyboard(Keys {
            phaser: true,
            ..Default::default()
        }));
        CombatHandler::new(None, 0, 0).update(&mut h.ctx(5)).unwrap();
        assert!(h.snapshot().enemy_level.phaser.is_freezing());
    }

    #[test]
    fn test_resolved_phaser_lands_first() {
        let mut h = Harness::new();
        active(&mut h);
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0), enemy(2, 400.0, 200.0)]));
        h.dispatch(Action::SetTotalEnemies(2));
        h.dispatch(Action::SetPhaser(PhaserState::Resolved { target: 2 }));
        CombatHandler::new(None, 0, 0).update(&mut h.ctx(5)).unwrap();
        let snap = h.snapshot();
        assert_eq!(snap.enemy_level.enemies.len(), 1);
        assert_eq!(snap.enemy_level.enemies[0].enemy_id, 1);
        assert_eq!(snap.enemy_level.phaser, PhaserState::Idle);
    }

    #[test]
    fn test_survivors_speed_up_without_jumping() {
        let mut h = Harness::new();
        let scouts: Vec<_> = (1..=10)
            .map(|i| {
                let at = glam::Vec2::new(80.0 * i as f32, 150.0);
                h.world.bestiary.spawn(Archetype::Scout, i, at, 0.0, 0).unwrap()
            })
            .collect();
        h.dispatch(Action::SetEnemies(scouts));
        h.dispatch(Action::SetTotalEnemies(10));

        let step = |h: &mut Harness, tick: Tick| -> f32 {
            let before = h.snapshot().enemy_level.enemies.clone();
            let ctx = h.ctx(tick);
            let moved = advance_enemies(&ctx, &before).unwrap();
            h.dispatch(Action::UpdateEnemies(moved));
            let after = h.snapshot();
            before
                .iter()
                .filter_map(|b| after.enemy_level.enemy(b.enemy_id).map(|a| a.center.distance(b.center)))
                .fold(0.0, f32::max)
        };

        let mut largest = 0.0f32;
        for tick in 1..1000 {
            largest = largest.max(step(&mut h, tick));
        }
        assert!(collision::destroy_enemy(&mut h.ctx(1000), 1));
        let boosted = step(&mut h, 1000);
        assert!(h.snapshot().enemy_level.enemies[0].speed > 1.0);
        assert!(boosted < largest * 1.5, "jumped {boosted} vs {largest}");
    }

    #[test]
    fn test_collisions_resolved_each_frame() {
        let mut h = Harness::new();
        active(&mut h);
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0)]));
        h.dispatch(Action::SetTotalEnemies(1));
        let b = bullet(9, 300.0, 190.0, None);
        h.dispatch(Action::SetPlayerBullet(Some(b)));
        CombatHandler::new(None, 0, 0).update(&mut h.ctx(1)).unwrap();
        let snap = h.snapshot();
        assert!(snap.enemy_level.enemies.is_empty());
        assert_eq!(snap.game.score, 100);
    }
}
