//! Phaser: the player's limited smart bomb
//!
//! Idle -> BeamShown (update phase frozen for a fixed number of ticks)
//! -> Resolved (target destroyed on the next running frame) -> Idle

use glam::Vec2;
use rand::seq::IndexedRandom;

use super::collision::destroy_enemy;
use super::scheduler::FrameContext;
use super::state::{EnemyId, GameEvent, PhaserState};
use super::store::Action;

/// Distance between beam segments
pub const BEAM_STEP: f32 = 12.0;

/// Evenly spaced points from `from` to `to`, both ends included
pub fn beam_path(from: Vec2, to: Vec2, step: f32) -> Vec<Vec2> {
    let distance = from.distance(to);
    if distance <= f32::EPSILON || step <= 0.0 {
        return vec![from];
    }
    let segments = (distance / step).ceil() as usize;
    (0..=segments)
        .map(|i| from.lerp(to, i as f32 / segments as f32))
        .collect()
}

/// Spend a charge and lock onto a random enemy. Returns the target.
pub fn fire_phaser(ctx: &mut FrameContext<'_>) -> Option<EnemyId> {
    let state = ctx.snapshot();
    let level = &state.enemy_level;
    if state.game.phasers == 0 || !state.player.alive || level.phaser != PhaserState::Idle {
        return None;
    }
    let target = level.enemies.choose(&mut ctx.world.rng)?;
    let path = beam_path(state.player.center(), target.center, BEAM_STEP);
    let id = target.enemy_id;

    ctx.dispatch(Action::RemovePhaser);
    ctx.dispatch(Action::SetPhaser(PhaserState::BeamShown {
        target: id,
        path,
        started: ctx.tick,
    }));
    log::info!("phaser locked on enemy {id} at tick {}", ctx.tick);
    ctx.emit(GameEvent::PhaserFired { target: id });
    Some(id)
}

/// Called by the scheduler instead of the update phase while the beam shows
pub fn advance_freeze(ctx: &mut FrameContext<'_>) {
    let state = ctx.snapshot();
    if let PhaserState::BeamShown {
        target, started, ..
    } = state.enemy_level.phaser
    {
        if ctx.tick.saturating_sub(started) >= ctx.settings().phaser_freeze_ticks {
            ctx.dispatch(Action::SetPhaser(PhaserState::Resolved { target }));
        }
    }
}

/// Destroy a resolved target and return to idle
pub fn resolve_phaser(ctx: &mut FrameContext<'_>) -> Option<EnemyId> {
    let PhaserState::Resolved { target } = ctx.snapshot().enemy_level.phaser else {
        return None;
    };
    ctx.dispatch(Action::SetPhaser(PhaserState::Idle));
    // The target may have died some other way in the meantime
    destroy_enemy(ctx, target).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::{Harness, enemy};

    #[test]
    fn test_beam_path_endpoints() {
        let path = beam_path(Vec2::new(0.0, 100.0), Vec2::new(0.0, 0.0), 12.0);
        assert_eq!(path.len(), 10);
        assert_eq!(path[0], Vec2::new(0.0, 100.0));
        assert_eq!(*path.last().unwrap(), Vec2::new(0.0, 0.0));
        assert_eq!(beam_path(Vec2::ONE, Vec2::ONE, 12.0), vec![Vec2::ONE]);
    }

    #[test]
    fn test_no_charge_no_phaser() {
        let mut h = Harness::new();
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0)]));
        h.dispatch(Action::RemovePhaser);
        assert_eq!(fire_phaser(&mut h.ctx(1)), None);
        assert_eq!(h.snapshot().enemy_level.phaser, PhaserState::Idle);
    }

    #[test]
    fn test_freeze_lifecycle() {
        let mut h = Harness::new();
        h.dispatch(Action::SetEnemies(vec![enemy(1, 300.0, 200.0)]));
        h.dispatch(Action::SetTotalEnemies(1));
        assert_eq!(fire_phaser(&mut h.ctx(100)), Some(1));
        assert_eq!(h.snapshot().game.phasers, 0);
        assert!(h.snapshot().enemy_level.phaser.is_freezing());

        let freeze = h.world.settings.phaser_freeze_ticks;
        advance_freeze(&mut h.ctx(100 + freeze - 1));
        assert!(h.snapshot().enemy_level.phaser.is_freezing());
        advance_freeze(&mut h.ctx(100 + freeze));
        assert_eq!(
            h.snapshot().enemy_level.phaser,
            PhaserState::Resolved { target: 1 }
        );

        assert_eq!(resolve_phaser(&mut h.ctx(101 + freeze)), Some(1));
        let snap = h.snapshot();
        assert_eq!(snap.enemy_level.phaser, PhaserState::Idle);
        assert!(snap.enemy_level.enemies.is_empty());
        assert_eq!(snap.game.score, 100);
    }

    #[test]
    fn test_resolving_a_dead_target() {
        let mut h = Harness::new();
        h.dispatch(Action::SetPhaser(PhaserState::Resolved { target: 5 }));
        assert_eq!(resolve_phaser(&mut h.ctx(1)), None);
        assert_eq!(h.snapshot().enemy_level.phaser, PhaserState::Idle);
    }
}
