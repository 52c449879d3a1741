//! Player ship and respawn handling

use glam::Vec2;

use super::assets::{ColoredFrame, SpriteKind, palette};
use super::draw;
use super::hitbox::Hitbox;
use super::particles::advance_particle;
use super::scheduler::{FrameContext, UpdateHandler};
use super::state::{GameEvent, Keys, MovementLimit, ParticleState, PlayerState, SpawnPhase};
use super::store::Action;
use crate::consts::{ANGLE_UP, PLAYER_BULLET_HEIGHT, PLAYER_BULLET_WIDTH};
use crate::error::EngineError;

/// Movement for one tick under a limit, before clamping
pub fn player_step(keys: &Keys, limit: MovementLimit, speed: f32) -> Vec2 {
    let horizontal = (keys.right as i8 - keys.left as i8) as f32;
    let vertical = (keys.down as i8 - keys.up as i8) as f32;
    match limit {
        MovementLimit::Immobile => Vec2::ZERO,
        MovementLimit::Sideways => Vec2::new(horizontal, 0.0) * speed,
        MovementLimit::ForceUp => Vec2::new(0.0, -speed),
        MovementLimit::Unrestricted => Vec2::new(horizontal, vertical) * speed,
    }
}

/// Reads input, moves the ship, flies its single bullet
#[derive(Debug, Default)]
pub struct PlayerHandler;

impl PlayerHandler {
    fn move_ship(ctx: &mut FrameContext<'_>, player: &PlayerState, keys: &Keys) {
        let settings = ctx.settings();
        let step = player_step(keys, player.movement_limit, settings.player_speed);
        if step == Vec2::ZERO {
            return;
        }
        let bounds = settings.dimensions.bounds();
        let moved = player.hitbox.moved_to(player.location.x + step.x, player.location.y + step.y);
        let placed = if player.movement_limit == MovementLimit::ForceUp {
            // Warping out: free to leave through the top, but not forever
            let ceiling = bounds.top - moved.height() * 2.0;
            moved.moved_to(moved.left, moved.top.max(ceiling))
        } else {
            moved.clamped_to(&bounds)
        };
        if placed.top_left() != player.location {
            ctx.dispatch(Action::SetPlayerLocation(placed.top_left()));
        }
    }

    fn fly_bullet(ctx: &mut FrameContext<'_>, bullet: &ParticleState, bounds: &Hitbox) {
        ctx.dispatch(Action::SetPlayerBullet(advance_particle(bullet, bounds)));
    }

    fn shoot(ctx: &mut FrameContext<'_>, player: &PlayerState) {
        let id = ctx.allocate_id();
        let hitbox = player.hitbox;
        let left = hitbox.center().x - PLAYER_BULLET_WIDTH / 2.0;
        let top = hitbox.top - PLAYER_BULLET_HEIGHT;
        let bullet = ParticleState::new(
            id,
            ColoredFrame::new(SpriteKind::PlayerBullet, 0, palette::WHITE),
            left,
            top,
            PLAYER_BULLET_WIDTH,
            PLAYER_BULLET_HEIGHT,
        )
        .with_motion(ctx.settings().player_bullet_speed, ANGLE_UP, 1.0);
        ctx.dispatch(Action::SetPlayerBullet(Some(bullet)));
        ctx.dispatch(Action::BulletFired);
        ctx.emit(GameEvent::BulletFired { enemy: None });
    }
}

impl UpdateHandler for PlayerHandler {
    fn name(&self) -> &'static str {
        "player"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        let state = ctx.snapshot();
        let player = &state.player;
        let keys = state.keyboard.held;
        let bounds = ctx.settings().dimensions.bounds();

        if let Some(bullet) = &player.bullet {
            Self::fly_bullet(ctx, bullet, &bounds);
        }

        if player.alive {
            Self::move_ship(ctx, player, &keys);
            let armed = !matches!(
                player.movement_limit,
                MovementLimit::ForceUp | MovementLimit::Immobile
            );
            let current = ctx.snapshot();
            if keys.fire && armed && current.player.bullet.is_none() {
                Self::shoot(ctx, &current.player);
            }
        }

        let after = ctx.snapshot();
        draw::queue_player(ctx.draws, &after.player, ctx.tick);
        Ok(())
    }
}

/// Brings the player back after a death: wait, fly in, ready
#[derive(Debug, Default)]
pub struct SpawnManager;

impl UpdateHandler for SpawnManager {
    fn name(&self) -> &'static str {
        "spawn-manager"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        let state = ctx.snapshot();
        let tick = ctx.tick;
        match state.player.spawn_phase {
            SpawnPhase::Ready => {}
            SpawnPhase::Waiting { since } => {
                if state.game.lives == 0 || state.game.game_over {
                    return Ok(());
                }
                if tick.saturating_sub(since) >= ctx.settings().respawn_delay_ticks {
                    let location = PlayerState::respawn_location(&ctx.settings().dimensions);
                    ctx.dispatch(Action::SetPlayerLocation(location));
                    ctx.dispatch(Action::SetPlayerAlive(true));
                    ctx.dispatch(Action::SetSpawnPhase(SpawnPhase::Spawning { since: tick }));
                    log::debug!("player respawning at tick {tick}");
                    ctx.emit(GameEvent::PlayerRespawned);
                }
            }
            SpawnPhase::Spawning { since } => {
                if tick.saturating_sub(since) >= ctx.settings().spawn_ticks {
                    ctx.dispatch(Action::SetSpawnPhase(SpawnPhase::Ready));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::Harness;

    fn hold(h: &mut Harness, keys: Keys) {
        h.dispatch(Action::SetKeyboard(keys));
    }

    #[test]
    fn test_step_respects_limits() {
        let keys = Keys {
            left: true,
            up: true,
            ..Default::default()
        };
        assert_eq!(player_step(&keys, MovementLimit::Unrestricted, 2.0), Vec2::new(-2.0, -2.0));
        assert_eq!(player_step(&keys, MovementLimit::Sideways, 2.0), Vec2::new(-2.0, 0.0));
        assert_eq!(player_step(&keys, MovementLimit::Immobile, 2.0), Vec2::ZERO);
        assert_eq!(player_step(&Keys::default(), MovementLimit::ForceUp, 2.0), Vec2::new(0.0, -2.0));
    }

    #[test]
    fn test_player_is_clamped_to_field() {
        let mut h = Harness::new();
        hold(
            &mut h,
            Keys {
                down: true,
                ..Default::default()
            },
        );
        for t in 1..100 {
            PlayerHandler.update(&mut h.ctx(t)).unwrap();
        }
        let snap = h.snapshot();
        assert_eq!(snap.player.hitbox.bottom, h.world.settings.dimensions.height);
    }

    #[test]
    fn test_single_bullet_at_a_time() {
        let mut h = Harness::new();
        hold(
            &mut h,
            Keys {
                fire: true,
                ..Default::default()
            },
        );
        PlayerHandler.update(&mut h.ctx(1)).unwrap();
        let first = h.snapshot().player.bullet.clone().expect("fired");
        PlayerHandler.update(&mut h.ctx(2)).unwrap();
        let snap = h.snapshot();
        let second = snap.player.bullet.as_ref().expect("still flying");
        assert_eq!(first.id, second.id);
        assert!(second.top < first.top);
        assert_eq!(snap.game.bullets_fired, 1);
    }

    #[test]
    fn test_bullet_leaves_field_then_refires() {
        let mut h = Harness::new();
        hold(
            &mut h,
            Keys {
                fire: true,
                ..Default::default()
            },
        );
        let mut fired = 0;
        for t in 1..200 {
            PlayerHandler.update(&mut h.ctx(t)).unwrap();
            fired = h.snapshot().game.bullets_fired;
        }
        assert!(fired > 1);
    }

    #[test]
    fn test_no_fire_while_warping_out() {
        let mut h = Harness::new();
        h.dispatch(Action::SetMovementLimit(MovementLimit::ForceUp));
        hold(
            &mut h,
            Keys {
                fire: true,
                ..Default::default()
            },
        );
        let y0 = h.snapshot().player.location.y;
        PlayerHandler.update(&mut h.ctx(1)).unwrap();
        let snap = h.snapshot();
        assert!(snap.player.bullet.is_none());
        assert!(snap.player.location.y < y0);
    }

    #[test]
    fn test_respawn_cycle() {
        let mut h = Harness::new();
        h.dispatch(Action::SetPlayerAlive(false));
        h.dispatch(Action::SetSpawnPhase(SpawnPhase::Waiting { since: 10 }));
        let delay = h.world.settings.respawn_delay_ticks;
        let fly_in = h.world.settings.spawn_ticks;

        SpawnManager.update(&mut h.ctx(10 + delay - 1)).unwrap();
        assert!(!h.snapshot().player.alive);

        SpawnManager.update(&mut h.ctx(10 + delay)).unwrap();
        let snap = h.snapshot();
        assert!(snap.player.alive);
        assert!(!snap.player.is_vulnerable());

        SpawnManager.update(&mut h.ctx(10 + delay + fly_in)).unwrap();
        assert!(h.snapshot().player.is_vulnerable());
        assert!(h.world.events.contains(&GameEvent::PlayerRespawned));
    }

    #[test]
    fn test_no_respawn_without_lives() {
        let mut h = Harness::new();
        for _ in 0..3 {
            h.dispatch(Action::RemoveLife);
        }
        h.dispatch(Action::SetPlayerAlive(false));
        h.dispatch(Action::SetSpawnPhase(SpawnPhase::Waiting { since: 0 }));
        SpawnManager.update(&mut h.ctx(10_000)).unwrap();
        assert!(!h.snapshot().player.alive);
    }
}
