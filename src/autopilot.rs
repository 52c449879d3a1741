//! Demo input: plays the game from state snapshots
//!
//! Tracks the nearest enemy horizontally, sidesteps incoming fire and spends a
//! phaser when something is about to land. Purely a function of the snapshot
//! plus the previous frame's keys, so runs stay reproducible.

use glam::Vec2;

use crate::settings::Dimensions;
use crate::sim::state::{AppState, MovementLimit, PlayerState};
use crate::sim::Keys;

/// Horizontal distance at which a falling object counts as a threat
const DODGE_WIDTH: f32 = 36.0;
/// How far above the ship incoming fire is watched
const DODGE_HEIGHT: f32 = 160.0;
/// Threats closer than this trigger the phaser
const PANIC_DISTANCE: f32 = 48.0;
/// Close enough to the target column to stop steering
const DEAD_ZONE: f32 = 4.0;

#[derive(Debug)]
pub struct Autopilot {
    dimensions: Dimensions,
    previous: Keys,
}

impl Autopilot {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            previous: Keys::default(),
        }
    }

    /// Keys to hold for the next frame
    pub fn keys(&mut self, state: &AppState) -> Keys {
        let keys = self.decide(state);
        self.previous = keys;
        keys
    }

    fn decide(&self, state: &AppState) -> Keys {
        let player = &state.player;
        if state.game.paused || state.game.game_over || !player.alive {
            return Keys::default();
        }
        let mut keys = Keys::default();
        let me = player.center();
        let level = &state.enemy_level;

        let threat = level
            .bullets
            .iter()
            .chain(&level.shrapnel)
            .map(|p| p.hitbox.center())
            .chain(level.enemies.iter().map(|e| e.center))
            .filter(|c| {
                (c.x - me.x).abs() < DODGE_WIDTH && c.y < me.y && me.y - c.y < DODGE_HEIGHT
            })
            .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)));

        let target_x = match threat {
            Some(danger) => {
                let away = if danger.x > me.x { -1.0 } else { 1.0 };
                Some(me.x + away * DODGE_WIDTH * 2.0)
            }
            None => level
                .enemies
                .iter()
                .min_by(|a, b| {
                    (a.center.x - me.x)
                        .abs()
                        .total_cmp(&(b.center.x - me.x).abs())
                })
                // Wobble a little so the ship doesn't park under one column
                .map(|e| e.center.x + (state.tick as f32 * 0.05).sin() * 10.0),
        };

        if let Some(x) = target_x {
            self.steer_towards(&mut keys, player, x);
        }
        if player.movement_limit == MovementLimit::Unrestricted {
            let home = PlayerState::respawn_location(&self.dimensions).y;
            keys.down = player.location.y < home;
        }

        keys.fire = !level.enemies.is_empty();

        let panic = threat.is_some_and(|t: Vec2| t.distance(me) < PANIC_DISTANCE);
        keys.phaser = panic && state.game.phasers > 0 && !self.previous.phaser;
        keys
    }

    fn steer_towards(&self, keys: &mut Keys, player: &PlayerState, x: f32) {
        let hitbox = &player.hitbox;
        let dx = x.clamp(0.0, self.dimensions.width) - hitbox.center().x;
        if dx.abs() > DEAD_ZONE {
            keys.left = dx < 0.0;
            keys.right = dx > 0.0;
        }
        // Pinned against a wall: cut back the other way
        if keys.left && hitbox.left <= 0.0 {
            keys.left = false;
            keys.right = true;
        } else if keys.right && hitbox.right >= self.dimensions.width {
            keys.right = false;
            keys.left = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::store::Action;
    use crate::sim::test_support::{Harness, bullet, enemy};

    fn pilot() -> Autopilot {
        Autopilot::new(Dimensions::default())
    }

    #[test]
    fn test_tracks_nearest_enemy() {
        let mut h = Harness::new();
        let me = h.snapshot().player.center();
        h.dispatch(Action::SetEnemies(vec![
            enemy(1, me.x - 200.0, 150.0),
            enemy(2, me.x + 600.0, 150.0),
        ]));
        let keys = pilot().keys(&h.snapshot());
        assert!(keys.left && !keys.right);
        assert!(keys.fire);
    }

    #[test]
    fn test_sidesteps_incoming_bullet() {
        let mut h = Harness::new();
        let me = h.snapshot().player.center();
        h.dispatch(Action::SetEnemies(vec![enemy(1, me.x - 300.0, 150.0)]));
        h.dispatch(Action::AddBullet(bullet(5, me.x - 10.0, me.y - 100.0, Some(1))));
        let keys = pilot().keys(&h.snapshot());
        assert!(keys.right && !keys.left);
        assert!(!keys.phaser);
    }

    #[test]
    fn test_phaser_when_cornered_but_never_held() {
        let mut h = Harness::new();
        let me = h.snapshot().player.center();
        h.dispatch(Action::SetEnemies(vec![enemy(1, me.x, 150.0)]));
        h.dispatch(Action::AddBullet(bullet(5, me.x, me.y - 30.0, Some(1))));
        let mut p = pilot();
        let state = h.snapshot();
        assert!(p.keys(&state).phaser);
        assert!(!p.keys(&state).phaser);
        assert!(p.keys(&state).phaser);
    }

    #[test]
    fn test_idle_while_dead() {
        let mut h = Harness::new();
        h.dispatch(Action::SetEnemies(vec![enemy(1, 100.0, 150.0)]));
        h.dispatch(Action::SetPlayerAlive(false));
        assert_eq!(pilot().keys(&h.snapshot()), Keys::default());
    }
}
