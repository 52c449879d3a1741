//! Entity state store
//!
//! Single source of truth for the simulation. Reads hand out an immutable
//! snapshot; writes are typed actions applied one at a time. A snapshot taken
//! before a dispatch never sees that dispatch: sections are copied on write
//! whenever someone still holds the previous version.
//!
//! Actions naming an entity that no longer exists do nothing. Fire control and
//! collision regularly race on the same enemy within one tick.

use std::rc::Rc;

use glam::Vec2;

use super::state::{
    AppState, DebuggingState, EnemyId, EnemyState, EntityId, ExplosionCenterState, GameState,
    Keys, LevelPhase, MovementLimit, ParticleState, PhaserState, PlayerState, SpawnPhase, Tick,
};

/// Every write the store understands
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // --- Player ---
    /// Move the player's top-left corner
    SetPlayerLocation(Vec2),
    SetPlayerAlive(bool),
    SetPlayerBullet(Option<ParticleState>),
    SetMovementLimit(MovementLimit),
    SetSpawnPhase(SpawnPhase),
    ResetPlayer(PlayerState),

    // --- Enemies and particles ---
    SetEnemies(Vec<EnemyState>),
    AddEnemies(Vec<EnemyState>),
    /// Replace enemies that still exist; unknown ids are ignored
    UpdateEnemies(Vec<EnemyState>),
    RemoveEnemy(EnemyId),
    /// Take one hitpoint
    DamageEnemy(EnemyId),
    /// Everyone but `dying` runs at `base_speed * total / survivors`
    BoostSurvivors { total: usize, dying: EnemyId },
    /// Add enemy bullets and stamp their owners' fire tick in one step
    FireBullets { bullets: Vec<ParticleState>, tick: Tick },
    AddBullet(ParticleState),
    SetBullets(Vec<ParticleState>),
    RemoveBullet(EntityId),
    SetShrapnel(Vec<ParticleState>),
    AddExplosion {
        center: ExplosionCenterState,
        shrapnel: Vec<ParticleState>,
    },
    SetExplosionCenters(Vec<ExplosionCenterState>),
    SetPhaser(PhaserState),
    SetLevelPhase(LevelPhase),
    SetTotalEnemies(usize),
    /// Drop every enemy-level entity (level transitions, game reset)
    ClearLevel,

    // --- Game counters ---
    IncreaseScore(u64),
    AddLife,
    RemoveLife,
    AddPhasers { count: u8, max: u8 },
    RemovePhaser,
    NextLevel,
    SetPaused(bool),
    BulletFired,
    EnemyHit,
    SetLastBonusScore(u64),
    SetGameOver,
    ResetGame(GameState),

    // --- Input / debugging ---
    SetKeyboard(Keys),
    ResetKeyboard,
    SetDebugging(DebuggingState),

    SetTick(Tick),
}

/// Canonical, versioned state
pub struct Store {
    current: Rc<AppState>,
    version: u64,
    next_id: EntityId,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            current: Rc::new(state),
            version: 0,
            next_id: 1,
        }
    }

    /// Immutable view of the current state
    pub fn snapshot(&self) -> Rc<AppState> {
        Rc::clone(&self.current)
    }

    /// Number of dispatches applied so far
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Allocate a fresh entity id. Ids are never reused, not even across games.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Apply one action
    pub fn dispatch(&mut self, action: Action) {
        let state = Rc::make_mut(&mut self.current);
        reduce(state, action);
        self.version += 1;
    }

    /// Apply several actions in order
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.dispatch(action);
        }
    }
}

fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetPlayerLocation(location) => {
            let player = Rc::make_mut(&mut state.player);
            player.location = location;
            player.hitbox = player.hitbox.moved_to(location.x, location.y);
        }
        Action::SetPlayerAlive(alive) => Rc::make_mut(&mut state.player).alive = alive,
        Action::SetPlayerBullet(bullet) => Rc::make_mut(&mut state.player).bullet = bullet,
        Action::SetMovementLimit(limit) => Rc::make_mut(&mut state.player).movement_limit = limit,
        Action::SetSpawnPhase(phase) => Rc::make_mut(&mut state.player).spawn_phase = phase,
        Action::ResetPlayer(player) => state.player = Rc::new(player),

        Action::SetEnemies(enemies) => Rc::make_mut(&mut state.enemy_level).enemies = enemies,
        Action::AddEnemies(enemies) => {
            Rc::make_mut(&mut state.enemy_level).enemies.extend(enemies)
        }
        Action::UpdateEnemies(updates) => {
            let level = Rc::make_mut(&mut state.enemy_level);
            for update in updates {
                if let Some(enemy) = level.enemies.iter_mut().find(|e| e.enemy_id == update.enemy_id) {
                    let last_fire_tick = enemy.last_fire_tick.max(update.last_fire_tick);
                    *enemy = update;
                    enemy.last_fire_tick = last_fire_tick;
                }
            }
        }
        Action::RemoveEnemy(id) => {
            if state.enemy_level.enemy(id).is_some() {
                Rc::make_mut(&mut state.enemy_level)
                    .enemies
                    .retain(|e| e.enemy_id != id);
            }
        }
        Action::DamageEnemy(id) => {
            if state.enemy_level.enemy(id).is_some() {
                let level = Rc::make_mut(&mut state.enemy_level);
                if let Some(enemy) = level.enemies.iter_mut().find(|e| e.enemy_id == id) {
                    enemy.hitpoints = enemy.hitpoints.saturating_sub(1);
                }
            }
        }
        Action::BoostSurvivors { total, dying } => {
            let level = Rc::make_mut(&mut state.enemy_level);
            let survivors = level.enemies.iter().filter(|e| e.enemy_id != dying).count();
            if survivors > 0 && total > 0 {
                let factor = total as f32 / survivors as f32;
                for enemy in level.enemies.iter_mut().filter(|e| e.enemy_id != dying) {
                    enemy.speed = enemy.base_speed * factor;
                }
            }
        }
        Action::FireBullets { bullets, tick } => {
            let level = Rc::make_mut(&mut state.enemy_level);
            for bullet in bullets {
                let Some(owner) = bullet.owner else {
                    level.bullets.push(bullet);
                    continue;
                };
                // Owner already destroyed this tick: the shot never happened
                if let Some(enemy) = level.enemies.iter_mut().find(|e| e.enemy_id == owner) {
                    enemy.last_fire_tick = enemy.last_fire_tick.max(tick);
                    level.bullets.push(bullet);
                }
            }
        }
        Action::AddBullet(bullet) => Rc::make_mut(&mut state.enemy_level).bullets.push(bullet),
        Action::SetBullets(bullets) => Rc::make_mut(&mut state.enemy_level).bullets = bullets,
        Action::RemoveBullet(id) => {
            if state.enemy_level.bullets.iter().any(|b| b.id == id) {
                Rc::make_mut(&mut state.enemy_level)
                    .bullets
                    .retain(|b| b.id != id);
            }
        }
        Action::SetShrapnel(shrapnel) => Rc::make_mut(&mut state.enemy_level).shrapnel = shrapnel,
        Action::AddExplosion { center, shrapnel } => {
            let level = Rc::make_mut(&mut state.enemy_level);
            level.explosion_centers.push(center);
            level.shrapnel.extend(shrapnel);
        }
        Action::SetExplosionCenters(centers) => {
            Rc::make_mut(&mut state.enemy_level).explosion_centers = centers
        }
        Action::SetPhaser(phaser) => Rc::make_mut(&mut state.enemy_level).phaser = phaser,
        Action::SetLevelPhase(phase) => Rc::make_mut(&mut state.enemy_level).phase = phase,
        Action::SetTotalEnemies(total) => {
            Rc::make_mut(&mut state.enemy_level).total_enemies = total
        }
        Action::ClearLevel => {
            let level = Rc::make_mut(&mut state.enemy_level);
            level.enemies.clear();
            level.bullets.clear();
            level.shrapnel.clear();
            level.explosion_centers.clear();
            level.phaser = PhaserState::Idle;
            level.total_enemies = 0;
        }

        Action::IncreaseScore(points) => Rc::make_mut(&mut state.game).score += points,
        Action::AddLife => {
            let game = Rc::make_mut(&mut state.game);
            game.lives = game.lives.saturating_add(1);
        }
        Action::RemoveLife => {
            let game = Rc::make_mut(&mut state.game);
            game.lives = game.lives.saturating_sub(1);
        }
        Action::AddPhasers { count, max } => {
            let game = Rc::make_mut(&mut state.game);
            game.phasers = game.phasers.saturating_add(count).min(max);
        }
        Action::RemovePhaser => {
            let game = Rc::make_mut(&mut state.game);
            game.phasers = game.phasers.saturating_sub(1);
        }
        Action::NextLevel => Rc::make_mut(&mut state.game).level += 1,
        Action::SetPaused(paused) => Rc::make_mut(&mut state.game).paused = paused,
        Action::BulletFired => Rc::make_mut(&mut state.game).bullets_fired += 1,
        Action::EnemyHit => Rc::make_mut(&mut state.game).enemies_hit += 1,
        Action::SetLastBonusScore(score) => Rc::make_mut(&mut state.game).last_bonus_score = score,
        Action::SetGameOver => Rc::make_mut(&mut state.game).game_over = true,
        Action::ResetGame(game) => state.game = Rc::new(game),

        Action::SetKeyboard(held) => {
            let keyboard = Rc::make_mut(&mut state.keyboard);
            keyboard.pressed = held.rising_since(&keyboard.held);
            keyboard.held = held;
        }
        Action::ResetKeyboard => state.keyboard = Rc::new(Default::default()),
        Action::SetDebugging(debugging) => state.debugging = Rc::new(debugging),

        Action::SetTick(tick) => state.tick = tick,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::assets::{ColoredFrame, SpriteKind, palette};
    use crate::sim::test_support::enemy;

    fn bullet(id: EntityId, owner: Option<EnemyId>) -> ParticleState {
        let b = ParticleState::new(
            id,
            ColoredFrame::new(SpriteKind::EnemyBullet, 0, palette::RED),
            0.0,
            0.0,
            4.0,
            4.0,
        );
        match owner {
            Some(o) => b.owned_by(o),
            None => b,
        }
    }

    fn store() -> Store {
        Store::new(AppState::new(&Settings::default()))
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_dispatch() {
        let mut store = store();
        store.dispatch(Action::SetEnemies(vec![enemy(1, 10.0, 10.0)]));
        let before = store.snapshot();
        store.dispatch(Action::RemoveEnemy(1));
        store.dispatch(Action::IncreaseScore(50));
        assert_eq!(before.enemy_level.enemies.len(), 1);
        assert_eq!(before.game.score, 0);
        assert!(store.snapshot().enemy_level.enemies.is_empty());
        assert_eq!(store.snapshot().game.score, 50);
    }

    #[test]
    fn test_untouched_sections_are_shared() {
        let mut store = store();
        let before = store.snapshot();
        store.dispatch(Action::IncreaseScore(1));
        let after = store.snapshot();
        assert!(Rc::ptr_eq(&before.player, &after.player));
        assert!(!Rc::ptr_eq(&before.game, &after.game));
    }

    #[test]
    fn test_removal_is_idempotent() {
        let mut store = store();
        store.dispatch(Action::SetEnemies(vec![enemy(1, 0.0, 0.0), enemy(2, 0.0, 0.0)]));
        store.dispatch(Action::RemoveEnemy(1));
        store.dispatch(Action::RemoveEnemy(1));
        store.dispatch(Action::RemoveBullet(99));
        store.dispatch(Action::DamageEnemy(1));
        let snap = store.snapshot();
        assert_eq!(snap.enemy_level.enemies.len(), 1);
        assert_eq!(snap.enemy_level.enemies[0].enemy_id, 2);
    }

    #[test]
    fn test_fire_bullets_stamps_owner_and_drops_orphans() {
        let mut store = store();
        store.dispatch(Action::SetEnemies(vec![enemy(1, 0.0, 0.0)]));
        store.dispatch(Action::FireBullets {
            bullets: vec![bullet(10, Some(1)), bullet(11, Some(7))],
            tick: 120,
        });
        let snap = store.snapshot();
        assert_eq!(snap.enemy_level.bullets.len(), 1);
        assert_eq!(snap.enemy_level.bullets[0].id, 10);
        assert_eq!(snap.enemy_level.enemies[0].last_fire_tick, 120);
    }

    #[test]
    fn test_fire_tick_never_decreases() {
        let mut store = store();
        store.dispatch(Action::SetEnemies(vec![enemy(1, 0.0, 0.0)]));
        store.dispatch(Action::FireBullets {
            bullets: vec![bullet(10, Some(1))],
            tick: 200,
        });
        store.dispatch(Action::FireBullets {
            bullets: vec![bullet(11, Some(1))],
            tick: 150,
        });
        let mut stale = enemy(1, 5.0, 5.0);
        stale.last_fire_tick = 10;
        store.dispatch(Action::UpdateEnemies(vec![stale]));
        let snap = store.snapshot();
        assert_eq!(snap.enemy_level.enemies[0].last_fire_tick, 200);
        assert_eq!(snap.enemy_level.enemies[0].center, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_boost_after_one_of_ten_destroyed() {
        let mut store = store();
        let enemies: Vec<_> = (1..=10).map(|id| enemy(id, 0.0, 0.0)).collect();
        store.dispatch(Action::SetEnemies(enemies));
        store.dispatch(Action::BoostSurvivors { total: 10, dying: 3 });
        store.dispatch(Action::RemoveEnemy(3));
        let snap = store.snapshot();
        assert_eq!(snap.enemy_level.enemies.len(), 9);
        for e in &snap.enemy_level.enemies {
            assert!((e.speed - 10.0 / 9.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_update_ignores_removed_enemy() {
        let mut store = store();
        store.dispatch(Action::SetEnemies(vec![enemy(1, 0.0, 0.0)]));
        store.dispatch(Action::RemoveEnemy(1));
        store.dispatch(Action::UpdateEnemies(vec![enemy(1, 3.0, 3.0)]));
        assert!(store.snapshot().enemy_level.enemies.is_empty());
    }

    #[test]
    fn test_keyboard_edges() {
        let mut store = store();
        let fire = Keys {
            fire: true,
            ..Default::default()
        };
        store.dispatch(Action::SetKeyboard(fire));
        assert!(store.snapshot().keyboard.pressed.fire);
        store.dispatch(Action::SetKeyboard(fire));
        assert!(!store.snapshot().keyboard.pressed.fire);
        assert!(store.snapshot().keyboard.held.fire);
    }

    #[test]
    fn test_phasers_are_capped() {
        let mut store = store();
        store.dispatch(Action::AddPhasers { count: 10, max: 5 });
        assert_eq!(store.snapshot().game.phasers, 5);
        store.dispatch(Action::RemovePhaser);
        assert_eq!(store.snapshot().game.phasers, 4);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = store();
        let a = store.allocate_id();
        let b = store.allocate_id();
        assert_ne!(a, b);
        assert_eq!(store.version(), 0);
    }
}
