//! Shared fixtures for unit tests

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::assets::{ColoredExplosion, ColoredFrame, ExplosionKind, SpriteKind, palette};
use super::bestiary::Bestiary;
use super::hitbox::Hitbox;
use super::scheduler::{DrawQueue, FrameContext, Hooks, World};
use super::state::{AppState, Archetype, EnemyId, EnemyState, EntityId, ParticleState};
use super::store::{Action, Store};
use crate::settings::Settings;

pub fn world() -> World {
    world_with(Settings::default())
}

pub fn world_with(settings: Settings) -> World {
    World {
        store: Store::new(AppState::new(&settings)),
        rng: Pcg32::seed_from_u64(42),
        bestiary: Bestiary::standard(),
        settings,
        events: Vec::new(),
    }
}

/// A 20x20 scout centered at (x, y)
pub fn enemy(id: EnemyId, x: f32, y: f32) -> EnemyState {
    let center = Vec2::new(x, y);
    EnemyState {
        enemy_id: id,
        archetype: Archetype::Scout,
        sprite: SpriteKind::Scout,
        color: palette::GREEN,
        hitbox: Hitbox::centered(center, 20.0, 20.0),
        center,
        current_frame_index: 0,
        last_fire_tick: 0,
        hitpoints: 1,
        points: 100,
        explosion: ColoredExplosion::new(ExplosionKind::Small, palette::GREEN),
        angle: 0.0,
        base_speed: 1.0,
        speed: 1.0,
        anchor: center,
        sway_phase: 0.0,
        spawned_at: 0,
    }
}

/// A 4x4 enemy bullet at (left, top)
pub fn bullet(id: EntityId, left: f32, top: f32, owner: Option<EnemyId>) -> ParticleState {
    let b = ParticleState::new(
        id,
        ColoredFrame::new(SpriteKind::EnemyBullet, 0, palette::RED),
        left,
        top,
        4.0,
        4.0,
    );
    match owner {
        Some(o) => b.owned_by(o),
        None => b,
    }
}

/// World plus the scheduler-owned pieces a `FrameContext` borrows
pub struct Harness {
    pub world: World,
    pub draws: DrawQueue,
    pub hooks: Hooks,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_world(world())
    }

    pub fn with_world(world: World) -> Self {
        Self {
            world,
            draws: DrawQueue::default(),
            hooks: Hooks::default(),
        }
    }

    pub fn ctx(&mut self, tick: u64) -> FrameContext<'_> {
        self.world.store.dispatch(Action::SetTick(tick));
        FrameContext {
            tick,
            world: &mut self.world,
            draws: &mut self.draws,
            hooks: &mut self.hooks,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.world.store.dispatch(action);
    }

    pub fn snapshot(&self) -> std::rc::Rc<AppState> {
        self.world.store.snapshot()
    }
}
