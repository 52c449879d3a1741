//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied ticks only
//! - Seeded RNG only
//! - Stable iteration order (spawn order, then id)
//! - No platform dependencies; drawing goes through the `Renderer` sink

pub mod assets;
pub mod bestiary;
pub mod campaign;
pub mod collision;
pub mod combat;
pub mod draw;
pub mod fire_control;
pub mod game;
pub mod hitbox;
pub mod level;
pub mod movement;
pub mod particles;
pub mod phaser;
pub mod player;
pub mod scheduler;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use bestiary::{ArchetypeProfile, Bestiary};
pub use campaign::Campaign;
pub use fire_control::{AimedSalvo, ShipToFire, ShipsToFire, StraightDown};
pub use game::Game;
pub use hitbox::Hitbox;
pub use level::{LevelFactory, LevelPlan, WinCondition};
pub use scheduler::{FrameOutcome, HandlerId, Scheduler, Stage};
pub use state::{
    AppState, Archetype, EnemyId, EnemyState, GameEvent, GameResult, GameState, Keys,
    MovementLimit, ParticleState, PlayerState, Tick,
};
pub use store::{Action, Store};
