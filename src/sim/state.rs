//! Game state and core simulation types
//!
//! Everything the store owns lives here. Sections are reference counted so a
//! dispatch only copies the section it touches.

use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::assets::{Color, ColoredExplosion, ColoredFrame, SpriteKind, palette};
use super::hitbox::Hitbox;
use crate::consts::{PLAYER_HEIGHT, PLAYER_WIDTH};
use crate::settings::{Dimensions, Settings};

/// Frame counter supplied by the host
pub type Tick = u64;
/// Store-wide entity id
pub type EntityId = u32;
/// Enemy ids come from the same allocator as every other entity
pub type EnemyId = EntityId;

/// Enemy families. Behavior is looked up in the bestiary, never branched on inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    Scout,
    Diver,
    Gunship,
    Sweeper,
    Asteroid,
    Mothership,
}

/// An enemy ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyState {
    pub enemy_id: EnemyId,
    pub archetype: Archetype,
    pub sprite: SpriteKind,
    pub color: Color,
    pub hitbox: Hitbox,
    pub center: Vec2,
    pub current_frame_index: u8,
    /// Never decreases
    pub last_fire_tick: Tick,
    pub hitpoints: u32,
    pub points: u32,
    pub explosion: ColoredExplosion,
    /// Heading in radians
    pub angle: f32,
    /// Speed as spawned
    pub base_speed: f32,
    /// Speed after difficulty compensation
    pub speed: f32,
    /// Formation slot / sway origin
    pub anchor: Vec2,
    /// Accumulated sway angle, advanced by `speed` each tick
    pub sway_phase: f32,
    pub spawned_at: Tick,
}

impl EnemyState {
    pub fn colored_frame(&self) -> ColoredFrame {
        ColoredFrame::new(self.sprite, self.current_frame_index, self.color)
    }

    /// Move so the hitbox is centered on `center`
    pub fn recenter(&mut self, center: Vec2) {
        self.hitbox = Hitbox::centered(center, self.hitbox.width(), self.hitbox.height());
        self.center = center;
    }
}

/// A moving point-like object: player bullet, enemy bullet or shrapnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleState {
    pub id: EntityId,
    pub frame: ColoredFrame,
    pub hitbox: Hitbox,
    pub left: f32,
    pub top: f32,
    /// Distance per tick
    pub speed: f32,
    pub angle: f32,
    /// Per-tick speed multiplier
    pub acceleration: f32,
    /// Firing enemy, for enemy bullets only
    pub owner: Option<EnemyId>,
}

impl ParticleState {
    /// Stationary particle at a location
    pub fn new(id: EntityId, frame: ColoredFrame, left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            id,
            frame,
            hitbox: Hitbox::new(left, top, width, height),
            left,
            top,
            speed: 0.0,
            angle: 0.0,
            acceleration: 1.0,
            owner: None,
        }
    }

    pub fn with_motion(mut self, speed: f32, angle: f32, acceleration: f32) -> Self {
        self.speed = speed;
        self.angle = angle;
        self.acceleration = acceleration;
        self
    }

    pub fn owned_by(mut self, owner: EnemyId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Move the top-left corner, keeping the hitbox in step
    pub fn place(&mut self, left: f32, top: f32) {
        self.left = left;
        self.top = top;
        self.hitbox = self.hitbox.moved_to(left, top);
    }
}

/// The non-moving flash at an explosion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionCenterState {
    pub id: EntityId,
    pub left: f32,
    pub top: f32,
    pub start_tick: Tick,
    pub explosion_center_delay: u64,
    pub frame: ColoredFrame,
}

impl ExplosionCenterState {
    /// Present through `start_tick + delay` inclusive
    pub fn expired(&self, tick: Tick) -> bool {
        tick.saturating_sub(self.start_tick) > self.explosion_center_delay
    }
}

/// Phaser freeze state machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PhaserState {
    #[default]
    Idle,
    /// Beam on screen, update phase frozen
    BeamShown {
        target: EnemyId,
        path: Vec<Vec2>,
        started: Tick,
    },
    /// Freeze over; target destruction pending for this frame
    Resolved { target: EnemyId },
}

impl PhaserState {
    pub fn is_freezing(&self) -> bool {
        matches!(self, PhaserState::BeamShown { .. })
    }
}

/// Restriction a level places on the player's movement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementLimit {
    /// Cannot move at all
    Immobile,
    /// Left/right only
    Sideways,
    /// Pushed upward every tick (fly-in / warp sequences)
    ForceUp,
    #[default]
    #[serde(rename = "none")]
    Unrestricted,
}

/// Where the player is in its death/respawn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnPhase {
    /// Dead, waiting for the respawn delay
    Waiting { since: Tick },
    /// Flying in; cannot be hit yet
    Spawning { since: Tick },
    Ready,
}

/// The player's ship (singleton)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub alive: bool,
    /// Top-left corner
    pub location: Vec2,
    pub hitbox: Hitbox,
    pub movement_limit: MovementLimit,
    pub bullet: Option<ParticleState>,
    pub spawn_phase: SpawnPhase,
}

impl PlayerState {
    pub fn new(dimensions: &Dimensions) -> Self {
        let location = Self::respawn_location(dimensions);
        Self {
            alive: true,
            location,
            hitbox: Hitbox::new(location.x, location.y, PLAYER_WIDTH, PLAYER_HEIGHT),
            movement_limit: MovementLimit::Unrestricted,
            bullet: None,
            spawn_phase: SpawnPhase::Ready,
        }
    }

    /// Bottom center of the playfield
    pub fn respawn_location(dimensions: &Dimensions) -> Vec2 {
        Vec2::new(
            ((dimensions.width - PLAYER_WIDTH) / 2.0).floor(),
            dimensions.height - PLAYER_HEIGHT - dimensions.pixel_size * 4.0,
        )
    }

    pub fn center(&self) -> Vec2 {
        self.hitbox.center()
    }

    /// Alive and past the fly-in
    pub fn is_vulnerable(&self) -> bool {
        self.alive && matches!(self.spawn_phase, SpawnPhase::Ready)
    }

    pub fn colored_frame(&self) -> ColoredFrame {
        ColoredFrame::new(SpriteKind::Player, 0, palette::WHITE)
    }
}

/// Counters and flags for the whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub score: u64,
    pub lives: u8,
    /// 1-based level number
    pub level: u32,
    pub phasers: u8,
    pub paused: bool,
    pub bullets_fired: u32,
    pub enemies_hit: u32,
    /// Score at which the last bonus life was awarded
    pub last_bonus_score: u64,
    pub game_over: bool,
}

impl GameState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            score: 0,
            lives: settings.starting_lives,
            level: 1,
            phasers: settings.starting_phasers,
            paused: false,
            bullets_fired: 0,
            enemies_hit: 0,
            last_bonus_score: 0,
            game_over: false,
        }
    }
}

/// Level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Level number on screen, no combat
    Banner { until: Tick },
    /// Enemies about to be registered
    Spawning,
    Active,
    /// No enemies left; waiting for shrapnel to settle
    Clearing,
    Won,
    /// Survival timer ran out with the player alive
    TimedOut,
}

impl LevelPhase {
    /// Combat handlers only act in these phases
    pub fn is_combat(&self) -> bool {
        matches!(self, LevelPhase::Active | LevelPhase::Clearing)
    }
}

/// Enemies and everything they spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyLevelState {
    pub enemies: Vec<EnemyState>,
    pub bullets: Vec<ParticleState>,
    pub shrapnel: Vec<ParticleState>,
    pub explosion_centers: Vec<ExplosionCenterState>,
    pub phaser: PhaserState,
    /// Enemy count the level started with (difficulty compensation baseline)
    pub total_enemies: usize,
    pub phase: LevelPhase,
}

impl Default for EnemyLevelState {
    fn default() -> Self {
        Self {
            enemies: Vec::new(),
            bullets: Vec::new(),
            shrapnel: Vec::new(),
            explosion_centers: Vec::new(),
            phaser: PhaserState::Idle,
            total_enemies: 0,
            phase: LevelPhase::Spawning,
        }
    }
}

impl EnemyLevelState {
    pub fn enemy(&self, id: EnemyId) -> Option<&EnemyState> {
        self.enemies.iter().find(|e| e.enemy_id == id)
    }
}

/// Logical inputs for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub phaser: bool,
    pub self_destruct: bool,
    pub pause: bool,
}

impl Keys {
    /// Keys down now that were up in `previous`
    pub fn rising_since(&self, previous: &Keys) -> Keys {
        Keys {
            up: self.up && !previous.up,
            down: self.down && !previous.down,
            left: self.left && !previous.left,
            right: self.right && !previous.right,
            fire: self.fire && !previous.fire,
            phaser: self.phaser && !previous.phaser,
            self_destruct: self.self_destruct && !previous.self_destruct,
            pause: self.pause && !previous.pause,
        }
    }
}

/// Latest input snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardState {
    pub held: Keys,
    /// Pressed this frame
    pub pressed: Keys,
}

/// Debug switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggingState {
    pub immortal: bool,
    pub show_hitboxes: bool,
}

/// One immutable version of everything the store owns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    pub tick: Tick,
    pub player: Rc<PlayerState>,
    pub enemy_level: Rc<EnemyLevelState>,
    pub game: Rc<GameState>,
    pub keyboard: Rc<KeyboardState>,
    pub debugging: Rc<DebuggingState>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            tick: 0,
            player: Rc::new(PlayerState::new(&settings.dimensions)),
            enemy_level: Rc::new(EnemyLevelState::default()),
            game: Rc::new(GameState::new(settings)),
            keyboard: Rc::new(KeyboardState::default()),
            debugging: Rc::new(DebuggingState {
                immortal: settings.debug.immortal,
                show_hitboxes: settings.debug.show_hitboxes,
            }),
        }
    }
}

/// Statistics emitted once when a game ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub score: u64,
    pub bullets_fired: u32,
    pub enemies_hit: u32,
    pub level: u32,
}

impl GameResult {
    pub fn from_game(game: &GameState) -> Self {
        Self {
            score: game.score,
            bullets_fired: game.bullets_fired,
            enemies_hit: game.enemies_hit,
            level: game.level,
        }
    }

    /// Hits per shot, 0 when nothing was fired
    pub fn accuracy(&self) -> f32 {
        if self.bullets_fired == 0 {
            0.0
        } else {
            self.enemies_hit as f32 / self.bullets_fired as f32
        }
    }
}

/// Notable things that happened during a frame, for audio/UI consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BulletFired { enemy: Option<EnemyId> },
    EnemyHit { enemy: EnemyId },
    EnemyDestroyed { enemy: EnemyId, archetype: Archetype, points: u32 },
    PlayerDestroyed { lives_left: u8 },
    PlayerRespawned,
    PhaserFired { target: EnemyId },
    SelfDestruct { enemies: usize },
    ExtraLife,
    LevelStarted { level: u32 },
    LevelCompleted { level: u32, timed_out: bool },
    GameOver(GameResult),
}
