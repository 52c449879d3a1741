//! Enemy archetypes as data
//!
//! Each archetype is a profile that plugs in a movement provider, a fire-angle
//! provider and a fire-eligibility check. Code never branches on the archetype
//! itself; it looks the profile up here.

use std::collections::BTreeMap;

use glam::Vec2;

use super::assets::{Color, ColoredExplosion, ColoredFrame, ExplosionKind, SpriteKind, palette};
use super::hitbox::Hitbox;
use super::movement::{Bounce, Dive, Drift, Formation, MovementProvider};
use super::state::{Archetype, EnemyId, EnemyState, Tick};
use crate::angle_towards;
use crate::consts::{ANGLE_DOWN, ENEMY_BULLET_HEIGHT, ENEMY_BULLET_WIDTH, MIN_FIRE_SPACING};
use crate::error::EngineError;

/// The angle an enemy shoots at, before any targeting strategy weighs in
pub trait FireAngleProvider {
    fn fire_angle(&self, enemy: &EnemyState, player: Vec2) -> f32;
}

/// Always straight down
#[derive(Debug, Clone, Copy, Default)]
pub struct FireDown;

impl FireAngleProvider for FireDown {
    fn fire_angle(&self, _enemy: &EnemyState, _player: Vec2) -> f32 {
        ANGLE_DOWN
    }
}

/// Along the ship's current heading (diagonal shooters)
#[derive(Debug, Clone, Copy, Default)]
pub struct Heading;

impl FireAngleProvider for Heading {
    fn fire_angle(&self, enemy: &EnemyState, _player: Vec2) -> f32 {
        enemy.angle
    }
}

/// Directly at the player
#[derive(Debug, Clone, Copy, Default)]
pub struct AimAtPlayer;

impl FireAngleProvider for AimAtPlayer {
    fn fire_angle(&self, enemy: &EnemyState, player: Vec2) -> f32 {
        angle_towards(enemy.center, player)
    }
}

/// Whether an enemy may be considered for firing at all this tick
pub trait FireEligibility {
    fn can_fire(&self, enemy: &EnemyState, tick: Tick) -> bool;
}

/// More than `.0` ticks since the last shot
#[derive(Debug, Clone, Copy)]
pub struct MinSpacing(pub u64);

impl FireEligibility for MinSpacing {
    fn can_fire(&self, enemy: &EnemyState, tick: Tick) -> bool {
        tick.saturating_sub(enemy.last_fire_tick) > self.0
    }
}

/// Never fires (rocks)
#[derive(Debug, Clone, Copy, Default)]
pub struct Unarmed;

impl FireEligibility for Unarmed {
    fn can_fire(&self, _enemy: &EnemyState, _tick: Tick) -> bool {
        false
    }
}

/// Bullet an archetype fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletProfile {
    pub frame: ColoredFrame,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub acceleration: f32,
}

impl BulletProfile {
    fn standard(color: Color, speed: f32) -> Self {
        Self {
            frame: ColoredFrame::new(SpriteKind::EnemyBullet, 0, color),
            width: ENEMY_BULLET_WIDTH,
            height: ENEMY_BULLET_HEIGHT,
            speed,
            acceleration: 1.0,
        }
    }
}

/// Everything that distinguishes one archetype from another
pub struct ArchetypeProfile {
    pub sprite: SpriteKind,
    pub color: Color,
    pub size: Vec2,
    pub frames: u8,
    /// Ticks per animation frame
    pub frame_interval: u64,
    pub hitpoints: u32,
    pub points: u32,
    pub speed: f32,
    pub explosion: ExplosionKind,
    pub movement: Box<dyn MovementProvider>,
    /// `None` for archetypes that cannot shoot
    pub fire_angle: Option<Box<dyn FireAngleProvider>>,
    pub eligibility: Box<dyn FireEligibility>,
    pub bullet: BulletProfile,
    /// Bullet origin relative to the ship's center
    pub muzzle: Vec2,
}

/// Profiles by archetype
#[derive(Default)]
pub struct Bestiary {
    profiles: BTreeMap<Archetype, ArchetypeProfile>,
}

impl Bestiary {
    /// The stock roster with the default fire spacing
    pub fn standard() -> Self {
        Self::with_spacing(MIN_FIRE_SPACING)
    }

    /// The stock roster, ships refiring no sooner than `spacing` ticks
    pub fn with_spacing(spacing: u64) -> Self {
        let mut bestiary = Self::default();

        bestiary.insert(
            Archetype::Scout,
            ArchetypeProfile {
                sprite: SpriteKind::Scout,
                color: palette::GREEN,
                size: Vec2::new(33.0, 24.0),
                frames: 2,
                frame_interval: 20,
                hitpoints: 1,
                points: 100,
                speed: 1.0,
                explosion: ExplosionKind::Small,
                movement: Box::new(Formation::default()),
                fire_angle: Some(Box::new(FireDown)),
                eligibility: Box::new(MinSpacing(spacing)),
                bullet: BulletProfile::standard(palette::GREEN, 4.0),
                muzzle: Vec2::new(0.0, 12.0),
            },
        );
        bestiary.insert(
            Archetype::Diver,
            ArchetypeProfile {
                sprite: SpriteKind::Diver,
                color: palette::ORANGE,
                size: Vec2::new(30.0, 30.0),
                frames: 2,
                frame_interval: 12,
                hitpoints: 1,
                points: 200,
                speed: 2.5,
                explosion: ExplosionKind::Small,
                movement: Box::new(Dive::default()),
                fire_angle: Some(Box::new(Heading)),
                eligibility: Box::new(MinSpacing(spacing)),
                bullet: BulletProfile::standard(palette::ORANGE, 5.0),
                muzzle: Vec2::new(0.0, 15.0),
            },
        );
        bestiary.insert(
            Archetype::Gunship,
            ArchetypeProfile {
                sprite: SpriteKind::Gunship,
                color: palette::RED,
                size: Vec2::new(45.0, 33.0),
                frames: 3,
                frame_interval: 15,
                hitpoints: 3,
                points: 300,
                speed: 0.8,
                explosion: ExplosionKind::Large,
                movement: Box::new(Formation {
                    sway: 24.0,
                    ..Default::default()
                }),
                fire_angle: Some(Box::new(AimAtPlayer)),
                eligibility: Box::new(MinSpacing(spacing + spacing / 2)),
                bullet: BulletProfile {
                    acceleration: 1.01,
                    ..BulletProfile::standard(palette::RED, 3.5)
                },
                muzzle: Vec2::new(0.0, 16.0),
            },
        );
        bestiary.insert(
            Archetype::Sweeper,
            ArchetypeProfile {
                sprite: SpriteKind::Sweeper,
                color: palette::MAGENTA,
                size: Vec2::new(36.0, 21.0),
                frames: 2,
                frame_interval: 10,
                hitpoints: 2,
                points: 250,
                speed: 2.0,
                explosion: ExplosionKind::Small,
                movement: Box::new(Bounce::default()),
                fire_angle: Some(Box::new(Heading)),
                eligibility: Box::new(MinSpacing(spacing)),
                bullet: BulletProfile::standard(palette::MAGENTA, 4.5),
                muzzle: Vec2::new(0.0, 10.0),
            },
        );
        bestiary.insert(
            Archetype::Asteroid,
            ArchetypeProfile {
                sprite: SpriteKind::Asteroid,
                color: palette::GREY,
                size: Vec2::new(36.0, 36.0),
                frames: 4,
                frame_interval: 10,
                hitpoints: 2,
                points: 50,
                speed: 1.5,
                explosion: ExplosionKind::Rubble,
                movement: Box::new(Drift),
                fire_angle: None,
                eligibility: Box::new(Unarmed),
                bullet: BulletProfile::standard(palette::GREY, 0.0),
                muzzle: Vec2::ZERO,
            },
        );
        bestiary.insert(
            Archetype::Mothership,
            ArchetypeProfile {
                sprite: SpriteKind::Mothership,
                color: palette::YELLOW,
                size: Vec2::new(72.0, 36.0),
                frames: 2,
                frame_interval: 30,
                hitpoints: 8,
                points: 1000,
                speed: 1.2,
                explosion: ExplosionKind::Large,
                movement: Box::new(Bounce { floor: 0.35 }),
                fire_angle: Some(Box::new(AimAtPlayer)),
                eligibility: Box::new(MinSpacing(spacing / 2)),
                bullet: BulletProfile {
                    acceleration: 1.02,
                    ..BulletProfile::standard(palette::YELLOW, 3.0)
                },
                muzzle: Vec2::new(0.0, 18.0),
            },
        );

        bestiary
    }

    pub fn insert(&mut self, archetype: Archetype, profile: ArchetypeProfile) {
        self.profiles.insert(archetype, profile);
    }

    pub fn remove(&mut self, archetype: Archetype) -> Option<ArchetypeProfile> {
        self.profiles.remove(&archetype)
    }

    pub fn profile(&self, archetype: Archetype) -> Result<&ArchetypeProfile, EngineError> {
        self.profiles
            .get(&archetype)
            .ok_or(EngineError::UnknownArchetype(archetype))
    }

    /// Fire-angle provider for an archetype that is expected to shoot
    pub fn fire_angle(&self, archetype: Archetype) -> Result<&dyn FireAngleProvider, EngineError> {
        self.profile(archetype)?
            .fire_angle
            .as_deref()
            .ok_or(EngineError::MissingFireAngle(archetype))
    }

    pub fn can_fire(&self, enemy: &EnemyState, tick: Tick) -> Result<bool, EngineError> {
        Ok(self.profile(enemy.archetype)?.eligibility.can_fire(enemy, tick))
    }

    /// A fresh enemy centered at `center`, heading along `angle`
    pub fn spawn(
        &self,
        archetype: Archetype,
        id: EnemyId,
        center: Vec2,
        angle: f32,
        tick: Tick,
    ) -> Result<EnemyState, EngineError> {
        let p = self.profile(archetype)?;
        Ok(EnemyState {
            enemy_id: id,
            archetype,
            sprite: p.sprite,
            color: p.color,
            hitbox: Hitbox::centered(center, p.size.x, p.size.y),
            center,
            current_frame_index: 0,
            last_fire_tick: tick,
            hitpoints: p.hitpoints,
            points: p.points,
            explosion: ColoredExplosion::new(p.explosion, p.color),
            angle,
            base_speed: p.speed,
            speed: p.speed,
            anchor: center,
            sway_phase: 0.0,
            spawned_at: tick,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::test_support::enemy;

    #[test]
    fn test_every_archetype_has_a_profile() {
        let bestiary = Bestiary::standard();
        for a in [
            Archetype::Scout,
            Archetype::Diver,
            Archetype::Gunship,
            Archetype::Sweeper,
            Archetype::Asteroid,
            Archetype::Mothership,
        ] {
            assert!(bestiary.profile(a).is_ok(), "{a:?}");
        }
    }

    #[test]
    fn test_missing_profile_is_an_error() {
        let empty = Bestiary::default();
        assert!(matches!(
            empty.profile(Archetype::Scout),
            Err(EngineError::UnknownArchetype(Archetype::Scout))
        ));
    }

    #[test]
    fn test_scouts_fire_down_wherever_the_player_is() {
        let bestiary = Bestiary::standard();
        let scout = enemy(1, 100.0, 100.0);
        let provider = bestiary.fire_angle(Archetype::Scout).unwrap();
        for player in [Vec2::new(0.0, 600.0), Vec2::new(500.0, 50.0)] {
            assert_eq!(provider.fire_angle(&scout, player), ANGLE_DOWN);
        }
        assert_eq!(FireDown.fire_angle(&scout, Vec2::ZERO), ANGLE_DOWN);
    }

    #[test]
    fn test_asteroid_has_no_fire_angle() {
        let bestiary = Bestiary::standard();
        assert!(matches!(
            bestiary.fire_angle(Archetype::Asteroid),
            Err(EngineError::MissingFireAngle(Archetype::Asteroid))
        ));
        let rock = bestiary
            .spawn(Archetype::Asteroid, 1, Vec2::new(100.0, 100.0), ANGLE_DOWN, 0)
            .unwrap();
        assert!(!bestiary.can_fire(&rock, 10_000).unwrap());
    }

    #[test]
    fn test_min_spacing_is_exclusive() {
        let mut e = enemy(1, 0.0, 0.0);
        e.last_fire_tick = 100;
        assert!(!MinSpacing(50).can_fire(&e, 150));
        assert!(MinSpacing(50).can_fire(&e, 151));
    }

    #[test]
    fn test_spawn_starts_fire_clock_at_spawn() {
        let bestiary = Bestiary::standard();
        let e = bestiary
            .spawn(Archetype::Gunship, 7, Vec2::new(200.0, 150.0), ANGLE_DOWN, 40)
            .unwrap();
        assert_eq!(e.last_fire_tick, 40);
        assert_eq!(e.hitpoints, 3);
        assert_eq!(e.hitbox.center(), Vec2::new(200.0, 150.0));
        assert_eq!(e.anchor, e.center);
    }

    #[test]
    fn test_aim_at_player() {
        let e = enemy(1, 100.0, 100.0);
        let angle = AimAtPlayer.fire_angle(&e, Vec2::new(100.0, 300.0));
        assert!((angle - ANGLE_DOWN).abs() < 1e-5);
    }
}
