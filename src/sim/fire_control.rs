//! Targeting and fire control
//!
//! A level plugs in one `ShipsToFire` strategy. Each firing round the strategy
//! looks at a read-only view of the field and returns which enemies shoot and
//! at what angle; `fire` then turns the picks into bullets with a single
//! dispatch, so the bullets and the owners' fire ticks land together.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::bestiary::Bestiary;
use super::scheduler::FrameContext;
use super::state::{EnemyState, GameEvent, ParticleState, Tick};
use super::store::Action;
use crate::angle_difference;
use crate::consts::{ANGLE_DOWN, SPORADIC_FIRE_ODDS, VOLLEY_SPREAD};
use crate::error::EngineError;

/// One enemy cleared to fire this round
#[derive(Debug, Clone, PartialEq)]
pub struct ShipToFire {
    pub enemy: EnemyState,
    pub angle: f32,
}

/// What a strategy gets to look at
pub struct FireView<'a> {
    pub tick: Tick,
    pub enemies: &'a [EnemyState],
    /// Enemy bullets currently in flight
    pub bullets: &'a [ParticleState],
    /// Player center
    pub player: Vec2,
    pub bestiary: &'a Bestiary,
}

/// Selects which enemies fire this round
pub trait ShipsToFire {
    /// Cap on enemy bullets in flight
    fn max_bullets(&self) -> usize;

    fn select(&self, view: &FireView<'_>, rng: &mut Pcg32) -> Result<Vec<ShipToFire>, EngineError>;
}

/// Bullets still allowed under the cap
pub fn remaining_capacity(max_bullets: usize, bullets: &[ParticleState]) -> usize {
    max_bullets.saturating_sub(bullets.len())
}

/// Enemies whose own eligibility check passes at `tick`
pub fn eligible<'a>(view: &FireView<'a>) -> Result<Vec<&'a EnemyState>, EngineError> {
    let mut out = Vec::new();
    for enemy in view.enemies {
        if view.bestiary.can_fire(enemy, view.tick)? {
            out.push(enemy);
        }
    }
    Ok(out)
}

/// True when few enough enemies remain that each may hold several bullets
pub fn owner_cap_relaxed(remaining_enemies: usize, max_bullets: usize) -> bool {
    remaining_enemies < max_bullets
}

/// Drop enemies that already have a bullet on screen, unless the cap is relaxed
pub fn without_bullets_in_flight<'a>(
    candidates: Vec<&'a EnemyState>,
    bullets: &[ParticleState],
    remaining_enemies: usize,
    max_bullets: usize,
) -> Vec<&'a EnemyState> {
    if owner_cap_relaxed(remaining_enemies, max_bullets) {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|e| !bullets.iter().any(|b| b.owner == Some(e.enemy_id)))
        .collect()
}

/// Majority vote: are more enemies below the player line than above it?
/// A tie counts as "above".
pub fn majority_below(enemies: &[EnemyState], player_y: f32) -> bool {
    let below = enemies.iter().filter(|e| e.center.y > player_y).count();
    below * 2 > enemies.len()
}

/// Sort by targeting quality: smallest angle difference first when the
/// majority is below the player, largest first otherwise. Stable.
pub fn rank_by_targeting(candidates: &mut [(ShipToFire, f32)], below: bool) {
    if below {
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    } else {
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    }
}

/// Cap `ranked` at `remaining`. With `fill`, a pool smaller than `remaining`
/// is topped up by repeating the best candidate, fanned out around its angle.
pub fn fill_volley(mut ranked: Vec<ShipToFire>, remaining: usize, fill: bool) -> Vec<ShipToFire> {
    ranked.truncate(remaining);
    if !fill || ranked.is_empty() {
        return ranked;
    }
    let best = ranked[0].clone();
    let mut repeat: u32 = 1;
    while ranked.len() < remaining {
        let side = if repeat % 2 == 1 { 1.0 } else { -1.0 };
        let step = repeat.div_ceil(2) as f32;
        ranked.push(ShipToFire {
            enemy: best.enemy.clone(),
            angle: crate::normalize_angle(best.angle + side * step * VOLLEY_SPREAD),
        });
        repeat += 1;
    }
    ranked
}

/// Ranked shooters at their intrinsic angles (diagonal and aimed ships)
#[derive(Debug, Clone, Copy)]
pub struct AimedSalvo {
    pub max_bullets: usize,
}

impl ShipsToFire for AimedSalvo {
    fn max_bullets(&self) -> usize {
        self.max_bullets
    }

    fn select(&self, view: &FireView<'_>, _rng: &mut Pcg32) -> Result<Vec<ShipToFire>, EngineError> {
        let remaining = remaining_capacity(self.max_bullets, view.bullets);
        if remaining == 0 {
            return Ok(Vec::new());
        }
        let candidates = without_bullets_in_flight(
            eligible(view)?,
            view.bullets,
            view.enemies.len(),
            self.max_bullets,
        );
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = Vec::with_capacity(candidates.len());
        for enemy in candidates {
            let angle = view.bestiary.fire_angle(enemy.archetype)?.fire_angle(enemy, view.player);
            let to_player = crate::angle_towards(enemy.center, view.player);
            scored.push((
                ShipToFire {
                    enemy: enemy.clone(),
                    angle,
                },
                angle_difference(to_player, angle),
            ));
        }
        rank_by_targeting(&mut scored, majority_below(view.enemies, view.player.y));

        let ranked = scored.into_iter().map(|(ship, _)| ship).collect();
        let relaxed = owner_cap_relaxed(view.enemies.len(), self.max_bullets);
        Ok(fill_volley(ranked, remaining, relaxed))
    }
}

/// How a straight-down strategy chooses its single shooter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Random,
    LastSpawned,
}

/// One shooter per round, straight down, optionally only 1-in-N rounds
#[derive(Debug, Clone, Copy)]
pub struct StraightDown {
    pub max_bullets: usize,
    pub pick: Pick,
    pub odds: Option<u32>,
}

impl StraightDown {
    /// Three bullets on screen at most, a random eligible ship every round
    pub fn max_three_down() -> Self {
        Self {
            max_bullets: 3,
            pick: Pick::Random,
            odds: None,
        }
    }

    /// Occasional potshots from random ships
    pub fn sporadic(max_bullets: usize) -> Self {
        Self {
            max_bullets,
            pick: Pick::Random,
            odds: Some(SPORADIC_FIRE_ODDS),
        }
    }

    /// The newest ship on the field does the shooting
    pub fn last_spawned(max_bullets: usize) -> Self {
        Self {
            max_bullets,
            pick: Pick::LastSpawned,
            odds: None,
        }
    }
}

impl ShipsToFire for StraightDown {
    fn max_bullets(&self) -> usize {
        self.max_bullets
    }

    fn select(&self, view: &FireView<'_>, rng: &mut Pcg32) -> Result<Vec<ShipToFire>, EngineError> {
        if remaining_capacity(self.max_bullets, view.bullets) == 0 {
            return Ok(Vec::new());
        }
        let candidates = without_bullets_in_flight(
            eligible(view)?,
            view.bullets,
            view.enemies.len(),
            self.max_bullets,
        );
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(n) = self.odds {
            if !rng.random_ratio(1, n.max(1)) {
                return Ok(Vec::new());
            }
        }

        let chosen = match self.pick {
            Pick::Random => candidates.choose(rng).copied(),
            Pick::LastSpawned => candidates
                .iter()
                .max_by_key(|e| (e.spawned_at, e.enemy_id))
                .copied(),
        };
        let Some(enemy) = chosen else {
            return Ok(Vec::new());
        };
        // Shooting requires a provider even though the angle is fixed
        view.bestiary.fire_angle(enemy.archetype)?;
        Ok(vec![ShipToFire {
            enemy: enemy.clone(),
            angle: ANGLE_DOWN,
        }])
    }
}

/// Run one firing round: select, build bullets at the muzzles, dispatch once.
/// Returns how many bullets were fired.
pub fn fire(ctx: &mut FrameContext<'_>, strategy: &dyn ShipsToFire) -> Result<usize, EngineError> {
    let state = ctx.snapshot();
    if !state.player.alive {
        return Ok(0);
    }
    let level = &state.enemy_level;
    let tick = ctx.tick;

    let world = &mut *ctx.world;
    let view = FireView {
        tick,
        enemies: &level.enemies,
        bullets: &level.bullets,
        player: state.player.center(),
        bestiary: &world.bestiary,
    };
    let ships = strategy.select(&view, &mut world.rng)?;
    if ships.is_empty() {
        return Ok(0);
    }

    let mut bullets = Vec::with_capacity(ships.len());
    for ship in &ships {
        let profile = world.bestiary.profile(ship.enemy.archetype)?;
        let b = &profile.bullet;
        let muzzle = ship.enemy.center + profile.muzzle;
        bullets.push(
            ParticleState::new(
                world.store.allocate_id(),
                b.frame,
                muzzle.x - b.width / 2.0,
                muzzle.y - b.height / 2.0,
                b.width,
                b.height,
            )
            .with_motion(b.speed, ship.angle, b.acceleration)
            .owned_by(ship.enemy.enemy_id),
        );
    }

    let count = bullets.len();
    log::debug!("tick {tick}: {count} enemy bullet(s) fired");
    for ship in &ships {
        ctx.emit(GameEvent::BulletFired {
            enemy: Some(ship.enemy.enemy_id),
        });
    }
    ctx.dispatch(Action::FireBullets { bullets, tick });
    Ok(count)
}
