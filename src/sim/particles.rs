//! Particle and explosion lifecycle
//!
//! Bullets and shrapnel move in a straight line, speed scaled by their
//! acceleration each tick, and vanish the moment they would leave the field.
//! Explosion centers sit still and expire by tick count.

use super::assets::ExplosionAsset;
use super::draw;
use super::hitbox::Hitbox;
use super::scheduler::{FrameContext, UpdateHandler};
use super::state::{EntityId, ExplosionCenterState, ParticleState, Tick};
use super::store::Action;
use crate::consts::SHRAPNEL_SIZE;
use crate::direction;
use crate::error::EngineError;

/// Next position of a particle, or `None` once it leaves `bounds`
pub fn advance_particle(particle: &ParticleState, bounds: &Hitbox) -> Option<ParticleState> {
    let step = direction(particle.angle) * particle.speed;
    let mut next = particle.clone();
    next.place(particle.left + step.x, particle.top + step.y);
    next.speed *= particle.acceleration;
    next.hitbox.is_within(bounds).then_some(next)
}

/// Advance a whole collection, dropping whatever left the field
pub fn age_particles(particles: &[ParticleState], bounds: &Hitbox) -> Vec<ParticleState> {
    particles
        .iter()
        .filter_map(|p| advance_particle(p, bounds))
        .collect()
}

/// Explosion centers still within their delay at `tick`
pub fn live_centers(centers: &[ExplosionCenterState], tick: Tick) -> Vec<ExplosionCenterState> {
    centers.iter().filter(|c| !c.expired(tick)).cloned().collect()
}

/// Build one explosion: a center flash at (left, top) and one shrapnel
/// particle per asset angle
pub fn explosion_batch(
    mut next_id: impl FnMut() -> EntityId,
    left: f32,
    top: f32,
    asset: &ExplosionAsset,
    tick: Tick,
) -> (ExplosionCenterState, Vec<ParticleState>) {
    let center = ExplosionCenterState {
        id: next_id(),
        left,
        top,
        start_tick: tick,
        explosion_center_delay: asset.center_delay,
        frame: asset.center_frame,
    };
    let half = SHRAPNEL_SIZE / 2.0;
    let shrapnel = asset
        .angles
        .iter()
        .enumerate()
        .map(|(i, &angle)| {
            ParticleState::new(
                next_id(),
                asset.shrapnel_frame,
                left - half,
                top - half,
                SHRAPNEL_SIZE,
                SHRAPNEL_SIZE,
            )
            .with_motion(asset.speed.speed_for(i), angle, asset.acceleration)
        })
        .collect();
    (center, shrapnel)
}

/// Spawn an explosion batch into the store
pub fn dispatch_explosion(
    ctx: &mut FrameContext<'_>,
    left: f32,
    top: f32,
    asset: &ExplosionAsset,
    tick: Tick,
) {
    let store = &mut ctx.world.store;
    let (center, shrapnel) = explosion_batch(|| store.allocate_id(), left, top, asset, tick);
    log::debug!(
        "explosion at ({left:.0}, {top:.0}) with {} shrapnel",
        shrapnel.len()
    );
    ctx.dispatch(Action::AddExplosion { center, shrapnel });
}

/// Generic aging for enemy bullets, shrapnel and explosion centers
#[derive(Debug, Default)]
pub struct ParticleHandler;

impl UpdateHandler for ParticleHandler {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        let state = ctx.snapshot();
        let level = &state.enemy_level;
        let bounds = ctx.settings().dimensions.bounds();

        if !level.bullets.is_empty() {
            ctx.dispatch(Action::SetBullets(age_particles(&level.bullets, &bounds)));
        }
        if !level.shrapnel.is_empty() {
            ctx.dispatch(Action::SetShrapnel(age_particles(&level.shrapnel, &bounds)));
        }
        if !level.explosion_centers.is_empty() {
            let live = live_centers(&level.explosion_centers, ctx.tick);
            if live.len() != level.explosion_centers.len() {
                ctx.dispatch(Action::SetExplosionCenters(live));
            }
        }

        let aged = ctx.snapshot();
        draw::queue_particles(ctx.draws, &aged.enemy_level);
        Ok(())
    }
}
