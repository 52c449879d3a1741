//! Collision detection and hit resolution
//!
//! Detection is a pure function of one snapshot, so the player and an enemy
//! never trade hits against positions from two different versions of the
//! field. Resolution then dispatches the consequences, each exactly once.

use super::assets::{ColoredExplosion, ExplosionKind, palette};
use super::hitbox::Hitbox;
use super::particles::dispatch_explosion;
use super::scheduler::FrameContext;
use super::state::{AppState, EnemyId, EntityId, GameEvent, PlayerState, SpawnPhase};
use super::store::Action;

/// Something the player can crash into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hittable {
    Enemy(EnemyId),
    Bullet(EntityId),
    Shrapnel(EntityId),
}

/// Overlaps found in one snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collisions {
    /// First hittable overlapping the player
    pub player: Option<Hittable>,
    /// First enemy overlapping the player's bullet
    pub bullet: Option<EnemyId>,
}

impl Collisions {
    pub fn is_empty(&self) -> bool {
        self.player.is_none() && self.bullet.is_none()
    }
}

/// Find this tick's collisions
pub fn detect(state: &AppState) -> Collisions {
    let level = &state.enemy_level;
    let player = &state.player;
    let mut found = Collisions::default();

    if player.is_vulnerable() && !state.debugging.immortal {
        let hittables = level
            .enemies
            .iter()
            .map(|e| (Hittable::Enemy(e.enemy_id), &e.hitbox))
            .chain(level.bullets.iter().map(|b| (Hittable::Bullet(b.id), &b.hitbox)))
            .chain(level.shrapnel.iter().map(|s| (Hittable::Shrapnel(s.id), &s.hitbox)));
        found.player = first_overlap(&player.hitbox, hittables);
    }

    if let Some(bullet) = &player.bullet {
        let enemies = level.enemies.iter().map(|e| (e.enemy_id, &e.hitbox));
        found.bullet = first_overlap(&bullet.hitbox, enemies);
    }

    found
}

fn first_overlap<'a, T>(
    subject: &Hitbox,
    others: impl IntoIterator<Item = (T, &'a Hitbox)>,
) -> Option<T> {
    others
        .into_iter()
        .find(|(_, hitbox)| subject.overlaps(hitbox))
        .map(|(id, _)| id)
}

/// Dispatch everything `collisions` implies
pub fn resolve(ctx: &mut FrameContext<'_>, collisions: &Collisions) {
    if let Some(enemy) = collisions.bullet {
        ctx.dispatch(Action::SetPlayerBullet(None));
        ctx.dispatch(Action::EnemyHit);
        ctx.emit(GameEvent::EnemyHit { enemy });
        hit_enemy(ctx, enemy);
    }

    if let Some(by) = collisions.player {
        if let Hittable::Bullet(id) = by {
            ctx.dispatch(Action::RemoveBullet(id));
        }
        destroy_player(ctx);
    }
}

/// Take one hitpoint; destroy the enemy when it runs out
pub fn hit_enemy(ctx: &mut FrameContext<'_>, id: EnemyId) {
    let state = ctx.snapshot();
    let Some(enemy) = state.enemy_level.enemy(id) else {
        return;
    };
    if enemy.hitpoints > 1 {
        ctx.dispatch(Action::DamageEnemy(id));
        let flash = ColoredExplosion::new(ExplosionKind::Pop, enemy.color).asset();
        let tick = ctx.tick;
        dispatch_explosion(ctx, enemy.center.x, enemy.center.y, &flash, tick);
    } else {
        destroy_enemy(ctx, id);
    }
}

/// Destroy an enemy: boost survivors, remove, explode, score.
/// Returns `false` if the enemy was already gone.
pub fn destroy_enemy(ctx: &mut FrameContext<'_>, id: EnemyId) -> bool {
    let state = ctx.snapshot();
    let level = &state.enemy_level;
    let Some(enemy) = level.enemy(id) else {
        return false;
    };
    let tick = ctx.tick;

    ctx.dispatch(Action::BoostSurvivors {
        total: level.total_enemies,
        dying: id,
    });
    ctx.dispatch(Action::RemoveEnemy(id));
    dispatch_explosion(ctx, enemy.center.x, enemy.center.y, &enemy.explosion.asset(), tick);
    ctx.dispatch(Action::IncreaseScore(enemy.points as u64));

    log::debug!("enemy {id} ({:?}) destroyed for {} points", enemy.archetype, enemy.points);
    ctx.emit(GameEvent::EnemyDestroyed {
        enemy: id,
        archetype: enemy.archetype,
        points: enemy.points,
    });
    award_extra_lives(ctx);
    true
}

/// One bonus life per `extra_life_every` points since the last bonus
pub fn award_extra_lives(ctx: &mut FrameContext<'_>) {
    let every = ctx.settings().extra_life_every;
    if every == 0 {
        return;
    }
    let game = ctx.snapshot().game.clone();
    let mut last = game.last_bonus_score;
    while game.score >= last + every {
        last += every;
        ctx.dispatch(Action::AddLife);
        ctx.emit(GameEvent::ExtraLife);
        log::info!("extra life at {last} points");
    }
    if last != game.last_bonus_score {
        ctx.dispatch(Action::SetLastBonusScore(last));
    }
}

/// Kill the player: explode, lose a life, clear the bullet, queue the respawn
pub fn destroy_player(ctx: &mut FrameContext<'_>) {
    let state = ctx.snapshot();
    let player = &state.player;
    if !player.alive {
        return;
    }
    let tick = ctx.tick;
    let center = player.center();
    let asset = ColoredExplosion::new(ExplosionKind::Player, palette::WHITE).asset();

    dispatch_explosion(ctx, center.x, center.y, &asset, tick);
    ctx.dispatch(Action::RemoveLife);
    ctx.dispatch(Action::SetPlayerAlive(false));
    ctx.dispatch(Action::SetPlayerBullet(None));
    ctx.dispatch(Action::SetSpawnPhase(SpawnPhase::Waiting { since: tick }));
    let respawn = PlayerState::respawn_location(&ctx.settings().dimensions);
    ctx.dispatch(Action::SetPlayerLocation(respawn));

    let lives_left = ctx.snapshot().game.lives;
    log::info!("player destroyed at tick {tick}, {lives_left} lives left");
    ctx.emit(GameEvent::PlayerDestroyed { lives_left });
    if lives_left == 0 {
        ctx.dispatch(Action::SetGameOver);
    }
}

/// Detonate every enemy at once. No score, no survivors to boost.
pub fn self_destruct(ctx: &mut FrameContext<'_>) -> usize {
    let state = ctx.snapshot();
    let enemies = &state.enemy_level.enemies;
    if enemies.is_empty() {
        return 0;
    }
    let tick = ctx.tick;
    for enemy in enemies {
        dispatch_explosion(ctx, enemy.center.x, enemy.center.y, &enemy.explosion.asset(), tick);
    }
    ctx.dispatch(Action::SetEnemies(Vec::new()));
    log::info!("self-destruct took out {} enemies", enemies.len());
    ctx.emit(GameEvent::SelfDestruct {
        enemies: enemies.len(),
    });
    enemies.len()
}
