//! Level lifecycle
//!
//! Banner -> Spawning -> Active -> Clearing -> Won, or Active -> TimedOut for
//! survival levels. A level registers its own combat handler (and any overlay)
//! when combat starts and removes every one of them on dispose, together with
//! any movement limit it put on the player.

use std::rc::Rc;

use glam::Vec2;
use rand::Rng;

use super::combat::CombatHandler;
use super::draw::{self, SurvivalTimer};
use super::fire_control::ShipsToFire;
use super::scheduler::{FrameContext, HandlerId, Stage, UpdateHandler};
use super::state::{Archetype, EnemyState, GameEvent, LevelPhase, MovementLimit, PlayerState, Tick};
use super::store::Action;
use crate::error::EngineError;

/// Ticks the player spends flying off the top after a level is won
pub const WARP_OUT_TICKS: u64 = 60;

/// How a level is won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinCondition {
    /// Destroy everything
    Clear,
    /// Stay alive for `ticks` after combat starts
    Survive { ticks: u64 },
    /// Destroy `cap` enemies in total; no more than `concurrent` on the field,
    /// a replacement at most every `interval` ticks
    Attrition {
        cap: usize,
        concurrent: usize,
        interval: u64,
    },
}

/// One enemy placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    pub archetype: Archetype,
    pub at: Vec2,
    pub angle: f32,
}

/// Everything the factory hands over for one level
pub struct LevelPlan {
    pub title: String,
    pub enemies: Vec<EnemySpawn>,
    pub win: WinCondition,
    /// `None` for levels where nothing shoots
    pub fire_control: Option<Rc<dyn ShipsToFire>>,
    /// Ticks between firing rounds
    pub fire_interval: u64,
    /// Restriction on the player for the whole level
    pub movement_limit: MovementLimit,
    /// Multiplier on every spawned enemy's speed
    pub speed_scale: f32,
}

impl LevelPlan {
    pub fn validate(&self, level: u32) -> Result<(), EngineError> {
        let invalid = |details: &str| EngineError::InvalidLevel {
            level,
            details: details.to_string(),
        };
        if self.enemies.is_empty() {
            return Err(invalid("no enemies"));
        }
        if self.speed_scale <= 0.0 {
            return Err(invalid("speed scale must be positive"));
        }
        if self.fire_control.is_some() && self.fire_interval == 0 {
            return Err(invalid("fire control without a fire interval"));
        }
        match self.win {
            WinCondition::Clear => {}
            WinCondition::Survive { ticks } if ticks == 0 => {
                return Err(invalid("survival timer of zero ticks"));
            }
            WinCondition::Survive { .. } => {}
            WinCondition::Attrition {
                cap, concurrent, ..
            } => {
                if concurrent == 0 || cap < concurrent {
                    return Err(invalid("attrition cap must cover the concurrent count"));
                }
            }
        }
        Ok(())
    }
}

/// Level content, invoked once per level transition
pub trait LevelFactory {
    fn build(&self, level: u32) -> Result<LevelPlan, EngineError>;
}

/// How a finished level ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutcome {
    pub timed_out: bool,
}

/// One running level
pub struct Level {
    number: u32,
    plan: LevelPlan,
    handlers: Vec<HandlerId>,
    active_since: Tick,
    spawned: usize,
    last_spawn: Tick,
    warp_until: Option<Tick>,
}

impl Level {
    pub fn new(number: u32, plan: LevelPlan) -> Self {
        Self {
            number,
            plan,
            handlers: Vec::new(),
            active_since: 0,
            spawned: 0,
            last_spawn: 0,
            warp_until: None,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Show the banner, bring the player back from any warp-out and impose
    /// the level's movement limit
    pub fn begin(&mut self, ctx: &mut FrameContext<'_>) {
        let until = ctx.tick + ctx.settings().banner_ticks;
        let start = PlayerState::respawn_location(&ctx.settings().dimensions);
        ctx.dispatch(Action::SetLevelPhase(LevelPhase::Banner { until }));
        ctx.dispatch(Action::SetPlayerLocation(start));
        ctx.dispatch(Action::SetMovementLimit(self.plan.movement_limit));
        log::info!("level {} ({}) begins", self.number, self.plan.title);
        ctx.emit(GameEvent::LevelStarted { level: self.number });
    }

    /// Remove everything this level registered and undo its player restrictions
    pub fn dispose(&mut self, ctx: &mut FrameContext<'_>) {
        for id in self.handlers.drain(..) {
            ctx.hooks.unregister(id);
        }
        ctx.dispatch(Action::SetMovementLimit(MovementLimit::Unrestricted));
        ctx.dispatch(Action::ClearLevel);
    }

    /// Advance the phase machine. Returns the outcome once the warp-out is over.
    pub fn step(&mut self, ctx: &mut FrameContext<'_>) -> Result<Option<LevelOutcome>, EngineError> {
        let state = ctx.snapshot();
        let level = &state.enemy_level;
        let tick = ctx.tick;

        match level.phase {
            LevelPhase::Banner { until } => {
                draw::queue_banner(ctx.draws, &ctx.world.settings.dimensions, self.number, &self.plan.title);
                if tick >= until {
                    ctx.dispatch(Action::SetLevelPhase(LevelPhase::Spawning));
                }
            }
            LevelPhase::Spawning => self.start_combat(ctx)?,
            LevelPhase::Active => match self.plan.win {
                WinCondition::Clear => {
                    if level.enemies.is_empty() {
                        ctx.dispatch(Action::SetLevelPhase(LevelPhase::Clearing));
                    }
                }
                WinCondition::Survive { ticks } => {
                    if level.enemies.is_empty() {
                        ctx.dispatch(Action::SetLevelPhase(LevelPhase::Clearing));
                    } else if state.player.alive && tick.saturating_sub(self.active_since) >= ticks {
                        // Survivors leave the field; no points for them
                        ctx.dispatch(Action::SetEnemies(Vec::new()));
                        ctx.dispatch(Action::SetLevelPhase(LevelPhase::TimedOut));
                    }
                }
                WinCondition::Attrition {
                    cap,
                    concurrent,
                    interval,
                } => {
                    let on_field = level.enemies.len();
                    if self.spawned >= cap {
                        if on_field == 0 {
                            ctx.dispatch(Action::SetLevelPhase(LevelPhase::Clearing));
                        }
                    } else if on_field < concurrent && tick.saturating_sub(self.last_spawn) >= interval {
                        let reinforcement = self.spawn_next(ctx, true)?;
                        ctx.dispatch(Action::AddEnemies(vec![reinforcement]));
                    }
                }
            },
            LevelPhase::Clearing => {
                if level.shrapnel.is_empty() {
                    ctx.dispatch(Action::SetLevelPhase(LevelPhase::Won));
                }
            }
            LevelPhase::Won | LevelPhase::TimedOut => {
                let until = match self.warp_until {
                    Some(until) => until,
                    None => {
                        ctx.dispatch(Action::SetMovementLimit(MovementLimit::ForceUp));
                        let until = tick + WARP_OUT_TICKS;
                        self.warp_until = Some(until);
                        until
                    }
                };
                if tick >= until {
                    let timed_out = level.phase == LevelPhase::TimedOut;
                    return Ok(Some(LevelOutcome { timed_out }));
                }
            }
        }
        Ok(None)
    }

    fn start_combat(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        let initial = match self.plan.win {
            WinCondition::Attrition { concurrent, .. } => concurrent,
            _ => self.plan.enemies.len(),
        };
        let mut enemies = Vec::with_capacity(initial);
        for _ in 0..initial {
            enemies.push(self.spawn_next(ctx, false)?);
        }
        log::debug!("level {}: {} enemies on the field", self.number, enemies.len());
        ctx.dispatch(Action::SetTotalEnemies(enemies.len()));
        ctx.dispatch(Action::SetEnemies(enemies));
        ctx.dispatch(Action::SetLevelPhase(LevelPhase::Active));
        self.active_since = ctx.tick;

        let combat = CombatHandler::new(
            self.plan.fire_control.clone(),
            self.plan.fire_interval,
            ctx.tick,
        );
        self.handlers
            .push(ctx.hooks.register_update(Stage::Combat, Box::new(combat)));
        if let WinCondition::Survive { ticks } = self.plan.win {
            let timer = SurvivalTimer::new(ctx.tick + ticks, ctx.world.settings.dimensions);
            self.handlers.push(ctx.hooks.register_foreground(Box::new(timer)));
        }

        // Combat only starts drawing next frame
        let state = ctx.snapshot();
        draw::queue_enemies(ctx.draws, &state.enemy_level);
        Ok(())
    }

    /// Next enemy from the plan, cycling through its placements.
    /// Reinforcements enter at a random column.
    fn spawn_next(&mut self, ctx: &mut FrameContext<'_>, reinforcement: bool) -> Result<EnemyState, EngineError> {
        let template = self.plan.enemies[self.spawned % self.plan.enemies.len()];
        let mut at = template.at;
        if reinforcement {
            let bounds = ctx.settings().dimensions.bounds();
            let margin = bounds.width() * 0.05;
            at.x = ctx.world.rng.random_range(bounds.left + margin..bounds.right - margin);
        }
        let id = ctx.allocate_id();
        let mut enemy = ctx
            .world
            .bestiary
            .spawn(template.archetype, id, at, template.angle, ctx.tick)?;
        enemy.base_speed *= self.plan.speed_scale;
        enemy.speed = enemy.base_speed;
        self.spawned += 1;
        self.last_spawn = ctx.tick;
        Ok(enemy)
    }
}

/// Owns the current level and moves on to the next one when it ends
pub struct LevelDirector {
    factory: Rc<dyn LevelFactory>,
    current: Option<Level>,
}

impl LevelDirector {
    pub fn new(factory: Rc<dyn LevelFactory>) -> Self {
        Self {
            factory,
            current: None,
        }
    }

    fn build(&self, number: u32) -> Result<Level, EngineError> {
        let plan = self.factory.build(number)?;
        plan.validate(number)?;
        Ok(Level::new(number, plan))
    }
}

impl UpdateHandler for LevelDirector {
    fn name(&self) -> &'static str {
        "level"
    }

    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        let mut level = match self.current.take() {
            Some(level) => level,
            None => {
                let mut level = self.build(ctx.snapshot().game.level)?;
                level.begin(ctx);
                level
            }
        };

        if let Some(outcome) = level.step(ctx)? {
            let finished = level.number();
            level.dispose(ctx);
            let settings = ctx.settings();
            let (bonus, max) = (settings.phaser_bonus, settings.max_phasers);
            ctx.dispatch(Action::AddPhasers { count: bonus, max });
            ctx.dispatch(Action::NextLevel);
            log::info!(
                "level {finished} {}",
                if outcome.timed_out { "survived" } else { "cleared" }
            );
            ctx.emit(GameEvent::LevelCompleted {
                level: finished,
                timed_out: outcome.timed_out,
            });

            level = self.build(finished + 1)?;
            level.begin(ctx);
        }

        self.current = Some(level);
        Ok(())
    }
}
