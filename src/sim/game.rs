//! Top-level game: scheduler, world and the level factory, wired together
//!
//! The host calls `frame` once per tick with the keys held down. Game over
//! stops the scheduler, reports the result as an event and starts a fresh game.

use std::rc::Rc;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bestiary::Bestiary;
use super::campaign::Campaign;
use super::draw::{Border, HitboxOverlay, Starfield, StatusBar};
use super::level::{LevelDirector, LevelFactory};
use super::particles::ParticleHandler;
use super::player::{PlayerHandler, SpawnManager};
use super::scheduler::{FrameOutcome, Scheduler, Stage, World};
use super::state::{AppState, GameEvent, GameState, Keys, PlayerState, Tick};
use super::store::{Action, Store};
use crate::error::EngineError;
use crate::render::Renderer;
use crate::settings::Settings;

pub struct Game {
    scheduler: Scheduler,
    world: World,
    factory: Rc<dyn LevelFactory>,
}

impl Game {
    /// A game running the stock campaign
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        let factory = Rc::new(Campaign::new(settings.dimensions));
        Self::with_factory(settings, factory)
    }

    pub fn with_factory(settings: Settings, factory: Rc<dyn LevelFactory>) -> Result<Self, EngineError> {
        settings.validate()?;
        let world = World {
            store: Store::new(AppState::new(&settings)),
            rng: Pcg32::seed_from_u64(settings.seed),
            bestiary: Bestiary::with_spacing(settings.min_fire_spacing),
            settings,
            events: Vec::new(),
        };
        Ok(Self {
            scheduler: Scheduler::new(),
            world,
            factory,
        })
    }

    /// Register the baseline handlers and start accepting frames
    pub fn start(&mut self) {
        let dimensions = self.world.settings.dimensions;
        let s = &mut self.scheduler;
        s.register_update(Stage::Player, Box::new(PlayerHandler));
        s.register_update(Stage::Spawn, Box::new(SpawnManager));
        s.register_update(
            Stage::Level,
            Box::new(LevelDirector::new(Rc::clone(&self.factory))),
        );
        s.register_update(Stage::Particles, Box::new(ParticleHandler));
        s.register_background(Box::new(Starfield::new(self.world.settings.seed, &dimensions)));
        s.register_foreground(Box::new(StatusBar::new(dimensions)));
        s.register_foreground(Box::new(Border::new(dimensions)));
        s.register_debug(Box::new(HitboxOverlay));
        s.resume();
        log::info!("game started (seed {})", self.world.settings.seed);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn snapshot(&self) -> Rc<AppState> {
        self.world.store.snapshot()
    }

    pub fn settings(&self) -> &Settings {
        &self.world.settings
    }

    /// Events since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.world.events)
    }

    /// Feed input and run one frame
    pub fn frame(
        &mut self,
        tick: Tick,
        keys: Keys,
        renderer: &mut dyn Renderer,
    ) -> Result<FrameOutcome, EngineError> {
        self.world.store.dispatch(Action::SetKeyboard(keys));
        let state = self.world.store.snapshot();
        if state.keyboard.pressed.pause {
            self.world.store.dispatch(Action::SetPaused(!state.game.paused));
        }

        let outcome = self.scheduler.frame(tick, &mut self.world, renderer)?;
        if let FrameOutcome::GameOver(result) = outcome {
            log::info!(
                "game over: score {} at level {}, accuracy {:.2}",
                result.score,
                result.level,
                result.accuracy()
            );
            self.world.events.push(GameEvent::GameOver(result));
            self.restart();
        }
        Ok(outcome)
    }

    fn restart(&mut self) {
        let settings = &self.world.settings;
        let player = PlayerState::new(&settings.dimensions);
        let game = GameState::new(settings);
        self.world.store.dispatch_all([
            Action::ClearLevel,
            Action::ResetPlayer(player),
            Action::ResetKeyboard,
            Action::ResetGame(game),
        ]);
        self.start();
    }
}
