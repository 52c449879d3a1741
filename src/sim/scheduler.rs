//! Frame scheduler
//!
//! Owns the ordered update/draw handler lists and the deferred draw queue, and
//! runs one frame per host tick:
//!
//! 1. paused: nothing runs
//! 2. game over: stop and report the result
//! 3. phaser freeze: updates skipped, beam and frozen scene drawn
//! 4. otherwise updates by stage, then background, deferred, foreground, debug
//!
//! Handlers registered or removed during a frame take effect once the update
//! phase is over.

use rand_pcg::Pcg32;

use super::bestiary::Bestiary;
use super::draw;
use super::phaser;
use super::state::{AppState, EntityId, GameEvent, GameResult, Tick};
use super::store::{Action, Store};
use crate::error::EngineError;
use crate::render::{Draw, Renderer};
use crate::settings::Settings;

/// Fixed order of update stages within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Player,
    Spawn,
    Level,
    Combat,
    Particles,
}

/// Token returned by every registration; pass it back to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Per-frame simulation logic
pub trait UpdateHandler {
    fn name(&self) -> &'static str;
    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError>;
}

/// Persistent drawing logic (background, foreground, debug layers)
pub trait DrawHandler {
    fn name(&self) -> &'static str;
    fn draw(&self, state: &AppState, renderer: &mut dyn Renderer);
}

/// Everything handlers share besides the scheduler itself
pub struct World {
    pub store: Store,
    pub rng: Pcg32,
    pub settings: Settings,
    pub bestiary: Bestiary,
    pub events: Vec<GameEvent>,
}

/// One-shot draws queued during the update phase, drained after each frame
#[derive(Debug, Default)]
pub struct DrawQueue {
    draws: Vec<Draw>,
}

impl DrawQueue {
    pub fn push(&mut self, draw: Draw) {
        self.draws.push(draw);
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Draw> {
        self.draws.iter()
    }

    fn drain_into(&mut self, renderer: &mut dyn Renderer) {
        for d in self.draws.drain(..) {
            d.render(renderer);
        }
    }

    fn clear(&mut self) {
        self.draws.clear();
    }
}

enum HookCommand {
    Update(HandlerId, Stage, Box<dyn UpdateHandler>),
    Background(HandlerId, Box<dyn DrawHandler>),
    Foreground(HandlerId, Box<dyn DrawHandler>),
    Debug(HandlerId, Box<dyn DrawHandler>),
    Unregister(HandlerId),
}

/// Registration requests made from inside a frame
#[derive(Default)]
pub struct Hooks {
    next_id: u64,
    commands: Vec<HookCommand>,
}

impl Hooks {
    fn allocate(&mut self) -> HandlerId {
        self.next_id += 1;
        HandlerId(self.next_id)
    }

    pub fn register_update(&mut self, stage: Stage, handler: Box<dyn UpdateHandler>) -> HandlerId {
        let id = self.allocate();
        self.commands.push(HookCommand::Update(id, stage, handler));
        id
    }

    pub fn register_background(&mut self, handler: Box<dyn DrawHandler>) -> HandlerId {
        let id = self.allocate();
        self.commands.push(HookCommand::Background(id, handler));
        id
    }

    pub fn register_foreground(&mut self, handler: Box<dyn DrawHandler>) -> HandlerId {
        let id = self.allocate();
        self.commands.push(HookCommand::Foreground(id, handler));
        id
    }

    pub fn register_debug(&mut self, handler: Box<dyn DrawHandler>) -> HandlerId {
        let id = self.allocate();
        self.commands.push(HookCommand::Debug(id, handler));
        id
    }

    pub fn unregister(&mut self, id: HandlerId) {
        self.commands.push(HookCommand::Unregister(id));
    }

    /// Number of requests not yet applied
    pub fn pending(&self) -> usize {
        self.commands.len()
    }
}

/// What a handler sees during the update phase
pub struct FrameContext<'a> {
    pub tick: Tick,
    pub world: &'a mut World,
    pub draws: &'a mut DrawQueue,
    pub hooks: &'a mut Hooks,
}

impl FrameContext<'_> {
    pub fn snapshot(&self) -> std::rc::Rc<AppState> {
        self.world.store.snapshot()
    }

    pub fn dispatch(&mut self, action: Action) {
        self.world.store.dispatch(action);
    }

    pub fn allocate_id(&mut self) -> EntityId {
        self.world.store.allocate_id()
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.world.events.push(event);
    }

    pub fn queue_draw(&mut self, draw: Draw) {
        self.draws.push(draw);
    }

    pub fn settings(&self) -> &Settings {
        &self.world.settings
    }
}

/// How a frame went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Scheduler not started
    Stopped,
    Paused,
    /// Phaser beam on screen; updates skipped
    Frozen,
    Ran,
    /// The game ended; the scheduler has stopped itself
    GameOver(GameResult),
}

struct Entry<H: ?Sized> {
    id: HandlerId,
    name: &'static str,
    handler: Box<H>,
}

struct UpdateEntry {
    stage: Stage,
    entry: Entry<dyn UpdateHandler>,
}

/// The game loop
#[derive(Default)]
pub struct Scheduler {
    running: bool,
    updates: Vec<UpdateEntry>,
    backgrounds: Vec<Entry<dyn DrawHandler>>,
    foregrounds: Vec<Entry<dyn DrawHandler>>,
    debug_overlays: Vec<Entry<dyn DrawHandler>>,
    draws: DrawQueue,
    hooks: Hooks,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin accepting frames
    pub fn resume(&mut self) {
        self.running = true;
    }

    /// Stop the loop and drop every registration
    pub fn stop(&mut self) {
        self.running = false;
        self.updates.clear();
        self.backgrounds.clear();
        self.foregrounds.clear();
        self.debug_overlays.clear();
        self.draws.clear();
        self.hooks.commands.clear();
    }

    pub fn register_update(&mut self, stage: Stage, handler: Box<dyn UpdateHandler>) -> HandlerId {
        let id = self.hooks.register_update(stage, handler);
        self.apply_hooks();
        id
    }

    pub fn register_background(&mut self, handler: Box<dyn DrawHandler>) -> HandlerId {
        let id = self.hooks.register_background(handler);
        self.apply_hooks();
        id
    }

    pub fn register_foreground(&mut self, handler: Box<dyn DrawHandler>) -> HandlerId {
        let id = self.hooks.register_foreground(handler);
        self.apply_hooks();
        id
    }

    pub fn register_debug(&mut self, handler: Box<dyn DrawHandler>) -> HandlerId {
        let id = self.hooks.register_debug(handler);
        self.apply_hooks();
        id
    }

    pub fn unregister(&mut self, id: HandlerId) {
        self.hooks.unregister(id);
        self.apply_hooks();
    }

    /// Queue a one-shot draw for the current frame
    pub fn queue_draw(&mut self, draw: Draw) {
        self.draws.push(draw);
    }

    /// Update handler names in execution order
    pub fn update_names(&self) -> Vec<&'static str> {
        self.updates.iter().map(|u| u.entry.name).collect()
    }

    /// Background, foreground and debug handler names, in that order
    pub fn draw_names(&self) -> Vec<&'static str> {
        self.backgrounds
            .iter()
            .chain(&self.foregrounds)
            .chain(&self.debug_overlays)
            .map(|e| e.name)
            .collect()
    }

    fn apply_hooks(&mut self) {
        for command in std::mem::take(&mut self.hooks.commands) {
            match command {
                HookCommand::Update(id, stage, handler) => {
                    let entry = Entry {
                        id,
                        name: handler.name(),
                        handler,
                    };
                    // Stable: after every entry of the same or an earlier stage
                    let at = self
                        .updates
                        .iter()
                        .position(|u| u.stage > stage)
                        .unwrap_or(self.updates.len());
                    self.updates.insert(at, UpdateEntry { stage, entry });
                }
                HookCommand::Background(id, handler) => self.backgrounds.push(Entry {
                    id,
                    name: handler.name(),
                    handler,
                }),
                HookCommand::Foreground(id, handler) => self.foregrounds.push(Entry {
                    id,
                    name: handler.name(),
                    handler,
                }),
                HookCommand::Debug(id, handler) => self.debug_overlays.push(Entry {
                    id,
                    name: handler.name(),
                    handler,
                }),
                HookCommand::Unregister(id) => {
                    self.updates.retain(|u| u.entry.id != id);
                    self.backgrounds.retain(|e| e.id != id);
                    self.foregrounds.retain(|e| e.id != id);
                    self.debug_overlays.retain(|e| e.id != id);
                }
            }
        }
    }

    /// Run one frame. Handler errors stop the frame and are returned as-is.
    pub fn frame(
        &mut self,
        tick: Tick,
        world: &mut World,
        renderer: &mut dyn Renderer,
    ) -> Result<FrameOutcome, EngineError> {
        if !self.running {
            return Ok(FrameOutcome::Stopped);
        }
        world.store.dispatch(Action::SetTick(tick));
        let snapshot = world.store.snapshot();

        if snapshot.game.paused {
            return Ok(FrameOutcome::Paused);
        }

        if snapshot.game.game_over {
            let result = GameResult::from_game(&snapshot.game);
            self.stop();
            return Ok(FrameOutcome::GameOver(result));
        }

        let frozen = snapshot.enemy_level.phaser.is_freezing();
        {
            let Scheduler {
                updates,
                draws,
                hooks,
                ..
            } = self;
            let mut ctx = FrameContext {
                tick,
                world,
                draws,
                hooks,
            };
            if frozen {
                phaser::advance_freeze(&mut ctx);
                draw::queue_scene(ctx.draws, &snapshot);
                draw::queue_beam(ctx.draws, &snapshot);
            } else {
                for u in updates.iter_mut() {
                    u.entry.handler.update(&mut ctx)?;
                }
            }
        }
        self.apply_hooks();

        let state = world.store.snapshot();
        for e in &self.backgrounds {
            e.handler.draw(&state, renderer);
        }
        self.draws.drain_into(renderer);
        for e in &self.foregrounds {
            e.handler.draw(&state, renderer);
        }
        for e in &self.debug_overlays {
            e.handler.draw(&state, renderer);
        }

        Ok(if frozen {
            FrameOutcome::Frozen
        } else {
            FrameOutcome::Ran
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use crate::sim::assets::palette;
    use crate::sim::test_support::world;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records its name into a shared log when run
    struct Recorder {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl UpdateHandler for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
            self.log.borrow_mut().push(self.name);
            ctx.queue_draw(Draw::Text {
                left: 0.0,
                top: 0.0,
                text: self.name.to_string(),
                color: palette::WHITE,
            });
            Ok(())
        }
    }

    struct Layer(&'static str);

    impl DrawHandler for Layer {
        fn name(&self) -> &'static str {
            self.0
        }

        fn draw(&self, _state: &AppState, renderer: &mut dyn Renderer) {
            renderer.render_text(0.0, 0.0, self.0, palette::WHITE);
        }
    }

    struct Failing;

    impl UpdateHandler for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn update(&mut self, _ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
            Err(EngineError::InvalidLevel {
                level: 0,
                details: "boom".into(),
            })
        }
    }

    /// Unregisters itself on first run
    struct OneShot {
        me: Option<HandlerId>,
        runs: Rc<RefCell<u32>>,
    }

    impl UpdateHandler for OneShot {
        fn name(&self) -> &'static str {
            "one-shot"
        }

        fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
            *self.runs.borrow_mut() += 1;
            if let Some(id) = self.me.take() {
                ctx.hooks.unregister(id);
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn test_updates_run_in_stage_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register_update(Stage::Particles, recorder("particles", &log));
        scheduler.register_update(Stage::Combat, recorder("combat", &log));
        scheduler.register_update(Stage::Player, recorder("player", &log));
        scheduler.register_update(Stage::Spawn, recorder("spawn", &log));
        scheduler.register_update(Stage::Combat, recorder("combat-2", &log));
        scheduler.resume();

        let mut world = world();
        let mut rec = RecordingRenderer::new();
        let outcome = scheduler.frame(1, &mut world, &mut rec).unwrap();
        assert_eq!(outcome, FrameOutcome::Ran);
        assert_eq!(
            *log.borrow(),
            vec!["player", "spawn", "combat", "combat-2", "particles"]
        );
    }

    #[test]
    fn test_draw_layer_order_and_one_shot_queue() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register_update(Stage::Player, recorder("deferred", &log));
        scheduler.register_foreground(Box::new(Layer("foreground")));
        scheduler.register_debug(Box::new(Layer("debug")));
        scheduler.register_background(Box::new(Layer("background")));
        scheduler.resume();

        let mut world = world();
        let mut rec = RecordingRenderer::new();
        scheduler.frame(1, &mut world, &mut rec).unwrap();
        assert_eq!(rec.texts(), vec!["background", "deferred", "foreground", "debug"]);
        assert!(scheduler.draws.is_empty());
    }

    #[test]
    fn test_unregister_removes_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let id = scheduler.register_update(Stage::Level, recorder("level", &log));
        scheduler.unregister(id);
        scheduler.resume();
        let mut world = world();
        scheduler.frame(1, &mut world, &mut RecordingRenderer::new()).unwrap();
        assert!(log.borrow().is_empty());
        assert!(scheduler.update_names().is_empty());
    }

    #[test]
    fn test_handler_can_unregister_itself_during_frame() {
        let runs = Rc::new(RefCell::new(0));
        let mut scheduler = Scheduler::new();
        let id = scheduler.hooks.allocate();
        // Register under a pre-allocated id so the handler knows its own token
        scheduler.hooks.commands.push(HookCommand::Update(
            id,
            Stage::Level,
            Box::new(OneShot {
                me: Some(id),
                runs: Rc::clone(&runs),
            }),
        ));
        scheduler.apply_hooks();
        scheduler.resume();

        let mut world = world();
        let mut rec = RecordingRenderer::new();
        scheduler.frame(1, &mut world, &mut rec).unwrap();
        scheduler.frame(2, &mut world, &mut rec).unwrap();
        assert_eq!(*runs.borrow(), 1);
    }

    #[test]
    fn test_paused_frame_runs_nothing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register_update(Stage::Player, recorder("player", &log));
        scheduler.register_background(Box::new(Layer("background")));
        scheduler.resume();

        let mut world = world();
        world.store.dispatch(Action::SetPaused(true));
        let mut rec = RecordingRenderer::new();
        assert_eq!(scheduler.frame(1, &mut world, &mut rec).unwrap(), FrameOutcome::Paused);
        assert!(log.borrow().is_empty());
        assert!(rec.draws.is_empty());

        world.store.dispatch(Action::SetPaused(false));
        assert_eq!(scheduler.frame(2, &mut world, &mut rec).unwrap(), FrameOutcome::Ran);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_phaser_beam_freezes_updates_until_resolved() {
        use crate::sim::assets::SpriteKind;
        use crate::sim::state::PhaserState;
        use crate::sim::test_support::enemy;
        use glam::Vec2;

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register_update(Stage::Player, recorder("player", &log));
        scheduler.resume();

        let mut world = world();
        let freeze = world.settings.phaser_freeze_ticks;
        world.store.dispatch(Action::SetEnemies(vec![enemy(1, 100.0, 100.0)]));
        world.store.dispatch(Action::SetPhaser(PhaserState::BeamShown {
            target: 1,
            path: vec![Vec2::new(100.0, 300.0), Vec2::new(100.0, 200.0)],
            started: 0,
        }));

        let mut rec = RecordingRenderer::new();
        for tick in 1..freeze {
            assert_eq!(scheduler.frame(tick, &mut world, &mut rec).unwrap(), FrameOutcome::Frozen);
        }
        assert!(log.borrow().is_empty());
        assert!(rec.frames_of(SpriteKind::PhaserBeam) > 0);

        // Last frozen frame hands the target over for resolution
        assert_eq!(scheduler.frame(freeze, &mut world, &mut rec).unwrap(), FrameOutcome::Frozen);
        assert_eq!(
            world.store.snapshot().enemy_level.phaser,
            PhaserState::Resolved { target: 1 }
        );
        assert!(log.borrow().is_empty());

        assert_eq!(scheduler.frame(freeze + 1, &mut world, &mut rec).unwrap(), FrameOutcome::Ran);
        assert_eq!(*log.borrow(), vec!["player"]);
    }

    #[test]
    fn test_game_over_stops_scheduler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register_update(Stage::Player, recorder("player", &log));
        scheduler.resume();

        let mut world = world();
        world.store.dispatch(Action::IncreaseScore(1234));
        world.store.dispatch(Action::SetGameOver);
        let outcome = scheduler.frame(5, &mut world, &mut RecordingRenderer::new()).unwrap();
        match outcome {
            FrameOutcome::GameOver(result) => assert_eq!(result.score, 1234),
            other => panic!("expected game over, got {other:?}"),
        }
        assert!(!scheduler.is_running());
        assert!(scheduler.update_names().is_empty());
        assert_eq!(
            scheduler.frame(6, &mut world, &mut RecordingRenderer::new()).unwrap(),
            FrameOutcome::Stopped
        );
    }

    #[test]
    fn test_handler_error_propagates() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.register_update(Stage::Player, Box::new(Failing));
        scheduler.register_update(Stage::Particles, recorder("after", &log));
        scheduler.resume();
        let mut world = world();
        let result = scheduler.frame(1, &mut world, &mut RecordingRenderer::new());
        assert!(matches!(result, Err(EngineError::InvalidLevel { .. })));
        assert!(log.borrow().is_empty());
    }
}
