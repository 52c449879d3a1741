//! Draw layers
//!
//! Entities are queued as one-shot draws by the handler that just moved them,
//! so nothing is painted before it has finished updating. Persistent layers
//! (starfield, status bar, border, debug outlines) are `DrawHandler`s.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::assets::{ColoredFrame, SpriteKind, palette};
use super::scheduler::{DrawHandler, DrawQueue};
use super::state::{AppState, EnemyLevelState, PhaserState, PlayerState, SpawnPhase, Tick};
use crate::render::{Draw, Renderer};
use crate::settings::Dimensions;

/// Ticks per blink while the player flies in
const SPAWN_BLINK: u64 = 4;

fn frame_at(draws: &mut DrawQueue, left: f32, top: f32, frame: ColoredFrame) {
    draws.push(Draw::Frame { left, top, frame });
}

/// Player ship and its bullet
pub fn queue_player(draws: &mut DrawQueue, player: &PlayerState, tick: Tick) {
    if let Some(bullet) = &player.bullet {
        frame_at(draws, bullet.left, bullet.top, bullet.frame);
    }
    if !player.alive {
        return;
    }
    if let SpawnPhase::Spawning { since } = player.spawn_phase {
        if (tick.saturating_sub(since) / SPAWN_BLINK) % 2 == 1 {
            return;
        }
    }
    frame_at(draws, player.location.x, player.location.y, player.colored_frame());
}

pub fn queue_enemies(draws: &mut DrawQueue, level: &EnemyLevelState) {
    for enemy in &level.enemies {
        frame_at(draws, enemy.hitbox.left, enemy.hitbox.top, enemy.colored_frame());
    }
}

/// Enemy bullets, shrapnel and explosion centers
pub fn queue_particles(draws: &mut DrawQueue, level: &EnemyLevelState) {
    for center in &level.explosion_centers {
        frame_at(draws, center.left, center.top, center.frame);
    }
    for p in level.bullets.iter().chain(&level.shrapnel) {
        frame_at(draws, p.left, p.top, p.frame);
    }
}

/// Everything, as of `state` (used while the update phase is frozen)
pub fn queue_scene(draws: &mut DrawQueue, state: &AppState) {
    queue_player(draws, &state.player, state.tick);
    queue_enemies(draws, &state.enemy_level);
    queue_particles(draws, &state.enemy_level);
}

/// Phaser beam segments, if a beam is showing
pub fn queue_beam(draws: &mut DrawQueue, state: &AppState) {
    if let PhaserState::BeamShown { path, .. } = &state.enemy_level.phaser {
        let frame = ColoredFrame::new(SpriteKind::PhaserBeam, 0, palette::CYAN);
        for point in path {
            frame_at(draws, point.x, point.y, frame);
        }
    }
}

/// Centered level banner
pub fn queue_banner(draws: &mut DrawQueue, dimensions: &Dimensions, level: u32, title: &str) {
    let top = dimensions.top_offset + (dimensions.height - dimensions.top_offset) / 2.0;
    let left = dimensions.width / 2.0;
    draws.push(Draw::Text {
        left,
        top,
        text: format!("LEVEL {level}"),
        color: palette::YELLOW,
    });
    draws.push(Draw::Text {
        left,
        top: top + dimensions.pixel_size * 10.0,
        text: title.to_string(),
        color: palette::WHITE,
    });
}

/// Fixed random stars behind everything
pub struct Starfield {
    stars: Vec<(f32, f32, u8)>,
}

impl Starfield {
    pub const STAR_COUNT: usize = 80;

    pub fn new(seed: u64, dimensions: &Dimensions) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed ^ 0x57A2_F1E1D);
        let bounds = dimensions.bounds();
        let stars = (0..Self::STAR_COUNT)
            .map(|_| {
                (
                    rng.random_range(bounds.left..bounds.right),
                    rng.random_range(bounds.top..bounds.bottom),
                    rng.random_range(0..3u8),
                )
            })
            .collect();
        Self { stars }
    }
}

impl DrawHandler for Starfield {
    fn name(&self) -> &'static str {
        "starfield"
    }

    fn draw(&self, _state: &AppState, renderer: &mut dyn Renderer) {
        for &(x, y, twinkle) in &self.stars {
            renderer.render_frame(x, y, &ColoredFrame::new(SpriteKind::Star, twinkle, palette::GREY));
        }
    }
}

/// Score, lives, level and phasers above the playfield
pub struct StatusBar {
    dimensions: Dimensions,
}

impl StatusBar {
    pub fn new(dimensions: Dimensions) -> Self {
        Self { dimensions }
    }
}

impl DrawHandler for StatusBar {
    fn name(&self) -> &'static str {
        "status-bar"
    }

    fn draw(&self, state: &AppState, renderer: &mut dyn Renderer) {
        let game = &state.game;
        let top = self.dimensions.pixel_size * 4.0;
        let column = self.dimensions.width / 4.0;
        renderer.render_text(0.0, top, &format!("SCORE {}", game.score), palette::WHITE);
        renderer.render_text(column, top, &format!("LIVES {}", game.lives), palette::WHITE);
        renderer.render_text(column * 2.0, top, &format!("LEVEL {}", game.level), palette::WHITE);
        renderer.render_text(column * 3.0, top, &format!("PHASERS {}", game.phasers), palette::CYAN);
    }
}

/// Outline around the playfield
pub struct Border {
    dimensions: Dimensions,
}

impl Border {
    pub fn new(dimensions: Dimensions) -> Self {
        Self { dimensions }
    }
}

impl DrawHandler for Border {
    fn name(&self) -> &'static str {
        "border"
    }

    fn draw(&self, _state: &AppState, renderer: &mut dyn Renderer) {
        renderer.render_outline(&self.dimensions.bounds(), palette::BLUE);
    }
}

/// Outlines every hitbox when debugging asks for it
#[derive(Debug, Default)]
pub struct HitboxOverlay;

impl DrawHandler for HitboxOverlay {
    fn name(&self) -> &'static str {
        "hitbox-overlay"
    }

    fn draw(&self, state: &AppState, renderer: &mut dyn Renderer) {
        if !state.debugging.show_hitboxes {
            return;
        }
        if state.player.alive {
            renderer.render_outline(&state.player.hitbox, palette::GREEN);
        }
        if let Some(b) = &state.player.bullet {
            renderer.render_outline(&b.hitbox, palette::GREEN);
        }
        let level = &state.enemy_level;
        for e in &level.enemies {
            renderer.render_outline(&e.hitbox, palette::RED);
        }
        for p in level.bullets.iter().chain(&level.shrapnel) {
            renderer.render_outline(&p.hitbox, palette::MAGENTA);
        }
    }
}

/// Countdown for survival levels
pub struct SurvivalTimer {
    ends_at: Tick,
    dimensions: Dimensions,
}

impl SurvivalTimer {
    /// Host frames per displayed second
    const TICKS_PER_SECOND: u64 = 60;

    pub fn new(ends_at: Tick, dimensions: Dimensions) -> Self {
        Self { ends_at, dimensions }
    }
}

impl DrawHandler for SurvivalTimer {
    fn name(&self) -> &'static str {
        "survival-timer"
    }

    fn draw(&self, state: &AppState, renderer: &mut dyn Renderer) {
        let left = self.ends_at.saturating_sub(state.tick);
        let seconds = left.div_ceil(Self::TICKS_PER_SECOND);
        renderer.render_text(
            self.dimensions.width / 2.0,
            self.dimensions.top_offset + self.dimensions.pixel_size * 4.0,
            &format!("HOLD {seconds}"),
            palette::ORANGE,
        );
    }
}
