//! Renderer sink
//!
//! The engine never touches a canvas. It hands positions and frames to a
//! `Renderer` during the draw phase; what happens next is the host's business.

use crate::sim::Hitbox;
use crate::sim::assets::{Color, ColoredFrame};

/// Drawing primitives the host provides
pub trait Renderer {
    /// Paint a colored raster frame with its top-left corner at (left, top)
    fn render_frame(&mut self, left: f32, top: f32, frame: &ColoredFrame);

    /// Text for the status bar and banners
    fn render_text(&mut self, _left: f32, _top: f32, _text: &str, _color: Color) {}

    /// Rectangle outline (borders, debug hitboxes)
    fn render_outline(&mut self, _hitbox: &Hitbox, _color: Color) {}
}

/// One recorded drawing call. Also used as the payload of deferred draws.
#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    Frame {
        left: f32,
        top: f32,
        frame: ColoredFrame,
    },
    Text {
        left: f32,
        top: f32,
        text: String,
        color: Color,
    },
    Outline {
        hitbox: Hitbox,
        color: Color,
    },
}

impl Draw {
    /// Replay onto a renderer
    pub fn render(&self, renderer: &mut dyn Renderer) {
        match self {
            Draw::Frame { left, top, frame } => renderer.render_frame(*left, *top, frame),
            Draw::Text {
                left,
                top,
                text,
                color,
            } => renderer.render_text(*left, *top, text, *color),
            Draw::Outline { hitbox, color } => renderer.render_outline(hitbox, *color),
        }
    }
}

/// Discards everything (headless runs)
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_frame(&mut self, _left: f32, _top: f32, _frame: &ColoredFrame) {}
}

/// Keeps every call in order (tests, frame dumps)
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub draws: Vec<Draw>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.draws.clear();
    }

    /// Frames drawn for a given sprite
    pub fn frames_of(&self, sprite: crate::sim::assets::SpriteKind) -> usize {
        self.draws
            .iter()
            .filter(|d| matches!(d, Draw::Frame { frame, .. } if frame.sprite == sprite))
            .count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.draws
            .iter()
            .filter_map(|d| match d {
                Draw::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render_frame(&mut self, left: f32, top: f32, frame: &ColoredFrame) {
        self.draws.push(Draw::Frame {
            left,
            top,
            frame: *frame,
        });
    }

    fn render_text(&mut self, left: f32, top: f32, text: &str, color: Color) {
        self.draws.push(Draw::Text {
            left,
            top,
            text: text.to_string(),
            color,
        });
    }

    fn render_outline(&mut self, hitbox: &Hitbox, color: Color) {
        self.draws.push(Draw::Outline {
            hitbox: *hitbox,
            color,
        });
    }
}
