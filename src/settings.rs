//! Game settings and balance
//!
//! Loaded from JSON; every field has a default so partial files are fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_FIRE_SPACING;
use crate::error::SettingsError;
use crate::sim::Hitbox;

/// Playfield dimensions (read-only for the simulation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    /// Size of one raster pixel in playfield units
    pub pixel_size: f32,
    /// Playfield width
    pub width: f32,
    /// Playfield height (including the status bar strip)
    pub height: f32,
    /// Height of the status bar strip above the playfield
    pub top_offset: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            pixel_size: 3.0,
            width: 960.0,
            height: 720.0,
            top_offset: 48.0,
        }
    }
}

impl Dimensions {
    /// The area entities live in
    pub fn bounds(&self) -> Hitbox {
        Hitbox {
            left: 0.0,
            top: self.top_offset,
            right: self.width,
            bottom: self.height,
        }
    }
}

/// Debugging switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Player cannot be hit
    pub immortal: bool,
    /// Outline every hitbox after drawing
    pub show_hitboxes: bool,
}

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for the whole run
    pub seed: u64,
    pub dimensions: Dimensions,

    // === Player ===
    pub starting_lives: u8,
    pub starting_phasers: u8,
    pub max_phasers: u8,
    /// Phasers awarded for finishing a level
    pub phaser_bonus: u8,
    /// A bonus life every this many points (0 disables)
    pub extra_life_every: u64,
    /// Player movement per tick
    pub player_speed: f32,
    /// Player bullet movement per tick
    pub player_bullet_speed: f32,

    // === Timing (ticks) ===
    /// How long the level banner is shown
    pub banner_ticks: u64,
    /// How long the phaser beam freezes the simulation
    pub phaser_freeze_ticks: u64,
    /// Delay between death and respawn
    pub respawn_delay_ticks: u64,
    /// Fly-in duration after respawn (player cannot be hit)
    pub spawn_ticks: u64,
    /// Minimum ticks between two shots of one enemy
    pub min_fire_spacing: u64,

    pub debug: DebugSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            dimensions: Dimensions::default(),

            starting_lives: 3,
            starting_phasers: 1,
            max_phasers: 5,
            phaser_bonus: 1,
            extra_life_every: 10_000,
            player_speed: 6.0,
            player_bullet_speed: 15.0,

            banner_ticks: 120,
            phaser_freeze_ticks: 30,
            respawn_delay_ticks: 90,
            spawn_ticks: 60,
            min_fire_spacing: MIN_FIRE_SPACING,

            debug: DebugSettings::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let d = &self.dimensions;
        if d.width <= 0.0 || d.height <= 0.0 || d.pixel_size <= 0.0 {
            return Err(SettingsError::Invalid {
                field: "dimensions",
                details: format!("{}x{} (pixel {})", d.width, d.height, d.pixel_size),
            });
        }
        if d.top_offset < 0.0 || d.top_offset >= d.height {
            return Err(SettingsError::Invalid {
                field: "dimensions.top_offset",
                details: format!("{} outside 0..{}", d.top_offset, d.height),
            });
        }
        if self.starting_lives == 0 {
            return Err(SettingsError::Invalid {
                field: "starting_lives",
                details: "must be at least 1".into(),
            });
        }
        if self.starting_phasers > self.max_phasers {
            return Err(SettingsError::Invalid {
                field: "starting_phasers",
                details: format!("{} exceeds max_phasers {}", self.starting_phasers, self.max_phasers),
            });
        }
        if self.player_speed <= 0.0 || self.player_bullet_speed <= 0.0 {
            return Err(SettingsError::Invalid {
                field: "player_speed",
                details: "speeds must be positive".into(),
            });
        }
        Ok(())
    }
}
