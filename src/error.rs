//! Error types
//!
//! Everything here is a configuration or programming error. Runtime races between
//! handlers (stale ids and the like) are absorbed by the store and never show up here.

use thiserror::Error;

use crate::sim::Archetype;

/// Fatal engine errors. Returned from handlers and allowed to stop the frame loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A fire-control strategy asked an archetype that cannot shoot for an angle.
    #[error("archetype {0:?} has no fire-angle provider")]
    MissingFireAngle(Archetype),

    /// The bestiary has no profile for an archetype.
    #[error("unknown enemy archetype {0:?}")]
    UnknownArchetype(Archetype),

    /// The level factory produced an unusable plan.
    #[error("level {level} is misconfigured: {details}")]
    InvalidLevel { level: u32, details: String },

    /// Settings failed validation.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Errors that can occur when loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File could not be read.
    #[error("Failed to read settings '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failed.
    #[error("Parse error in settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid setting '{field}': {details}")]
    Invalid { field: &'static str, details: String },
}
