//! # Framework Error Types
//!
//! All errors the override framework reports to its callers.

use marionette_core::{EntityId, EntityKind, HookError};
use thiserror::Error;

/// Errors that can occur while spawning, binding or configuring NPC entities.
#[derive(Error, Debug)]
pub enum MarionetteError {
    /// The entity's hooks (or a facade) are not of the type the caller asked
    /// for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the caller expected.
        expected: &'static str,
        /// Type actually installed.
        found: &'static str,
    },

    /// An entity type name from configuration is unknown or cannot be
    /// controlled.
    #[error("unsupported entity type: {0}")]
    UnsupportedEntityType(String),

    /// The host refused to spawn the entity (world full).
    #[error("host could not spawn a {kind} entity")]
    SpawnFailed {
        /// Kind that was requested.
        kind: EntityKind,
    },

    /// The controller already has a live entity.
    #[error("controller already drives entity {0}")]
    AlreadySpawned(EntityId),

    /// The controller has no live entity.
    #[error("controller has no spawned entity")]
    NotSpawned,

    /// The NPC was mutably borrowed when the framework needed to read it.
    #[error("npc is busy")]
    NpcBusy,

    /// Settings file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Settings file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A hook or deferred task failed.
    #[error(transparent)]
    Hook(#[from] HookError),
}

/// Result type for framework operations.
pub type MarionetteResult<T> = Result<T, MarionetteError>;
