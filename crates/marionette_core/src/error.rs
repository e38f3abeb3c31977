//! # Hook Error Types
//!
//! Errors raised while the simulation dispatches into an entity's hooks.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors that can occur while running a hook or a deferred task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The hook was invoked for an entity that is no longer alive.
    #[error("entity {0} is not alive")]
    DeadEntity(EntityId),

    /// Something inside the hook refused to continue.
    #[error("hook for entity {entity} aborted: {reason}")]
    Aborted {
        /// Entity whose hook aborted.
        entity: EntityId,
        /// Human-readable cause.
        reason: String,
    },

    /// The controller driving the entity was already borrowed, which only
    /// happens when a hook re-enters its own controller.
    #[error("controller of entity {0} is busy")]
    NpcBusy(EntityId),
}

/// Result type for hooks and deferred tasks.
pub type HookResult = Result<(), HookError>;
