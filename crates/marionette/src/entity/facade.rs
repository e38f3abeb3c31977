//! # Entity Facades
//!
//! The public face of a controlled entity: which NPC drives it, plus the
//! operations that make sense for its type. Facades hold ids, not references,
//! so every operation takes the world it acts on.

use std::any::Any;
use std::rc::Rc;

use marionette_core::{EntityId, EntityKind, Location, World};

use crate::error::{MarionetteError, MarionetteResult};
use crate::npc::NpcHandle;

/// Operations every facade supports.
pub trait EntityFacade: Any {
    /// The host entity behind this facade.
    fn entity(&self) -> EntityId;

    /// The entity's kind when the facade was created.
    fn kind(&self) -> EntityKind;

    /// The NPC driving the entity, if it is bound.
    fn npc(&self) -> Option<&NpcHandle>;

    /// Facade type name, for type-mismatch reports.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether the entity still exists.
    fn is_valid(&self, world: &World) -> bool {
        world.is_alive(self.entity())
    }

    /// Current location.
    fn location(&self, world: &World) -> Option<Location> {
        world.location(self.entity())
    }

    /// Moves the entity.
    fn teleport(&self, world: &mut World, to: Location) -> bool {
        world.teleport(self.entity(), to)
    }

    /// Upcast for [`downcast_facade`].
    fn as_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Facade types an override can create.
pub trait FacadeKind: EntityFacade + Sized {
    /// Creates the facade for `entity`.
    fn create(entity: EntityId, kind: EntityKind, npc: Option<NpcHandle>) -> Self;
}

/// Turns a type-erased facade back into its concrete type.
///
/// # Errors
///
/// [`MarionetteError::TypeMismatch`] if the facade is not an `F`.
pub fn downcast_facade<F: FacadeKind>(facade: Rc<dyn EntityFacade>) -> MarionetteResult<Rc<F>> {
    let found = facade.type_name();
    facade
        .as_any()
        .downcast::<F>()
        .map_err(|_| MarionetteError::TypeMismatch {
            expected: std::any::type_name::<F>(),
            found,
        })
}

macro_rules! facade_basics {
    () => {
        fn entity(&self) -> EntityId {
            self.entity
        }

        fn kind(&self) -> EntityKind {
            self.kind
        }

        fn npc(&self) -> Option<&NpcHandle> {
            self.npc.as_ref()
        }

        fn as_any(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }
    };
}

// =============================================================================
// Player
// =============================================================================

/// Facade of a player-type entity.
pub struct PlayerFacade {
    entity: EntityId,
    kind: EntityKind,
    npc: Option<NpcHandle>,
}

impl PlayerFacade {
    /// Excludes the entity from (or includes it in) the sleep check.
    /// Returns `false` once the entity is gone.
    #[must_use]
    pub fn set_sleeping_ignored(&self, world: &mut World, ignored: bool) -> bool {
        world.set_sleeping_ignored(self.entity, ignored)
    }

    /// Whether the sleep check skips the entity.
    #[must_use]
    pub fn is_sleeping_ignored(&self, world: &World) -> bool {
        world
            .record(self.entity)
            .is_some_and(marionette_core::EntityRecord::sleeping_ignored)
    }

    /// Name shown for the entity.
    #[must_use]
    pub fn display_name(&self, world: &World) -> Option<String> {
        world
            .record(self.entity)
            .and_then(|r| r.name().map(str::to_owned))
    }

    /// Whether the entity appears on the player list.
    #[must_use]
    pub fn is_listed(&self, world: &World) -> bool {
        world.is_listed(self.entity)
    }
}

impl EntityFacade for PlayerFacade {
    facade_basics!();
}

impl FacadeKind for PlayerFacade {
    fn create(entity: EntityId, kind: EntityKind, npc: Option<NpcHandle>) -> Self {
        Self { entity, kind, npc }
    }
}

// =============================================================================
// Pig
// =============================================================================

/// Facade of a pig.
pub struct PigFacade {
    entity: EntityId,
    kind: EntityKind,
    npc: Option<NpcHandle>,
}

impl PigFacade {
    /// Puts on or takes off the saddle.
    #[must_use]
    pub fn set_saddled(&self, world: &mut World, saddled: bool) -> bool {
        world.set_saddled(self.entity, saddled)
    }

    /// Whether the pig wears a saddle.
    #[must_use]
    pub fn has_saddle(&self, world: &World) -> bool {
        world
            .record(self.entity)
            .is_some_and(marionette_core::EntityRecord::saddled)
    }
}

impl EntityFacade for PigFacade {
    facade_basics!();
}

impl FacadeKind for PigFacade {
    fn create(entity: EntityId, kind: EntityKind, npc: Option<NpcHandle>) -> Self {
        Self { entity, kind, npc }
    }
}

// =============================================================================
// Generic mob
// =============================================================================

/// Facade of any mob without type-specific operations.
pub struct MobFacade {
    entity: EntityId,
    kind: EntityKind,
    npc: Option<NpcHandle>,
}

impl MobFacade {
    /// Current health.
    #[must_use]
    pub fn health(&self, world: &World) -> Option<f32> {
        world.vitals(self.entity).map(|v| v.health)
    }
}

impl EntityFacade for MobFacade {
    facade_basics!();
}

impl FacadeKind for MobFacade {
    fn create(entity: EntityId, kind: EntityKind, npc: Option<NpcHandle>) -> Self {
        Self { entity, kind, npc }
    }
}
