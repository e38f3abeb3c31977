//! # MARIONETTE
//!
//! Hands host entities over to external NPC controllers while keeping them
//! indistinguishable from native entities to the rest of the simulation.
//!
//! ## Flow
//!
//! 1. A controller from the [`ControllerRegistry`] spawns a host entity
//! 2. It installs an [`EntityOverride`] bound to the NPC in the host's hook
//!    table, clearing the entity's AI
//! 3. Every tick, push, collision and lightning strike for that entity now
//!    goes through the override
//! 4. Pushes and collisions consult the [`EventPipeline`] before (or after)
//!    the host applies them
//!
//! ## Example
//!
//! ```rust,ignore
//! let pipeline = Rc::new(EventPipeline::new());
//! let registry = ControllerRegistry::new(&Settings::default(), Rc::clone(&pipeline))?;
//! let mut sim = Simulation::new(64, &RandomSource::default());
//!
//! let npc: NpcHandle = BasicNpc::new(NpcId(1), "&aWilbur").into_shared();
//! let mut controller = registry.create(EntityKind::Pig)?;
//! let facade = controller.spawn(&mut sim, Location::new(0.0, 64.0, 0.0), npc)?;
//! sim.step()?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod entity;
pub mod error;
pub mod events;
pub mod metadata;
pub mod npc;
pub mod settings;
pub mod util;

pub use entity::{
    ControllerRegistry, EntityController, EntityFacade, EntityOverride, HumanController,
    MobController, PigController, PlayerFacade,
};
pub use error::{MarionetteError, MarionetteResult};
pub use events::{CollisionEvent, EventPipeline, ListenerError, ListenerId, PushEvent};
pub use metadata::{keys, MetadataStore, MetadataValue};
pub use npc::{BasicNpc, Npc, NpcHandle, NpcId};
pub use settings::{NpcSpec, Settings};

/// Re-export of the host simulation crate.
pub use marionette_core as core;
