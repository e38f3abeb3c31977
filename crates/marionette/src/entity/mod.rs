//! # Controlled Entities
//!
//! - `facade` - the public face of a controlled entity
//! - `hooked` - [`EntityOverride`], the hook object bound to an NPC
//! - `controller` - per entity-type spawners
//! - `registry` - startup resolution of configured entity types

mod controller;
mod facade;
mod hooked;
mod registry;

pub use controller::{
    typed_facade, EntityController, GenericMobController, HumanController, MobController,
    PigController,
};
pub use facade::{downcast_facade, EntityFacade, FacadeKind, MobFacade, PigFacade, PlayerFacade};
pub use hooked::{EntityOverride, HumanOverride, MobOverride, PigOverride};
pub use registry::{is_controllable, ControllerRegistry};
