//! # MARIONETTE CORE
//!
//! A small deterministic host simulation: entity records with native physics
//! and AI, and the hook table that lets a controller take an entity over.
//!
//! ## Modules
//!
//! - `ecs` - generational ids, dense component storage, the [`World`]
//! - `ai` / `native` - what entities do on their own
//! - `hooks` - [`EntityHooks`], the per-entity override surface
//! - `simulation` - [`Simulation`], the tick driver and hook dispatcher
//! - `scheduler` - tick-tagged deferred work
//! - `random` - the injected random source
//! - `tick` - real-time pacing for drivers

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod ai;
pub mod ecs;
pub mod error;
pub mod hooks;
pub mod math;
pub mod native;
pub mod random;
pub mod scheduler;
pub mod simulation;
pub mod tick;

pub use ecs::{EntityId, EntityKind, EntityRecord, World};
pub use error::{HookError, HookResult};
pub use hooks::EntityHooks;
pub use math::{Location, Vec3};
pub use random::RandomSource;
pub use scheduler::{TaskId, TickScheduler};
pub use simulation::{DeferredTask, Simulation};
pub use tick::{TickLoop, TickStats};
