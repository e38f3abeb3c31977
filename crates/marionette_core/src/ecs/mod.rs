//! # Entity Records
//!
//! The host's entity store.
//!
//! - Entity ids are slot indices with generation counters
//! - Physical state lives in dense per-component arrays
//! - Selectors, names and flags live on the per-slot record

mod component;
mod entity;
mod storage;
mod world;

pub use component::{Component, Motion, Position, Rotation, Vitals};
pub use entity::{EntityId, EntityKind};
pub use storage::ComponentStorage;
pub use world::{EntityRecord, World};
