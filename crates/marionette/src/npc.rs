//! # NPC Interface
//!
//! The external controller an entity is handed to. The framework only ever
//! reads an NPC's identity and metadata and calls its `update` once per tick;
//! what the NPC decides to do there is its own business.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use marionette_core::{EntityId, HookResult, Location, Simulation};

use crate::metadata::{MetadataStore, MetadataType};

/// Stable NPC identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NpcId(pub u32);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc-{}", self.0)
    }
}

/// An external controller for one host entity.
pub trait Npc {
    /// Identity.
    fn id(&self) -> NpcId;

    /// Name including `&` colour codes.
    fn full_name(&self) -> &str;

    /// Metadata, read by the framework with call-site defaults.
    fn data(&self) -> &MetadataStore;

    /// Called once per tick, after the host's own tick of `entity`.
    ///
    /// # Errors
    ///
    /// Any error aborts the current simulation step.
    fn update(&mut self, sim: &mut Simulation, entity: EntityId) -> HookResult;
}

/// Shared handle to an NPC.
pub type NpcHandle = Rc<RefCell<dyn Npc>>;

/// Minimal NPC: a name, metadata, and an update that only records what it saw.
#[derive(Clone, Debug)]
pub struct BasicNpc {
    id: NpcId,
    name: String,
    data: MetadataStore,
    updates: u64,
    last_seen: Option<Location>,
}

impl BasicNpc {
    /// Creates an NPC with empty metadata.
    #[must_use]
    pub fn new(id: NpcId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            data: MetadataStore::new(),
            updates: 0,
            last_seen: None,
        }
    }

    /// Builder-style metadata setter.
    #[must_use]
    pub fn with_data<T: MetadataType>(mut self, key: &str, value: T) -> Self {
        self.data.set(key, value);
        self
    }

    /// Replaces the whole metadata store.
    #[must_use]
    pub fn with_store(mut self, data: MetadataStore) -> Self {
        self.data = data;
        self
    }

    /// Mutable metadata.
    pub fn data_mut(&mut self) -> &mut MetadataStore {
        &mut self.data
    }

    /// Number of `update` calls so far.
    #[must_use]
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Entity location observed by the latest `update`.
    #[must_use]
    pub const fn last_seen(&self) -> Option<Location> {
        self.last_seen
    }

    /// Wraps the NPC in a shared handle.
    #[must_use]
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }
}

impl Npc for BasicNpc {
    fn id(&self) -> NpcId {
        self.id
    }

    fn full_name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> &MetadataStore {
        &self.data
    }

    fn update(&mut self, sim: &mut Simulation, entity: EntityId) -> HookResult {
        self.updates += 1;
        self.last_seen = sim.world().location(entity);
        Ok(())
    }
}
