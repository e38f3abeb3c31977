//! # Event Pipeline
//!
//! Synchronous, cancellable events raised by entity overrides.
//!
//! ## Design
//!
//! - One handler list per event type, selected through [`PipelineEvent`]
//! - Listeners run in registration order on the simulation thread
//! - A listener error aborts the remaining listeners and the raising hook
//! - Each list keeps an immutable snapshot; dispatch clones the snapshot, so
//!   a listener may register or unregister listeners while running and the
//!   change applies from the next dispatch

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use marionette_core::{EntityId, EntityKind, HookError, Vec3};
use thiserror::Error;

use crate::npc::{NpcHandle, NpcId};

// =============================================================================
// Listener plumbing
// =============================================================================

/// Handle returned by [`EventPipeline::register_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Failure reported by a listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    /// Creates a listener error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Converts into the hook error that aborts `entity`'s hook.
    #[must_use]
    pub fn into_hook_error(self, entity: EntityId) -> HookError {
        HookError::Aborted {
            entity,
            reason: self.to_string(),
        }
    }
}

/// A registered handler for events of type `E`.
pub type Listener<E> = Rc<dyn Fn(&mut E) -> Result<(), ListenerError>>;

/// Ordered listeners for one event type.
pub struct HandlerList<E> {
    entries: RefCell<Rc<[(ListenerId, Listener<E>)]>>,
}

impl<E> HandlerList<E> {
    fn new() -> Self {
        Self {
            entries: RefCell::new(Rc::from(Vec::new())),
        }
    }

    fn register(&self, id: ListenerId, listener: Listener<E>) {
        let mut entries = self.entries.borrow_mut();
        let mut next = entries.to_vec();
        next.push((id, listener));
        *entries = Rc::from(next);
    }

    fn unregister(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        if !entries.iter().any(|(listed, _)| *listed == id) {
            return false;
        }
        let next: Vec<_> = entries
            .iter()
            .filter(|(listed, _)| *listed != id)
            .cloned()
            .collect();
        *entries = Rc::from(next);
        true
    }

    /// Number of registered listeners.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// `true` when nobody is listening.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dispatch(&self, event: &mut E) -> Result<(), ListenerError> {
        let snapshot = Rc::clone(&self.entries.borrow());
        for (_, listener) in snapshot.iter() {
            listener(event)?;
        }
        Ok(())
    }
}

/// Event types the pipeline knows how to route.
pub trait PipelineEvent: Sized + 'static {
    /// Name used in log output.
    const NAME: &'static str;

    /// The handler list for this event type.
    fn handlers(pipeline: &EventPipeline) -> &HandlerList<Self>;
}

// =============================================================================
// Events
// =============================================================================

/// Raised when something external tries to push a bound NPC entity.
///
/// Starts out cancelled when the NPC is protected. Listeners may rewrite the
/// vector, cancel, or un-cancel.
pub struct PushEvent {
    npc: NpcHandle,
    entity: EntityId,
    vector: Vec3,
    cancelled: bool,
}

impl PushEvent {
    /// Creates the event. `protected` becomes the initial cancellation state.
    #[must_use]
    pub fn new(npc: NpcHandle, entity: EntityId, vector: Vec3, protected: bool) -> Self {
        Self {
            npc,
            entity,
            vector,
            cancelled: protected,
        }
    }

    /// The NPC being pushed.
    #[must_use]
    pub fn npc(&self) -> &NpcHandle {
        &self.npc
    }

    /// The entity being pushed.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// The push that will be applied if the event is not cancelled.
    #[must_use]
    pub const fn vector(&self) -> Vec3 {
        self.vector
    }

    /// Replaces the push.
    pub fn set_vector(&mut self, vector: Vec3) {
        self.vector = vector;
    }

    /// Whether the push will be dropped.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Cancels or un-cancels the push.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

impl PipelineEvent for PushEvent {
    const NAME: &'static str = "push";

    fn handlers(pipeline: &EventPipeline) -> &HandlerList<Self> {
        &pipeline.push
    }
}

/// Snapshot of the other side of a collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRef {
    /// Entity id.
    pub id: EntityId,
    /// Entity kind.
    pub kind: EntityKind,
    /// NPC driving it, if any.
    pub npc: Option<NpcId>,
}

/// Raised after a bound NPC entity collided with another entity.
///
/// Observation only: the collision has already been resolved and listeners
/// cannot change it.
pub struct CollisionEvent {
    npc: NpcHandle,
    entity: EntityId,
    other: EntityRef,
}

impl CollisionEvent {
    /// Creates the event.
    #[must_use]
    pub fn new(npc: NpcHandle, entity: EntityId, other: EntityRef) -> Self {
        Self { npc, entity, other }
    }

    /// The NPC that collided.
    #[must_use]
    pub fn npc(&self) -> &NpcHandle {
        &self.npc
    }

    /// The NPC's entity.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// The entity it collided with.
    #[must_use]
    pub const fn other(&self) -> EntityRef {
        self.other
    }
}

impl PipelineEvent for CollisionEvent {
    const NAME: &'static str = "collision";

    fn handlers(pipeline: &EventPipeline) -> &HandlerList<Self> {
        &pipeline.collision
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Listener registry for every NPC event type.
///
/// Shared as `Rc<EventPipeline>` between all overrides; registration works
/// through `&self`.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = Rc::new(EventPipeline::new());
/// pipeline.register_listener(|event: &mut PushEvent| {
///     event.set_cancelled(false);
///     Ok(())
/// });
/// ```
pub struct EventPipeline {
    push: HandlerList<PushEvent>,
    collision: HandlerList<CollisionEvent>,
    next_id: Cell<u64>,
}

impl EventPipeline {
    /// Creates a pipeline with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            push: HandlerList::new(),
            collision: HandlerList::new(),
            next_id: Cell::new(0),
        }
    }

    /// Appends a listener for events of type `E`.
    pub fn register_listener<E, F>(&self, handler: F) -> ListenerId
    where
        E: PipelineEvent,
        F: Fn(&mut E) -> Result<(), ListenerError> + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        E::handlers(self).register(id, Rc::new(handler));
        tracing::debug!(event = E::NAME, listener = id.0, "registered listener");
        id
    }

    /// Removes a listener. Returns `false` if it was not registered for `E`.
    pub fn unregister_listener<E: PipelineEvent>(&self, id: ListenerId) -> bool {
        let removed = E::handlers(self).unregister(id);
        if removed {
            tracing::debug!(event = E::NAME, listener = id.0, "unregistered listener");
        }
        removed
    }

    /// Number of listeners for `E`.
    #[inline]
    #[must_use]
    pub fn listener_count<E: PipelineEvent>(&self) -> usize {
        E::handlers(self).len()
    }

    /// Runs every listener for `E`, in registration order.
    ///
    /// # Errors
    ///
    /// The first listener error; later listeners do not run.
    pub fn dispatch<E: PipelineEvent>(&self, event: &mut E) -> Result<(), ListenerError> {
        E::handlers(self).dispatch(event)
    }
}

impl Default for EventPipeline {
    fn default() -> Self {
        Self::new()
    }
}
