//! # Per-Entity Events
//!
//! Observers are kept in a table keyed by [`EntityId`] rather than on the
//! entity record. Handlers receive an [`EntityCommands`] handle; any
//! structural change they request is deferred to the next flush.

use std::collections::HashMap;

use strata_shared::Vec3;

use super::entity::EntityId;

/// Event delivered to a single entity's observers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntityEvent {
    /// One simulation step elapsed (`dt` in milliseconds).
    Tick {
        /// Step length in milliseconds.
        dt: f32,
    },
    /// The entity's box overlaps another entity-collidable entity.
    CollideEntity {
        /// The other member of the pair.
        other: EntityId,
    },
    /// The entity's physics body hit terrain.
    CollideTerrain {
        /// Impulse reported by the physics backend.
        impulse: Vec3,
    },
}

/// Handle returned by [`crate::EntityStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type EntityHandler = Box<dyn FnMut(EntityId, &EntityEvent, &mut EntityCommands<'_>)>;

/// Ids waiting for removal, in request order, without duplicates.
#[derive(Debug, Default)]
pub(crate) struct RemovalQueue {
    ids: Vec<EntityId>,
}

impl RemovalQueue {
    pub(crate) fn push(&mut self, id: EntityId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    pub(crate) fn take(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.ids)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Deferred structural changes requested from inside an event handler.
pub struct EntityCommands<'a> {
    queue: &'a mut RemovalQueue,
}

impl<'a> EntityCommands<'a> {
    pub(crate) fn new(queue: &'a mut RemovalQueue) -> Self {
        Self { queue }
    }

    /// Queues `id` for removal at the start of the next step.
    ///
    /// Queuing an id twice is a no-op.
    pub fn remove(&mut self, id: EntityId) {
        self.queue.push(id);
    }

    /// True if `id` is already queued for removal.
    #[must_use]
    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.queue.contains(id)
    }
}

#[derive(Default)]
pub(crate) struct EntityEvents {
    listeners: HashMap<EntityId, Vec<(ListenerId, EntityHandler)>>,
    next_listener: u64,
}

impl EntityEvents {
    pub(crate) fn subscribe(&mut self, id: EntityId, handler: EntityHandler) -> ListenerId {
        let listener = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.entry(id).or_default().push((listener, handler));
        listener
    }

    pub(crate) fn unsubscribe(&mut self, id: EntityId, listener: ListenerId) -> bool {
        let Some(handlers) = self.listeners.get_mut(&id) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(l, _)| *l != listener);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            self.listeners.remove(&id);
        }
        removed
    }

    /// Delivers `event` to every observer of `id`, in subscription order.
    pub(crate) fn emit(&mut self, id: EntityId, event: &EntityEvent, queue: &mut RemovalQueue) {
        if let Some(handlers) = self.listeners.get_mut(&id) {
            let mut commands = EntityCommands::new(queue);
            for (_, handler) in handlers.iter_mut() {
                handler(id, event, &mut commands);
            }
        }
    }

    pub(crate) fn detach_all(&mut self, id: EntityId) -> usize {
        self.listeners.remove(&id).map_or(0, |h| h.len())
    }

    pub(crate) fn listener_count(&self, id: EntityId) -> usize {
        self.listeners.get(&id).map_or(0, Vec::len)
    }
}
