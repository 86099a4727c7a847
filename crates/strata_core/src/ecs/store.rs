//! # Entity Store
//!
//! The authoritative set of live entities.
//!
//! Structural changes never happen while the set is being walked: `remove`
//! only queues, and the queue is flushed at the top of [`EntityStore::step`]
//! before collision detection and per-entity ticks run.

use crossbeam_channel::{Receiver, Sender};
use strata_shared::{Aabb, BlockPos, Vec3};
use tracing::{debug, trace};

use super::broadphase::CollisionBroadphase;
use super::entity::{Bounds, Entity, EntityId, EntitySpec};
use super::events::{EntityCommands, EntityEvent, EntityEvents, ListenerId, RemovalQueue};
use crate::backend::{BodyHandle, PhysicsBackend, TerrainCallback, TerrainContact, VisualBackend};

struct Slot {
    id: EntityId,
    entity: Option<Entity>,
}

/// Owns every live entity and the physics backend their bodies live in.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = EntityStore::new(KinematicPhysics::new());
/// let id = store.add(EntitySpec::new(Vec3::ZERO, 1.0, 1.0).colliding_with_entities());
///
/// store.subscribe(id, |me, event, commands| {
///     if let EntityEvent::CollideEntity { .. } = event {
///         commands.remove(me);
///     }
/// });
/// ```
pub struct EntityStore<P: PhysicsBackend> {
    slots: Vec<Slot>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    alive_count: usize,
    pending: RemovalQueue,
    events: EntityEvents,
    physics: P,
    contact_tx: Sender<TerrainContact>,
    contact_rx: Receiver<TerrainContact>,
    broadphase: CollisionBroadphase,
    // Scratch for the broad-phase input, reused every step.
    collidable_ids: Vec<EntityId>,
    collidable_boxes: Vec<Aabb>,
}

impl<P: PhysicsBackend> EntityStore<P> {
    /// Creates an empty store around a physics backend.
    #[must_use]
    pub fn new(physics: P) -> Self {
        let (contact_tx, contact_rx) = crossbeam_channel::unbounded();
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
            pending: RemovalQueue::default(),
            events: EntityEvents::default(),
            physics,
            contact_tx,
            contact_rx,
            broadphase: CollisionBroadphase::new(),
            collidable_ids: Vec::new(),
            collidable_boxes: Vec::new(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Creates an entity and returns its id.
    ///
    /// With [`EntitySpec::with_physics_body`] the box seeds a new body and the
    /// body's box becomes authoritative. A body that also collides with
    /// terrain reports contacts as [`EntityEvent::CollideTerrain`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn add(&mut self, spec: EntitySpec) -> EntityId {
        let id = match self.free_indices.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                // Bump generation so stale ids never resolve to this slot.
                slot.id = EntityId::new(index, slot.id.generation().wrapping_add(1));
                slot.id
            }
            None => {
                let id = EntityId::new(self.slots.len() as u32, 0);
                self.slots.push(Slot { id, entity: None });
                id
            }
        };

        let aabb = spec.aabb();
        let bounds = if spec.wants_physics_body {
            let body = self.physics.create_body(aabb);
            if spec.collides_with_terrain {
                let callback = TerrainCallback::new(id, self.contact_tx.clone());
                self.physics.set_terrain_callback(body, Some(callback));
            }
            Bounds::Body(body)
        } else {
            Bounds::Owned(aabb)
        };

        let entity = Entity {
            bounds,
            visual: spec.visual,
            payload: spec.payload,
            collides_with_terrain: spec.collides_with_terrain,
            collides_with_entities: spec.collides_with_entities,
            render_position: spec.position,
        };
        self.slots[id.index() as usize].entity = Some(entity);
        self.alive_count += 1;

        debug!("added entity {id} ({:?})", bounds);
        id
    }

    /// Queues an entity for removal at the start of the next step.
    ///
    /// Unknown, stale and already-queued ids are ignored.
    pub fn remove(&mut self, id: EntityId) {
        if !self.contains(id) {
            return;
        }
        if self.pending.push(id) {
            debug!("queued entity {id} for removal");
        }
    }

    /// True if `id` is queued for removal.
    #[must_use]
    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.pending.contains(id)
    }

    /// Advances every entity by one simulation step of `dt` milliseconds.
    ///
    /// 1. Flush queued removals.
    /// 2. Deliver entity-entity collisions to both members of each pair.
    /// 3. Deliver terrain contacts reported by physics since the last step.
    /// 4. Sync visuals and deliver [`EntityEvent::Tick`] to each entity.
    ///
    /// Returns the ids removed by the flush.
    pub fn step(&mut self, dt: f32, visuals: &mut dyn VisualBackend) -> Vec<EntityId> {
        let removed = self.flush_removals(visuals);
        self.dispatch_entity_collisions();
        self.dispatch_terrain_contacts();

        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            let Some(entity) = slot.entity.as_ref() else {
                continue;
            };
            let id = slot.id;
            if let Some(visual) = entity.visual {
                if let Some(aabb) = resolve_aabb(&self.physics, entity) {
                    visuals.set_visual_position(visual.handle, aabb.base + visual.offset);
                }
            }
            self.events
                .emit(id, &EntityEvent::Tick { dt }, &mut self.pending);
        }

        removed
    }

    fn flush_removals(&mut self, visuals: &mut dyn VisualBackend) -> Vec<EntityId> {
        let queued = self.pending.take();
        let mut removed = Vec::with_capacity(queued.len());

        for id in queued {
            let Some(entity) = self.take_entity(id) else {
                continue;
            };
            if let Some(visual) = entity.visual {
                visuals.dispose_visual(visual.handle);
            }
            if let Bounds::Body(body) = entity.bounds {
                self.physics.set_terrain_callback(body, None);
                self.physics.release_body(body);
            }
            let listeners = self.events.detach_all(id);
            debug!("removed entity {id} ({listeners} listeners detached)");
            removed.push(id);
        }

        removed
    }

    fn take_entity(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.id != id {
            return None;
        }
        let entity = slot.entity.take()?;
        self.free_indices.push(id.index());
        self.alive_count -= 1;
        Some(entity)
    }

    fn dispatch_entity_collisions(&mut self) {
        self.collidable_ids.clear();
        self.collidable_boxes.clear();
        for slot in &self.slots {
            let Some(entity) = slot.entity.as_ref() else {
                continue;
            };
            if !entity.collides_with_entities {
                continue;
            }
            if let Some(aabb) = resolve_aabb(&self.physics, entity) {
                self.collidable_ids.push(slot.id);
                self.collidable_boxes.push(*aabb);
            }
        }

        let pairs = self.broadphase.detect(&self.collidable_boxes);
        for pair in pairs {
            let a = self.collidable_ids[pair.first];
            let b = self.collidable_ids[pair.second];
            trace!("entity collision {a} <-> {b}");
            self.events
                .emit(a, &EntityEvent::CollideEntity { other: b }, &mut self.pending);
            self.events
                .emit(b, &EntityEvent::CollideEntity { other: a }, &mut self.pending);
        }
    }

    fn dispatch_terrain_contacts(&mut self) {
        let contacts: Vec<TerrainContact> = self.contact_rx.try_iter().collect();
        for contact in contacts {
            if !self.contains(contact.entity) {
                continue;
            }
            trace!("terrain contact for {} ({:?})", contact.entity, contact.impulse);
            let event = EntityEvent::CollideTerrain {
                impulse: contact.impulse,
            };
            self.events.emit(contact.entity, &event, &mut self.pending);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True if `id` refers to a live entity (including one queued for removal).
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.alive_count
    }

    /// True if no entity is live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Ids of every live entity, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.entity.is_some())
            .map(|slot| slot.id)
    }

    /// Gets an entity record by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get(id.index() as usize)?;
        if slot.id != id {
            return None;
        }
        slot.entity.as_ref()
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if id.is_null() {
            return None;
        }
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.id != id {
            return None;
        }
        slot.entity.as_mut()
    }

    /// The entity's authoritative box.
    #[must_use]
    pub fn bounding_box(&self, id: EntityId) -> Option<Aabb> {
        let entity = self.get(id)?;
        resolve_aabb(&self.physics, entity).copied()
    }

    /// Bottom-center ("feet") position of the entity's box.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.bounding_box(id).map(|aabb| aabb.feet())
    }

    /// Moves the entity so its bottom-center sits at `position`.
    ///
    /// Writes through to the physics body when the body owns the box.
    /// Returns `false` if the entity does not exist.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        let Some(entity) = self.get_mut(id) else {
            return false;
        };
        let body = match &mut entity.bounds {
            Bounds::Owned(aabb) => {
                aabb.set_feet(position);
                return true;
            }
            Bounds::Body(body) => *body,
        };
        match self.physics.body_aabb_mut(body) {
            Some(aabb) => {
                aabb.set_feet(position);
                true
            }
            None => false,
        }
    }

    /// Position used by render-frame systems.
    #[must_use]
    pub fn render_position(&self, id: EntityId) -> Option<Vec3> {
        self.get(id).map(Entity::render_position)
    }

    /// Overrides the render position until the next refresh.
    pub fn set_render_position(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.get_mut(id) {
            Some(entity) => {
                entity.render_position = position;
                true
            }
            None => false,
        }
    }

    /// The entity's payload, if it has one of type `T`.
    #[must_use]
    pub fn payload<T: 'static>(&self, id: EntityId) -> Option<&T> {
        self.get(id)?.payload()?.downcast_ref::<T>()
    }

    /// The entity's physics body.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<BodyHandle> {
        self.get(id)?.body()
    }

    /// True if the unit cell at `pos` overlaps (not merely touches) the box
    /// of a live terrain-colliding entity.
    #[must_use]
    pub fn is_terrain_blocked(&self, pos: BlockPos) -> bool {
        let cell = Aabb::from_block(pos);
        self.slots
            .iter()
            .filter_map(|slot| slot.entity.as_ref())
            .filter(|entity| entity.collides_with_terrain)
            .filter_map(|entity| resolve_aabb(&self.physics, entity))
            .any(|aabb| cell.overlaps(aabb))
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Registers an observer for one entity's events.
    ///
    /// Returns `None` if the entity does not exist. Observers are detached
    /// automatically when the entity is removed.
    pub fn subscribe<F>(&mut self, id: EntityId, handler: F) -> Option<ListenerId>
    where
        F: FnMut(EntityId, &EntityEvent, &mut EntityCommands<'_>) + 'static,
    {
        if !self.contains(id) {
            return None;
        }
        Some(self.events.subscribe(id, Box::new(handler)))
    }

    /// Detaches an observer. Returns `false` if it was not attached.
    pub fn unsubscribe(&mut self, id: EntityId, listener: ListenerId) -> bool {
        self.events.unsubscribe(id, listener)
    }

    /// Number of observers attached to `id`.
    #[must_use]
    pub fn listener_count(&self, id: EntityId) -> usize {
        self.events.listener_count(id)
    }

    // =========================================================================
    // Render frame
    // =========================================================================

    /// Refreshes every render position from the simulation position,
    /// extrapolated by body velocity over `dt` milliseconds.
    pub fn update_render_positions(&mut self, dt: f32) {
        let seconds = dt / 1000.0;
        for slot in &mut self.slots {
            let Some(entity) = slot.entity.as_mut() else {
                continue;
            };
            let Some(feet) = resolve_aabb(&self.physics, entity).map(Aabb::feet) else {
                continue;
            };
            let velocity = entity
                .body()
                .map_or(Vec3::ZERO, |body| self.physics.body_velocity(body));
            entity.render_position = feet + velocity * seconds;
        }
    }

    /// Moves visuals to their entity's render position plus offset.
    pub fn sync_render_visuals(&self, visuals: &mut dyn VisualBackend) {
        for slot in &self.slots {
            let Some(entity) = slot.entity.as_ref() else {
                continue;
            };
            let (Some(visual), Some(aabb)) = (entity.visual, resolve_aabb(&self.physics, entity))
            else {
                continue;
            };
            // Render position is a feet position; visual offsets are from the box base.
            let base = entity.render_position - (aabb.feet() - aabb.base);
            visuals.set_visual_position(visual.handle, base + visual.offset);
        }
    }

    // =========================================================================
    // Backend access
    // =========================================================================

    /// The physics backend.
    #[must_use]
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable access to the physics backend.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }
}

impl<P: PhysicsBackend> std::fmt::Debug for EntityStore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("alive", &self.alive_count)
            .field("pending_removal", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Reads the authoritative box of `entity`.
fn resolve_aabb<'a, P: PhysicsBackend>(physics: &'a P, entity: &'a Entity) -> Option<&'a Aabb> {
    match &entity.bounds {
        Bounds::Owned(aabb) => Some(aabb),
        Bounds::Body(body) => physics.body_aabb(*body),
    }
}
