//! # Collaborator Contracts
//!
//! The entity core never owns a physics solver or a renderer. It talks to
//! them through the traits in this module:
//!
//! - [`PhysicsBackend`]: rigid bodies that own an entity's authoritative box
//! - [`VisualBackend`]: render handles that follow an entity's box
//!
//! [`KinematicPhysics`] is a minimal backend (velocity integration, no
//! collision response) for headless runs and tests.

use crossbeam_channel::Sender;
use strata_shared::{Aabb, Vec3};

use crate::ecs::EntityId;

/// Opaque reference to a body owned by a [`PhysicsBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u32);

/// Opaque reference to a visual owned by a [`VisualBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u32);

/// A terrain collision reported by a physics body on behalf of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainContact {
    /// Entity whose body hit the terrain.
    pub entity: EntityId,
    /// Impulse applied by the collision.
    pub impulse: Vec3,
}

/// Terrain-collision hook installed on a body by the entity store.
///
/// The physics backend calls [`TerrainCallback::notify`] whenever the body
/// collides with terrain. Contacts are queued and re-emitted as entity
/// events during the next [`crate::EntityStore::step`].
#[derive(Clone, Debug)]
pub struct TerrainCallback {
    entity: EntityId,
    sender: Sender<TerrainContact>,
}

impl TerrainCallback {
    pub(crate) fn new(entity: EntityId, sender: Sender<TerrainContact>) -> Self {
        Self { entity, sender }
    }

    /// Entity this callback reports for.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Reports a terrain collision with the given impulse.
    ///
    /// Contacts for a store that has been dropped are discarded.
    pub fn notify(&self, impulse: Vec3) {
        let contact = TerrainContact {
            entity: self.entity,
            impulse,
        };
        if self.sender.send(contact).is_err() {
            tracing::trace!("terrain contact for {:?} dropped: store is gone", self.entity);
        }
    }
}

/// Tuning applied to a body after creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySettings {
    /// Multiplier applied to world gravity.
    pub gravity_multiplier: f32,
    /// Whether the body steps up onto one-block ledges.
    pub auto_step: bool,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            gravity_multiplier: 1.0,
            auto_step: false,
        }
    }
}

/// Physics collaborator.
///
/// A body owns its box: once an entity has a body, the store reads and writes
/// the entity's bounds exclusively through [`PhysicsBackend::body_aabb`] and
/// [`PhysicsBackend::body_aabb_mut`].
pub trait PhysicsBackend {
    /// Creates a body seeded with `aabb`.
    fn create_body(&mut self, aabb: Aabb) -> BodyHandle;

    /// Releases a body. Unknown handles are ignored.
    fn release_body(&mut self, body: BodyHandle);

    /// The body's authoritative box.
    fn body_aabb(&self, body: BodyHandle) -> Option<&Aabb>;

    /// Mutable access to the body's authoritative box.
    fn body_aabb_mut(&mut self, body: BodyHandle) -> Option<&mut Aabb>;

    /// Installs (or clears) the terrain-collision callback of a body.
    fn set_terrain_callback(&mut self, body: BodyHandle, callback: Option<TerrainCallback>);

    /// Current velocity in world units per second.
    fn body_velocity(&self, _body: BodyHandle) -> Vec3 {
        Vec3::ZERO
    }

    /// Applies tuning to a body.
    fn configure_body(&mut self, _body: BodyHandle, _settings: BodySettings) {}

    /// Advances the simulation by `dt` milliseconds.
    fn tick(&mut self, dt: f32);
}

/// Render-side handles attached to entities.
pub trait VisualBackend {
    /// Moves a visual's registration point.
    fn set_visual_position(&mut self, visual: VisualHandle, position: Vec3);

    /// Disposes a visual. Called exactly once, when its entity is removed.
    fn dispose_visual(&mut self, visual: VisualHandle);
}

// ============================================================================
// KINEMATIC PHYSICS
// ============================================================================

#[derive(Debug)]
struct KinematicBody {
    aabb: Aabb,
    velocity: Vec3,
    settings: BodySettings,
    callback: Option<TerrainCallback>,
}

/// Body store with velocity integration and no collision response.
///
/// Terrain contacts are injected with [`KinematicPhysics::report_terrain_contact`].
#[derive(Debug, Default)]
pub struct KinematicPhysics {
    bodies: Vec<Option<KinematicBody>>,
    free_slots: Vec<u32>,
}

impl KinematicPhysics {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.is_some()).count()
    }

    /// Sets a body's velocity (world units per second).
    pub fn set_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        if let Some(b) = self.body_mut(body) {
            b.velocity = velocity;
        }
    }

    /// Settings last applied to a body.
    #[must_use]
    pub fn settings(&self, body: BodyHandle) -> Option<BodySettings> {
        self.body(body).map(|b| b.settings)
    }

    /// Fires the body's terrain callback, if one is installed.
    ///
    /// Returns `true` if a callback received the contact.
    pub fn report_terrain_contact(&self, body: BodyHandle, impulse: Vec3) -> bool {
        match self.body(body).and_then(|b| b.callback.as_ref()) {
            Some(callback) => {
                callback.notify(impulse);
                true
            }
            None => false,
        }
    }

    fn body(&self, body: BodyHandle) -> Option<&KinematicBody> {
        self.bodies.get(body.0 as usize).and_then(Option::as_ref)
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut KinematicBody> {
        self.bodies.get_mut(body.0 as usize).and_then(Option::as_mut)
    }
}

impl PhysicsBackend for KinematicPhysics {
    #[allow(clippy::cast_possible_truncation)]
    fn create_body(&mut self, aabb: Aabb) -> BodyHandle {
        let body = KinematicBody {
            aabb,
            velocity: Vec3::ZERO,
            settings: BodySettings::default(),
            callback: None,
        };
        if let Some(slot) = self.free_slots.pop() {
            self.bodies[slot as usize] = Some(body);
            return BodyHandle(slot);
        }
        self.bodies.push(Some(body));
        BodyHandle((self.bodies.len() - 1) as u32)
    }

    fn release_body(&mut self, body: BodyHandle) {
        if let Some(slot) = self.bodies.get_mut(body.0 as usize) {
            if slot.take().is_some() {
                self.free_slots.push(body.0);
            }
        }
    }

    fn body_aabb(&self, body: BodyHandle) -> Option<&Aabb> {
        self.body(body).map(|b| &b.aabb)
    }

    fn body_aabb_mut(&mut self, body: BodyHandle) -> Option<&mut Aabb> {
        self.body_mut(body).map(|b| &mut b.aabb)
    }

    fn set_terrain_callback(&mut self, body: BodyHandle, callback: Option<TerrainCallback>) {
        if let Some(b) = self.body_mut(body) {
            b.callback = callback;
        }
    }

    fn body_velocity(&self, body: BodyHandle) -> Vec3 {
        self.body(body).map_or(Vec3::ZERO, |b| b.velocity)
    }

    fn configure_body(&mut self, body: BodyHandle, settings: BodySettings) {
        if let Some(b) = self.body_mut(body) {
            b.settings = settings;
        }
    }

    fn tick(&mut self, dt: f32) {
        let seconds = dt / 1000.0;
        for body in self.bodies.iter_mut().flatten() {
            let delta = body.velocity * seconds;
            body.aabb.translate(delta);
        }
    }
}
