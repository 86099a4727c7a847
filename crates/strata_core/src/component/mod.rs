//! # Components
//!
//! Pluggable per-entity behaviors. Each behavior implements [`Component`]:
//! a named kind with a state type, lifecycle hooks and two per-step
//! systems (simulation and render). State records are held by a
//! [`ComponentRegistry`], one typed store per component kind.
//!
//! Behaviors never touch the registry while their systems run. They see
//! entities through [`EntityAccess`] and request structural changes through
//! [`ComponentContext::remove_component_later`].

use std::any::TypeId;

use strata_shared::Vec3;

use crate::backend::PhysicsBackend;
use crate::ecs::{EntityId, EntityStore};

mod follows;
mod registry;

pub use follows::{FollowState, FollowsEntity};
pub use registry::ComponentRegistry;

/// A component state record together with its owning entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Attached<S> {
    /// Entity the record belongs to.
    pub entity: EntityId,
    /// Component-specific state.
    pub state: S,
}

/// Lifecycle contract for a pluggable per-entity behavior.
///
/// - `on_add` runs exactly once, after the caller's initializer has been
///   applied over [`Component::default_state`].
/// - `on_remove` runs exactly once, when the record is detached.
/// - `system` runs once per simulation step over every attached record.
/// - `render_system` runs once per render frame over the same records.
pub trait Component: 'static {
    /// Name used in logs and by name lookup.
    const NAME: &'static str;

    /// Per-entity state.
    type State: 'static;

    /// Template every new record starts from.
    fn default_state(&self) -> Self::State;

    /// Called once when a record is attached.
    fn on_add(&mut self, _entity: EntityId, _state: &mut Self::State, _ctx: &mut ComponentContext<'_>) {}

    /// Called once when a record is detached.
    fn on_remove(
        &mut self,
        _entity: EntityId,
        _state: &mut Self::State,
        _ctx: &mut ComponentContext<'_>,
    ) {
    }

    /// Per-step system over all attached records.
    fn system(
        &mut self,
        _dt: f32,
        _states: &mut [Attached<Self::State>],
        _ctx: &mut ComponentContext<'_>,
    ) {
    }

    /// Per-frame system over all attached records.
    fn render_system(
        &mut self,
        _dt: f32,
        _states: &mut [Attached<Self::State>],
        _ctx: &mut ComponentContext<'_>,
    ) {
    }
}

/// Entity positions as seen by component systems.
pub trait EntityAccess {
    /// True if `id` is a live entity.
    fn contains(&self, id: EntityId) -> bool;

    /// Bottom-center position.
    fn position(&self, id: EntityId) -> Option<Vec3>;

    /// Moves the entity. Returns `false` if it does not exist.
    fn set_position(&mut self, id: EntityId, position: Vec3) -> bool;

    /// Position used by render-frame systems.
    fn render_position(&self, id: EntityId) -> Option<Vec3>;

    /// Overrides the render position. Returns `false` if the entity does not exist.
    fn set_render_position(&mut self, id: EntityId, position: Vec3) -> bool;
}

impl<P: PhysicsBackend> EntityAccess for EntityStore<P> {
    fn contains(&self, id: EntityId) -> bool {
        EntityStore::contains(self, id)
    }

    fn position(&self, id: EntityId) -> Option<Vec3> {
        EntityStore::position(self, id)
    }

    fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        EntityStore::set_position(self, id, position)
    }

    fn render_position(&self, id: EntityId) -> Option<Vec3> {
        EntityStore::render_position(self, id)
    }

    fn set_render_position(&mut self, id: EntityId, position: Vec3) -> bool {
        EntityStore::set_render_position(self, id, position)
    }
}

/// Component detachments requested while systems run.
#[derive(Debug, Default)]
pub(crate) struct DeferredRemovals {
    requests: Vec<(TypeId, EntityId)>,
}

impl DeferredRemovals {
    pub(crate) fn push(&mut self, kind: TypeId, entity: EntityId) {
        if !self.requests.contains(&(kind, entity)) {
            self.requests.push((kind, entity));
        }
    }

    pub(crate) fn take(&mut self) -> Vec<(TypeId, EntityId)> {
        std::mem::take(&mut self.requests)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Context handed to every component hook and system.
pub struct ComponentContext<'a> {
    entities: &'a mut dyn EntityAccess,
    deferred: &'a mut DeferredRemovals,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(entities: &'a mut dyn EntityAccess, deferred: &'a mut DeferredRemovals) -> Self {
        Self { entities, deferred }
    }

    /// Entity access for this pass.
    pub fn entities(&mut self) -> &mut dyn EntityAccess {
        &mut *self.entities
    }

    /// True if `id` is a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Bottom-center position of `id`.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.position(id)
    }

    /// Moves `id`.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        self.entities.set_position(id, position)
    }

    /// Render position of `id`.
    #[must_use]
    pub fn render_position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.render_position(id)
    }

    /// Overrides the render position of `id`.
    pub fn set_render_position(&mut self, id: EntityId, position: Vec3) -> bool {
        self.entities.set_render_position(id, position)
    }

    /// Detaches component `C` from `entity` once the current pass finishes.
    ///
    /// Requesting the same detachment twice is a no-op.
    pub fn remove_component_later<C: Component>(&mut self, entity: EntityId) {
        self.deferred.push(TypeId::of::<C>(), entity);
    }
}
