//! # Entity Records
//!
//! Entities are identified by a generational id:
//! - An index into the store's slot arena
//! - A generation counter for safe reuse
//!
//! The record itself ([`Entity`]) is plain data. It never delivers events;
//! observers live in a separate table keyed by [`EntityId`].

use std::any::Any;
use std::fmt;

use strata_shared::{Aabb, Vec3};

use crate::backend::{BodyHandle, VisualHandle};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Index into the store's slot arena
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Where an entity's authoritative box lives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds {
    /// The entity owns its box.
    Owned(Aabb),
    /// The box belongs to a physics body and is read through the backend.
    Body(BodyHandle),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Visual {
    pub(crate) handle: VisualHandle,
    pub(crate) offset: Vec3,
}

/// A live entity record.
pub struct Entity {
    pub(crate) bounds: Bounds,
    pub(crate) visual: Option<Visual>,
    pub(crate) payload: Option<Box<dyn Any>>,
    pub(crate) collides_with_terrain: bool,
    pub(crate) collides_with_entities: bool,
    pub(crate) render_position: Vec3,
}

impl Entity {
    /// Where the authoritative box lives.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Physics body, if the entity has one.
    #[must_use]
    pub fn body(&self) -> Option<BodyHandle> {
        match self.bounds {
            Bounds::Body(handle) => Some(handle),
            Bounds::Owned(_) => None,
        }
    }

    /// Visual handle, if the entity has one.
    #[must_use]
    pub fn visual(&self) -> Option<VisualHandle> {
        self.visual.map(|v| v.handle)
    }

    /// Offset from the box base at which the visual is placed.
    #[must_use]
    pub fn visual_offset(&self) -> Vec3 {
        self.visual.map_or(Vec3::ZERO, |v| v.offset)
    }

    /// Opaque payload attached at creation.
    #[must_use]
    pub fn payload(&self) -> Option<&dyn Any> {
        self.payload.as_deref()
    }

    /// Whether the entity is considered by terrain-placement checks.
    #[must_use]
    pub fn collides_with_terrain(&self) -> bool {
        self.collides_with_terrain
    }

    /// Whether the entity takes part in entity-entity collision.
    #[must_use]
    pub fn collides_with_entities(&self) -> bool {
        self.collides_with_entities
    }

    /// Position used by render-frame systems.
    #[must_use]
    pub fn render_position(&self) -> Vec3 {
        self.render_position
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("bounds", &self.bounds)
            .field("visual", &self.visual)
            .field("has_payload", &self.payload.is_some())
            .field("collides_with_terrain", &self.collides_with_terrain)
            .field("collides_with_entities", &self.collides_with_entities)
            .finish_non_exhaustive()
    }
}

/// Creation parameters for [`crate::EntityStore::add`].
///
/// ```rust,ignore
/// let spec = EntitySpec::new(Vec3::new(0.0, 10.0, 0.0), 0.6, 1.8)
///     .with_physics_body()
///     .colliding_with_terrain();
/// ```
pub struct EntitySpec {
    pub(crate) position: Vec3,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) visual: Option<Visual>,
    pub(crate) payload: Option<Box<dyn Any>>,
    pub(crate) wants_physics_body: bool,
    pub(crate) collides_with_terrain: bool,
    pub(crate) collides_with_entities: bool,
}

impl EntitySpec {
    /// An entity whose box is `width` wide and `height` tall, centered
    /// horizontally on `position` with its base at `position.y`.
    #[must_use]
    pub fn new(position: Vec3, width: f32, height: f32) -> Self {
        Self {
            position,
            width,
            height,
            visual: None,
            payload: None,
            wants_physics_body: false,
            collides_with_terrain: false,
            collides_with_entities: false,
        }
    }

    /// Attaches a visual placed at `box.base + offset` every step.
    #[must_use]
    pub fn with_visual(mut self, handle: VisualHandle, offset: Vec3) -> Self {
        self.visual = Some(Visual { handle, offset });
        self
    }

    /// Attaches opaque caller data.
    #[must_use]
    pub fn with_payload<T: Any>(mut self, payload: T) -> Self {
        self.payload = Some(Box::new(payload));
        self
    }

    /// Requests a physics body; the body's box becomes authoritative.
    #[must_use]
    pub fn with_physics_body(mut self) -> Self {
        self.wants_physics_body = true;
        self
    }

    /// Includes the entity in terrain checks (and terrain events if it has a body).
    #[must_use]
    pub fn colliding_with_terrain(mut self) -> Self {
        self.collides_with_terrain = true;
        self
    }

    /// Includes the entity in entity-entity collision detection.
    #[must_use]
    pub fn colliding_with_entities(mut self) -> Self {
        self.collides_with_entities = true;
        self
    }

    pub(crate) fn aabb(&self) -> Aabb {
        Aabb::from_feet(self.position, self.width, self.height)
    }
}

impl fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySpec")
            .field("position", &self.position)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("visual", &self.visual)
            .field("wants_physics_body", &self.wants_physics_body)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert!(!id.is_null());
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_spec_box_is_centered_on_feet() {
        let spec = EntitySpec::new(Vec3::new(5.0, 0.0, 5.0), 2.0, 3.0);
        let aabb = spec.aabb();
        assert_eq!(aabb.base, Vec3::new(4.0, 0.0, 4.0));
        assert_eq!(aabb.size, Vec3::new(2.0, 3.0, 2.0));
    }

    #[test]
    fn test_spec_flags_default_off() {
        let spec = EntitySpec::new(Vec3::ZERO, 1.0, 1.0);
        assert!(!spec.wants_physics_body);
        assert!(!spec.collides_with_terrain);
        assert!(!spec.collides_with_entities);
    }
}
