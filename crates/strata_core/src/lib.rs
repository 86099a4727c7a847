//! # STRATA Core
//!
//! The entity/collision substrate of the STRATA voxel engine:
//! - every live entity (bounding box, optional physics body, optional visual)
//! - one update pass per fixed simulation step
//! - entity-entity overlap detection
//! - pluggable per-entity behaviors (components)
//!
//! ## Architecture Rules
//!
//! 1. **Never mutate the live set mid-iteration** - removals are queued and
//!    flushed at the top of the next step
//! 2. **One authoritative box per entity** - owned by the entity or by its
//!    physics body, never both
//! 3. **No global state** - collaborators are passed in or owned explicitly
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{EntitySpec, EntityStore, KinematicPhysics};
//! use strata_shared::Vec3;
//!
//! let mut store = EntityStore::new(KinematicPhysics::new());
//! let id = store.add(EntitySpec::new(Vec3::new(0.0, 10.0, 0.0), 0.6, 1.8).with_physics_body());
//! store.remove(id); // takes effect on the next step
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod component;
pub mod ecs;

pub use backend::{
    BodyHandle, BodySettings, KinematicPhysics, PhysicsBackend, TerrainCallback, TerrainContact,
    VisualBackend, VisualHandle,
};
pub use component::{
    Attached, Component, ComponentContext, ComponentRegistry, EntityAccess, FollowState,
    FollowsEntity,
};
pub use ecs::{
    Bounds, CollisionBroadphase, CollisionPair, Entity, EntityCommands, EntityEvent, EntityId,
    EntitySpec, EntityStore, ListenerId,
};
