//! # Entity Substrate
//!
//! Generational ids, entity records, the store that owns them, the
//! broad-phase and per-entity event delivery.

mod broadphase;
mod entity;
mod events;
mod store;

pub use broadphase::{CollisionBroadphase, CollisionPair};
pub use entity::{Bounds, Entity, EntityId, EntitySpec};
pub use events::{EntityCommands, EntityEvent, ListenerId};
pub use store::EntityStore;
