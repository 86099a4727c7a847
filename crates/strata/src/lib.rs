//! # STRATA
//!
//! Simulation substrate for a real-time voxel-world engine.
//!
//! This crate ties the entity core ([`strata_core`]) to a voxel world and a
//! renderer:
//!
//! - [`Engine`] - fixed-step loop (world, physics, entities, components,
//!   block targeting) and a variable-rate render pass
//! - [`BlockTargeter`] / [`targeting::raycast`] - which block the viewer aims at
//! - [`EngineConfig`] - TOML-loadable options
//! - [`EventBus`] - engine notifications for any number of subscribers
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata::{Engine, EngineConfig, SparseWorld};
//! use strata_core::KinematicPhysics;
//!
//! let config = EngineConfig::load("engine.toml")?;
//! let mut engine = Engine::new(config, SparseWorld::new(), my_renderer, KinematicPhysics::new())?;
//! loop {
//!     engine.tick();
//!     engine.render(0.0);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod render;
pub mod targeting;
pub mod world;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ConfigError, ConfigResult};
pub use events::{Delivery, EngineEvent, EventBus, EventReceiver, EventSender, SendStatus};
pub use render::{BlockFace, RenderBackend};
pub use targeting::{
    BlockTargeter, PickResult, RayHit, TargetFingerprint, TargetUpdate, TargetedBlock,
};
pub use world::{SparseWorld, VoxelWorld};
