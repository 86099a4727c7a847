//! # STRATA Shared
//!
//! Math types used by the entity core, the block targeter and every
//! collaborator implementation.
//!
//! ## Rule
//!
//! This crate must never depend on a collaborator (world storage, physics
//! solver, renderer). If a type needs one of those, it belongs higher up.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{BLOCK_AIR, HIT_NUDGE, MAX_RAY_DISTANCE};
pub use math::{nudge_epsilon, Aabb, BlockPos, Vec3};
