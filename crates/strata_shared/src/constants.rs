//! # Simulation Constants
//!
//! Values shared by the targeter and the world collaborators.

/// Block id of an empty cell.
pub const BLOCK_AIR: u32 = 0;

/// Distance a raycast hit is pushed back along its face normal before the
/// hit point is floored to a block coordinate.
///
/// A hit lies exactly on a voxel boundary, so flooring it directly can land
/// on either side. 0.01 is well above `f32` precision for coordinates up to
/// about 2^16; [`crate::nudge_epsilon`] widens it beyond that.
pub const HIT_NUDGE: f32 = 0.01;

/// Longest ray the voxel raycast will walk.
///
/// Longer requests are clamped. The DDA accumulates boundary distances in
/// `f32`, which stop advancing once they reach about 2^24.
pub const MAX_RAY_DISTANCE: f32 = 4096.0;
