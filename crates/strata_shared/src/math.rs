//! Mathematical types shared by the simulation core and its collaborators.
//!
//! These are the canonical representations: world-space vectors, integer
//! block coordinates and axis-aligned bounding boxes.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::constants::HIT_NUDGE;

/// 3D Vector - position, offset, direction, impulse
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Component along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    #[must_use]
    pub const fn axis(self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Returns the unit vector in the same direction, or `None` for a zero
    /// or non-finite vector.
    #[must_use]
    pub fn try_normalize(self) -> Option<Self> {
        let len = self.length();
        if !len.is_finite() || len < 1e-6 {
            return None;
        }
        Some(self * (1.0 / len))
    }

    /// True if every component is finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Floors each component to the block containing this point.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn floor_to_block(self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(arr: [f32; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Integer block coordinate. Also used for unit face normals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 3]", into = "[i32; 3]")]
pub struct BlockPos {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
    /// Z coordinate
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The origin block.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Minimum corner of this block in world space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

impl From<[i32; 3]> for BlockPos {
    fn from(arr: [i32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<BlockPos> for [i32; 3] {
    fn from(p: BlockPos) -> Self {
        p.to_array()
    }
}

impl Add for BlockPos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Width of the backward nudge applied to a boundary hit at coordinate `coord`.
///
/// [`HIT_NUDGE`] is enough while an `f32` ulp is far below it; for very large
/// coordinates the nudge grows to four ulps so the floor is still decided.
#[inline]
#[must_use]
pub fn nudge_epsilon(coord: f32) -> f32 {
    HIT_NUDGE.max(coord.abs() * f32::EPSILON * 4.0)
}

// ============================================================================
// AABB (Axis-Aligned Bounding Box)
// ============================================================================

/// Axis-aligned bounding box stored as base (minimum corner) and size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub base: Vec3,
    /// Extent along each axis.
    pub size: Vec3,
}

impl Aabb {
    /// Creates a new box from its minimum corner and size.
    #[must_use]
    pub const fn new(base: Vec3, size: Vec3) -> Self {
        Self { base, size }
    }

    /// Creates a box whose bottom face is centered on `feet`.
    #[must_use]
    pub fn from_feet(feet: Vec3, width: f32, height: f32) -> Self {
        let half_w = width / 2.0;
        Self {
            base: Vec3::new(feet.x - half_w, feet.y, feet.z - half_w),
            size: Vec3::new(width, height, width),
        }
    }

    /// Creates the unit box occupying a single block.
    #[must_use]
    pub fn from_block(pos: BlockPos) -> Self {
        Self {
            base: pos.as_vec3(),
            size: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    /// Maximum corner.
    #[inline]
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.base + self.size
    }

    /// Center of the bottom face.
    #[must_use]
    pub fn feet(&self) -> Vec3 {
        Vec3::new(
            self.base.x + self.size.x / 2.0,
            self.base.y,
            self.base.z + self.size.z / 2.0,
        )
    }

    /// Moves the box so its bottom-face center sits at `feet`.
    pub fn set_feet(&mut self, feet: Vec3) {
        self.base = Vec3::new(
            feet.x - self.size.x / 2.0,
            feet.y,
            feet.z - self.size.z / 2.0,
        );
    }

    /// Moves the box by `delta`.
    pub fn translate(&mut self, delta: Vec3) {
        self.base += delta;
    }

    /// Closed-interval overlap test: boxes sharing only a face intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        (0..3).all(|axis| {
            self.base.axis(axis) <= b_max.axis(axis) && other.base.axis(axis) <= a_max.axis(axis)
        })
    }

    /// True if the boxes intersect and meet exactly at a boundary on some axis.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn touches(&self, other: &Self) -> bool {
        if !self.intersects(other) {
            return false;
        }
        let (a_max, b_max) = (self.max(), other.max());
        (0..3).any(|axis| {
            a_max.axis(axis) == other.base.axis(axis) || b_max.axis(axis) == self.base.axis(axis)
        })
    }

    /// True if the boxes share a positive volume (intersect but do not
    /// merely touch).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.intersects(other) && !self.touches(other)
    }
}
