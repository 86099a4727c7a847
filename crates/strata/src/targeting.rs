//! # Block Targeting
//!
//! Voxel raycasting for block selection, plus the per-step targeter that
//! reports when the aimed-at block changes.
//!
//! The raycast walks the grid with a DDA (Amanatides & Woo): at each step it
//! advances along whichever axis reaches its next voxel boundary first, so
//! every voxel the ray passes through is visited exactly once.

use strata_shared::{nudge_epsilon, BlockPos, Vec3, BLOCK_AIR, MAX_RAY_DISTANCE};

use crate::world::VoxelWorld;

// ============================================================================
// RAYCAST
// ============================================================================

/// Result of a raycast against the voxel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// The voxel that was hit.
    pub block: BlockPos,
    /// Exact hit position in world space (on the struck face).
    pub position: Vec3,
    /// Unit normal of the struck face; zero when the ray starts inside the block.
    pub normal: BlockPos,
    /// Distance from ray origin to hit point.
    pub distance: f32,
}

/// Casts a ray from `origin` along `direction` and returns the first voxel
/// for which `is_hit` holds, within `max_distance`.
///
/// Returns `None` for a zero or non-finite direction, a non-finite origin
/// or a non-finite distance. `max_distance` is clamped to
/// [`MAX_RAY_DISTANCE`]; a walk that would leave the `i32` grid ends as a miss.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn raycast(
    is_hit: impl Fn(BlockPos) -> bool,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<RayHit> {
    if !origin.is_finite() || !max_distance.is_finite() || max_distance < 0.0 {
        return None;
    }
    let dir = direction.try_normalize()?;
    let max_distance = max_distance.min(MAX_RAY_DISTANCE);
    // At most one boundary crossing per unit of distance on each axis.
    let max_steps = 3 * (max_distance.ceil() as usize + 1);

    let start = origin.floor_to_block();
    let mut voxel = start.to_array();
    let origin = origin.to_array();
    let dir = dir.to_array();

    // Step direction for each axis (0 when the ray is parallel to it)
    let step = dir.map(|d| {
        if d > 0.0 {
            1
        } else if d < 0.0 {
            -1
        } else {
            0
        }
    });

    // Distance between voxel boundaries along each axis
    let t_delta = dir.map(|d| if d == 0.0 { f32::INFINITY } else { (1.0 / d).abs() });

    // Distance to the first voxel boundary along each axis
    let mut t_max = [0.0_f32; 3];
    for axis in 0..3 {
        t_max[axis] = match step[axis] {
            1 => (voxel[axis] as f32 + 1.0 - origin[axis]) / dir[axis],
            -1 => (voxel[axis] as f32 - origin[axis]) / dir[axis],
            _ => f32::INFINITY,
        };
    }

    let mut distance = 0.0_f32;
    let mut normal = [0, 0, 0];

    for _ in 0..=max_steps {
        if distance > max_distance {
            break;
        }
        let block = BlockPos::from(voxel);
        if is_hit(block) {
            let position = Vec3::new(
                origin[0] + dir[0] * distance,
                origin[1] + dir[1] * distance,
                origin[2] + dir[2] * distance,
            );
            return Some(RayHit {
                block,
                position,
                normal: BlockPos::from(normal),
                distance,
            });
        }

        // Step to next voxel; ties resolve x, then y, then z
        let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
            0
        } else if t_max[1] <= t_max[2] {
            1
        } else {
            2
        };
        distance = t_max[axis];
        t_max[axis] += t_delta[axis];
        voxel[axis] = voxel[axis].checked_add(step[axis])?;
        normal = [0, 0, 0];
        normal[axis] = -step[axis];
    }

    None
}

// ============================================================================
// PICK
// ============================================================================

/// A pick hit: the struck face point pushed just inside the struck block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickResult {
    /// Hit point nudged backward along the normal, so flooring it yields
    /// the struck block.
    pub position: Vec3,
    /// Unit normal of the struck face.
    pub normal: BlockPos,
}

impl PickResult {
    /// The struck block.
    #[must_use]
    pub fn block(&self) -> BlockPos {
        self.position.floor_to_block()
    }
}

/// Casts a ray against `world`.
///
/// With `collision_only` the ray stops at solid blocks; otherwise it stops at
/// any non-air block. A `max_distance` of zero never hits.
pub fn pick<W: VoxelWorld + ?Sized>(
    world: &W,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    collision_only: bool,
) -> Option<PickResult> {
    if max_distance == 0.0 {
        return None;
    }
    let hit = if collision_only {
        raycast(|pos| world.is_solid(pos), origin, direction, max_distance)
    } else {
        raycast(|pos| world.block_id(pos) != BLOCK_AIR, origin, direction, max_distance)
    };
    let hit = hit?;

    // The hit point sits exactly on a voxel boundary; push it into the struck block.
    let mut position = hit.position.to_array();
    let normal = hit.normal.to_array();
    for axis in 0..3 {
        #[allow(clippy::cast_precision_loss)]
        let n = normal[axis] as f32;
        position[axis] -= n * nudge_epsilon(position[axis]);
    }

    Some(PickResult {
        position: Vec3::from(position),
        normal: hit.normal,
    })
}

// ============================================================================
// TARGETER
// ============================================================================

/// The block currently aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetedBlock {
    /// Id of the struck block.
    pub block_id: u32,
    /// The struck block.
    pub position: BlockPos,
    /// Unit normal of the struck face.
    pub normal: BlockPos,
    /// The cell in front of the struck face (`position + normal`).
    pub adjacent: BlockPos,
}

impl TargetedBlock {
    fn fingerprint(&self) -> TargetFingerprint {
        TargetFingerprint {
            position: self.position,
            normal: self.normal,
            block_id: self.block_id,
        }
    }
}

/// Identity of a target for change detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetFingerprint {
    /// The struck block.
    pub position: BlockPos,
    /// Unit normal of the struck face.
    pub normal: BlockPos,
    /// Id of the struck block.
    pub block_id: u32,
}

/// Outcome of [`BlockTargeter::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetUpdate {
    /// Same target as the previous step.
    Unchanged,
    /// The target changed to the contained value.
    Changed(Option<TargetedBlock>),
}

/// Tracks the targeted block across steps.
#[derive(Clone, Debug, Default)]
pub struct BlockTargeter {
    target: Option<TargetedBlock>,
    fingerprint: Option<TargetFingerprint>,
}

impl BlockTargeter {
    /// Creates a targeter with nothing targeted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current target.
    #[must_use]
    pub fn target(&self) -> Option<TargetedBlock> {
        self.target
    }

    /// Drops the target when there is no viewer to aim from.
    pub fn clear(&mut self) -> TargetUpdate {
        self.target = None;
        if self.fingerprint.take().is_some() {
            TargetUpdate::Changed(None)
        } else {
            TargetUpdate::Unchanged
        }
    }

    /// Recomputes the target from `eye` along `aim` and reports whether it changed.
    pub fn update<W: VoxelWorld + ?Sized>(
        &mut self,
        world: &W,
        eye: Vec3,
        aim: Vec3,
        max_distance: f32,
    ) -> TargetUpdate {
        self.target = pick(world, eye, aim, max_distance, true).map(|hit| {
            let position = hit.block();
            TargetedBlock {
                block_id: world.block_id(position),
                position,
                normal: hit.normal,
                adjacent: position + hit.normal,
            }
        });

        let fingerprint = self.target.as_ref().map(TargetedBlock::fingerprint);
        if fingerprint == self.fingerprint {
            return TargetUpdate::Unchanged;
        }
        self.fingerprint = fingerprint;
        tracing::debug!("target block changed: {:?}", self.target);
        TargetUpdate::Changed(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SparseWorld;

    fn floor_world() -> SparseWorld {
        let mut world = SparseWorld::new();
        world.fill(1, BlockPos::new(-4, 0, -4), BlockPos::new(4, 0, 4));
        world
    }

    #[test]
    fn test_raycast_hits_ground() {
        let world = floor_world();
        let hit = raycast(|p| world.is_solid(p), Vec3::new(0.5, 5.5, 0.5), -Vec3::Y, 100.0).unwrap();

        assert_eq!(hit.block, BlockPos::new(0, 0, 0));
        assert_eq!(hit.normal, BlockPos::new(0, 1, 0));
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!((hit.position.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_out_of_range() {
        let world = floor_world();
        assert!(raycast(|p| world.is_solid(p), Vec3::new(0.5, 5.5, 0.5), -Vec3::Y, 4.0).is_none());
    }

    #[test]
    fn test_raycast_axis_parallel_negative_x() {
        let mut world = SparseWorld::new();
        world.set_block_id(3, BlockPos::new(-3, 0, 0));
        let hit = raycast(|p| world.is_solid(p), Vec3::new(0.5, 0.5, 0.5), -Vec3::X, 10.0).unwrap();

        assert_eq!(hit.block, BlockPos::new(-3, 0, 0));
        assert_eq!(hit.normal, BlockPos::new(1, 0, 0));
    }

    #[test]
    fn test_raycast_diagonal_tie_steps_x_first() {
        // Through the corner at (1, 1): x is crossed first, so (0, 1, 0) is skipped.
        let mut world = SparseWorld::new();
        world.set_block_id(1, BlockPos::new(0, 1, 0));
        world.set_block_id(1, BlockPos::new(1, 1, 0));
        let dir = Vec3::new(1.0, 1.0, 0.0);
        let hit = raycast(|p| world.is_solid(p), Vec3::new(0.5, 0.5, 0.5), dir, 10.0).unwrap();

        assert_eq!(hit.block, BlockPos::new(1, 1, 0));
        assert_eq!(hit.normal, BlockPos::new(0, -1, 0));
        assert!((hit.distance - 0.5 * std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_diagonal_accumulates_boundaries() {
        // Visits (0,0,0) -> (1,0,0) at 0.894 -> (1,1,0) at 1.118 -> (2,1,0) at 2.012.
        let mut world = SparseWorld::new();
        world.set_block_id(1, BlockPos::new(2, 1, 0));
        world.set_block_id(1, BlockPos::new(2, 0, 0));
        let dir = Vec3::new(2.0, 1.0, 0.0);
        let hit = raycast(|p| world.is_solid(p), Vec3::new(0.2, 0.5, 0.5), dir, 10.0).unwrap();

        assert_eq!(hit.block, BlockPos::new(2, 1, 0));
        assert_eq!(hit.normal, BlockPos::new(-1, 0, 0));
        let expected = 1.8 * 5.0_f32.sqrt() / 2.0;
        assert!((hit.distance - expected).abs() < 1e-4);
        assert!((hit.position.x - 2.0).abs() < 1e-4);
        assert!((hit.position.y - 1.4).abs() < 1e-4);
    }

    #[test]
    fn test_raycast_negative_from_voxel_boundary() {
        // Origin on the x = 2 face: the block behind it is entered at distance zero.
        let mut world = SparseWorld::new();
        world.set_block_id(1, BlockPos::new(1, 0, 0));
        let origin = Vec3::new(2.0, 0.5, 0.5);
        let hit = raycast(|p| world.is_solid(p), origin, -Vec3::X, 10.0).unwrap();

        assert_eq!(hit.block, BlockPos::new(1, 0, 0));
        assert_eq!(hit.normal, BlockPos::new(1, 0, 0));
        assert!(hit.distance.abs() < f32::EPSILON);

        let picked = pick(&world, origin, -Vec3::X, 10.0, true).unwrap();
        assert_eq!(picked.block(), BlockPos::new(1, 0, 0));
    }

    #[test]
    fn test_pick_huge_distance_into_empty_space_returns() {
        let world = SparseWorld::new();
        assert!(pick(&world, Vec3::new(0.5, 0.5, 0.5), Vec3::X, 1.0e9, true).is_none());
        let dir = Vec3::new(0.3, -0.5, 0.8);
        assert!(pick(&world, Vec3::new(0.5, 0.5, 0.5), dir, f32::MAX, true).is_none());
    }

    #[test]
    fn test_raycast_clamps_to_max_ray_distance() {
        let mut world = SparseWorld::new();
        world.set_block_id(1, BlockPos::new(5000, 0, 0));
        world.set_block_id(1, BlockPos::new(4000, 0, 0));
        let origin = Vec3::new(0.5, 0.5, 0.5);

        let hit = raycast(|p| world.is_solid(p), origin, Vec3::X, 1.0e9).unwrap();
        assert_eq!(hit.block, BlockPos::new(4000, 0, 0));

        world.set_block_id(BLOCK_AIR, BlockPos::new(4000, 0, 0));
        assert!(raycast(|p| world.is_solid(p), origin, Vec3::X, 1.0e9).is_none());
    }

    #[test]
    fn test_raycast_starting_inside_block() {
        let world = floor_world();
        let hit = raycast(|p| world.is_solid(p), Vec3::new(0.5, 0.5, 0.5), Vec3::Y, 10.0).unwrap();

        assert_eq!(hit.block, BlockPos::ZERO);
        assert_eq!(hit.normal, BlockPos::ZERO);
        assert!(hit.distance.abs() < f32::EPSILON);
    }

    #[test]
    fn test_raycast_rejects_degenerate_input() {
        let world = floor_world();
        assert!(raycast(|p| world.is_solid(p), Vec3::new(0.5, 5.5, 0.5), Vec3::ZERO, 10.0).is_none());
        assert!(raycast(|p| world.is_solid(p), Vec3::new(0.5, 5.5, 0.5), -Vec3::Y, f32::INFINITY).is_none());
    }

    #[test]
    fn test_pick_zero_distance_is_none() {
        let world = floor_world();
        assert!(pick(&world, Vec3::new(0.5, 0.5, 0.5), -Vec3::Y, 0.0, true).is_none());
    }

    #[test]
    fn test_pick_nudges_into_struck_block() {
        let world = floor_world();
        let hit = pick(&world, Vec3::new(0.5, 5.5, 0.5), -Vec3::Y, 10.0, true).unwrap();

        assert!((hit.position.y - 0.99).abs() < 1e-5);
        assert_eq!(hit.block(), BlockPos::new(0, 0, 0));
        assert_eq!(hit.normal, BlockPos::new(0, 1, 0));
    }

    #[test]
    fn test_pick_far_from_origin_still_floors_correctly() {
        let mut world = SparseWorld::new();
        let far = BlockPos::new(3_000_000, 0, 0);
        world.set_block_id(1, far);
        let hit = pick(&world, Vec3::new(3_000_000.5, 5.5, 0.5), -Vec3::Y, 10.0, true).unwrap();

        assert_eq!(hit.block(), far);
    }

    #[test]
    fn test_pick_collision_only_skips_non_solid() {
        let mut world = floor_world().with_non_solid(7);
        world.set_block_id(7, BlockPos::new(0, 2, 0));

        let any = pick(&world, Vec3::new(0.5, 5.5, 0.5), -Vec3::Y, 10.0, false).unwrap();
        let solid = pick(&world, Vec3::new(0.5, 5.5, 0.5), -Vec3::Y, 10.0, true).unwrap();

        assert_eq!(any.block(), BlockPos::new(0, 2, 0));
        assert_eq!(solid.block(), BlockPos::new(0, 0, 0));
    }

    #[test]
    fn test_targeter_reports_change_once() {
        let world = floor_world();
        let mut targeter = BlockTargeter::new();
        let eye = Vec3::new(0.5, 3.5, 0.5);

        let first = targeter.update(&world, eye, -Vec3::Y, 10.0);
        let TargetUpdate::Changed(Some(target)) = first else {
            panic!("expected a new target, got {first:?}");
        };
        assert_eq!(target.position, BlockPos::ZERO);
        assert_eq!(target.adjacent, BlockPos::new(0, 1, 0));
        assert_eq!(target.block_id, 1);

        assert_eq!(targeter.update(&world, eye, -Vec3::Y, 10.0), TargetUpdate::Unchanged);
        assert_eq!(targeter.update(&world, eye, Vec3::Y, 10.0), TargetUpdate::Changed(None));
        assert_eq!(targeter.update(&world, eye, Vec3::Y, 10.0), TargetUpdate::Unchanged);
    }

    #[test]
    fn test_targeter_initial_miss_is_unchanged() {
        let world = SparseWorld::new();
        let mut targeter = BlockTargeter::new();
        assert_eq!(
            targeter.update(&world, Vec3::ZERO, Vec3::X, 10.0),
            TargetUpdate::Unchanged
        );
        assert!(targeter.target().is_none());
    }

    #[test]
    fn test_targeter_block_id_change_is_a_change() {
        let mut world = floor_world();
        let mut targeter = BlockTargeter::new();
        let eye = Vec3::new(0.5, 3.5, 0.5);
        targeter.update(&world, eye, -Vec3::Y, 10.0);

        world.set_block_id(2, BlockPos::ZERO);
        let update = targeter.update(&world, eye, -Vec3::Y, 10.0);

        assert!(matches!(update, TargetUpdate::Changed(Some(t)) if t.block_id == 2));
    }
}
