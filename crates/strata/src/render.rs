//! Render collaborator contract.

use strata_core::VisualBackend;
use strata_shared::{BlockPos, Vec3};

/// The face of a block to outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockFace {
    /// Block being outlined.
    pub position: BlockPos,
    /// Unit normal of the outlined face.
    pub normal: BlockPos,
}

/// Renderer consumed by the engine. Also owns the visuals attached to entities.
pub trait RenderBackend: VisualBackend {
    /// Direction the camera is looking (need not be normalized).
    fn aim_direction(&self) -> Vec3;

    /// Outlines a block face, or clears the outline with `None`.
    fn highlight_block_face(&mut self, face: Option<BlockFace>);

    /// Per-step renderer bookkeeping.
    fn tick(&mut self, _dt: f32) {}

    /// Draws one frame.
    fn render(&mut self, _dt: f32) {}
}
