//! # Voxel World Contract
//!
//! Chunk storage, generation and meshing live outside the engine. The engine
//! only needs block lookups, block writes and a solidity predicate.

use std::collections::{HashMap, HashSet};

use strata_shared::{BlockPos, BLOCK_AIR};

/// Block storage consumed by the engine.
pub trait VoxelWorld {
    /// Block id at `pos` ([`BLOCK_AIR`] when empty or unloaded).
    fn block_id(&self, pos: BlockPos) -> u32;

    /// Writes a block id.
    fn set_block_id(&mut self, id: u32, pos: BlockPos);

    /// True if the block at `pos` stops movement and rays.
    fn is_solid(&self, pos: BlockPos) -> bool;

    /// Per-step world maintenance (chunk streaming and the like).
    fn tick(&mut self, _dt: f32) {}

    /// False until at least one chunk is loaded; the engine skips
    /// simulation until then.
    fn has_loaded_chunks(&self) -> bool {
        true
    }
}

/// Hash-map backed world for headless runs and tests.
///
/// Every non-air block is solid unless its id was registered with
/// [`SparseWorld::with_non_solid`].
#[derive(Clone, Debug, Default)]
pub struct SparseWorld {
    blocks: HashMap<BlockPos, u32>,
    non_solid: HashSet<u32>,
}

impl SparseWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a block id as present but not solid (water, foliage, ...).
    #[must_use]
    pub fn with_non_solid(mut self, id: u32) -> Self {
        self.non_solid.insert(id);
        self
    }

    /// Fills the inclusive box `min..=max` with `id`.
    pub fn fill(&mut self, id: u32, min: BlockPos, max: BlockPos) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set_block_id(id, BlockPos::new(x, y, z));
                }
            }
        }
    }

    /// Number of non-air blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl VoxelWorld for SparseWorld {
    fn block_id(&self, pos: BlockPos) -> u32 {
        self.blocks.get(&pos).copied().unwrap_or(BLOCK_AIR)
    }

    fn set_block_id(&mut self, id: u32, pos: BlockPos) {
        if id == BLOCK_AIR {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, id);
        }
    }

    fn is_solid(&self, pos: BlockPos) -> bool {
        match self.blocks.get(&pos) {
            Some(id) => !self.non_solid.contains(id),
            None => false,
        }
    }
}
