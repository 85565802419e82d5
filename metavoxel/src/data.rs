//! Sparse copy-on-write octree data.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{MetavoxelError, MetavoxelResult};
use crate::lod::MetavoxelLod;

/// Deepest octree level a key may address.
pub const MAX_DEPTH: u8 = 16;

/// Root edge length of freshly created data.
pub const DEFAULT_SIZE: f32 = 1.0;

/// Address of an octree cell: depth plus integer coordinates in the
/// `2^depth` grid at that depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoxelKey {
    depth: u8,
    x: u32,
    y: u32,
    z: u32,
}

impl VoxelKey {
    /// The root cell.
    pub const ROOT: Self = Self {
        depth: 0,
        x: 0,
        y: 0,
        z: 0,
    };

    /// Creates a key, validating depth and coordinate range.
    pub fn new(depth: u8, x: u32, y: u32, z: u32) -> MetavoxelResult<Self> {
        if depth > MAX_DEPTH {
            return Err(MetavoxelError::DepthTooLarge {
                depth,
                max_depth: MAX_DEPTH,
            });
        }
        let extent = 1u32 << depth;
        if x >= extent || y >= extent || z >= extent {
            return Err(MetavoxelError::CoordinateOutOfRange { depth, x, y, z });
        }
        Ok(Self { depth, x, y, z })
    }

    #[must_use]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    #[must_use]
    pub const fn coords(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }

    /// Returns the enclosing cell one level up, or `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<Self> {
        if self.depth == 0 {
            return None;
        }
        Some(Self {
            depth: self.depth - 1,
            x: self.x >> 1,
            y: self.y >> 1,
            z: self.z >> 1,
        })
    }

    /// Edge length of this cell inside a root of edge `root_size`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_size(&self, root_size: f32) -> f32 {
        // Powers of two up to 2^MAX_DEPTH are exact in f32.
        root_size / (1u32 << self.depth) as f32
    }

    /// Minimum corner of this cell inside a root of edge `root_size`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn minimum(&self, root_size: f32) -> [f32; 3] {
        let size = self.cell_size(root_size);
        [self.x as f32 * size, self.y as f32 * size, self.z as f32 * size]
    }
}

/// A cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Voxel(pub u32);

/// Sparse octree contents.
///
/// Cells live in a shared map. Cloning is O(1); the first mutation after a
/// clone copies the map, so a clone never observes later writes.
#[derive(Debug, Clone)]
pub struct MetavoxelData {
    size: f32,
    cells: Arc<BTreeMap<VoxelKey, Voxel>>,
}

impl Default for MetavoxelData {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            cells: Arc::default(),
        }
    }
}

impl PartialEq for MetavoxelData {
    fn eq(&self, other: &Self) -> bool {
        self.size.to_bits() == other.size.to_bits()
            && (Arc::ptr_eq(&self.cells, &other.cells) || self.cells == other.cells)
    }
}

impl MetavoxelData {
    /// Creates empty data with root edge length `size`.
    pub fn with_size(size: f32) -> MetavoxelResult<Self> {
        validate_size(size)?;
        Ok(Self {
            size,
            cells: Arc::default(),
        })
    }

    #[must_use]
    pub const fn size(&self) -> f32 {
        self.size
    }

    /// Changes the root edge length, keeping every cell.
    pub fn set_size(&mut self, size: f32) -> MetavoxelResult<()> {
        validate_size(size)?;
        self.size = size;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &VoxelKey) -> Option<Voxel> {
        self.cells.get(key).copied()
    }

    /// Sets a cell, returning the previous value.
    pub fn set(&mut self, key: VoxelKey, voxel: Voxel) -> Option<Voxel> {
        if self.cells.get(&key) == Some(&voxel) {
            return Some(voxel);
        }
        Arc::make_mut(&mut self.cells).insert(key, voxel)
    }

    /// Removes a cell, returning its value.
    pub fn remove(&mut self, key: &VoxelKey) -> Option<Voxel> {
        if !self.cells.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.cells).remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterates cells in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&VoxelKey, &Voxel)> + '_ {
        self.cells.iter()
    }

    /// Returns `true` if every ancestor of `key` is subdivided under `lod`.
    #[must_use]
    pub fn is_visible(&self, key: &VoxelKey, lod: &MetavoxelLod) -> bool {
        let mut current = key.parent();
        while let Some(ancestor) = current {
            if !lod.should_subdivide(ancestor.minimum(self.size), ancestor.cell_size(self.size)) {
                return false;
            }
            current = ancestor.parent();
        }
        true
    }

    /// Drops every cell not visible under `lod`.
    pub fn retain_visible(&mut self, lod: &MetavoxelLod) {
        let hidden: Vec<VoxelKey> = self
            .cells
            .keys()
            .filter(|key| !self.is_visible(key, lod))
            .copied()
            .collect();
        if hidden.is_empty() {
            return;
        }
        let cells = Arc::make_mut(&mut self.cells);
        for key in &hidden {
            cells.remove(key);
        }
    }

    /// Returns a copy holding only the cells visible under `lod`.
    #[must_use]
    pub fn visible_subset(&self, lod: &MetavoxelLod) -> Self {
        let mut subset = self.clone();
        subset.retain_visible(lod);
        subset
    }
}

fn validate_size(size: f32) -> MetavoxelResult<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(MetavoxelError::InvalidSize { size })
    }
}
