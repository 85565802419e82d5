//! LOD-aware octree deltas.
//!
//! A delta carries what a receiver holding `baseline` (as visible under
//! `baseline_lod`) needs to reconstruct `current` as visible under `lod`:
//!
//! ```text
//! size: f32
//! set_count: varu32, then set_count × (key, value: varu32)
//! remove_count: varu32, then remove_count × key
//! key = depth: 5 bits, x, y, z: depth bits each, zero padding to a byte
//! ```
//!
//! Every field other than the key's packed bits is byte-aligned.

use bitstream::{BitReader, BitWriter};

use crate::data::{MetavoxelData, Voxel, VoxelKey, MAX_DEPTH};
use crate::error::{DeltaLimitKind, MetavoxelError, MetavoxelResult};
use crate::lod::MetavoxelLod;

/// Bounds applied while decoding a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeltaLimits {
    /// Maximum set plus removed cells in one delta.
    pub max_changes: usize,
    /// Maximum key depth accepted.
    pub max_depth: u8,
}

impl Default for DeltaLimits {
    fn default() -> Self {
        Self {
            max_changes: 65_536,
            max_depth: MAX_DEPTH,
        }
    }
}

impl DeltaLimits {
    /// Small limits for unit tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_changes: 1024,
            max_depth: 8,
        }
    }
}

/// Counts of what a written delta contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeltaSummary {
    pub sets: usize,
    pub removals: usize,
}

impl DeltaSummary {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sets == 0 && self.removals == 0
    }
}

/// Writes the changes from `baseline` to `current`.
pub fn write_delta(
    current: &MetavoxelData,
    lod: &MetavoxelLod,
    baseline: &MetavoxelData,
    baseline_lod: &MetavoxelLod,
    out: &mut BitWriter,
) -> MetavoxelResult<DeltaSummary> {
    let known = |key: &VoxelKey| {
        baseline
            .get(key)
            .filter(|_| baseline.is_visible(key, baseline_lod))
    };

    let sets: Vec<(VoxelKey, Voxel)> = current
        .iter()
        .filter(|(key, voxel)| current.is_visible(key, lod) && known(*key) != Some(**voxel))
        .map(|(key, voxel)| (*key, *voxel))
        .collect();

    let removals: Vec<VoxelKey> = baseline
        .iter()
        .map(|(key, _)| *key)
        .filter(|key| {
            current.get(key).is_none()
                && baseline.is_visible(key, baseline_lod)
                && current.is_visible(key, lod)
        })
        .collect();

    out.write_f32_aligned(current.size())?;
    write_count(out, sets.len())?;
    for (key, voxel) in &sets {
        write_key(out, key)?;
        out.write_varu32(voxel.0)?;
    }
    write_count(out, removals.len())?;
    for key in &removals {
        write_key(out, key)?;
    }

    Ok(DeltaSummary {
        sets: sets.len(),
        removals: removals.len(),
    })
}

/// Applies a delta to `baseline` and keeps only the cells visible under `lod`.
pub fn read_delta(
    baseline: &MetavoxelData,
    lod: &MetavoxelLod,
    input: &mut BitReader<'_>,
    limits: &DeltaLimits,
) -> MetavoxelResult<MetavoxelData> {
    let mut data = baseline.clone();
    data.set_size(input.read_f32_aligned()?)?;

    let set_count = read_count(input, limits.max_changes)?;
    for _ in 0..set_count {
        let key = read_key(input, limits)?;
        let voxel = Voxel(input.read_varu32()?);
        data.set(key, voxel);
    }

    let remove_count = read_count(input, limits.max_changes - set_count)?;
    for _ in 0..remove_count {
        let key = read_key(input, limits)?;
        data.remove(&key);
    }

    data.retain_visible(lod);
    Ok(data)
}

fn write_count(out: &mut BitWriter, count: usize) -> MetavoxelResult<()> {
    let count = u32::try_from(count).map_err(|_| MetavoxelError::LimitsExceeded {
        kind: DeltaLimitKind::Changes,
        limit: u32::MAX as usize,
        actual: count,
    })?;
    out.write_varu32(count)?;
    Ok(())
}

fn read_count(input: &mut BitReader<'_>, limit: usize) -> MetavoxelResult<usize> {
    let count = input.read_varu32()? as usize;
    if count > limit {
        return Err(MetavoxelError::LimitsExceeded {
            kind: DeltaLimitKind::Changes,
            limit,
            actual: count,
        });
    }
    Ok(count)
}

/// Bits holding a key's depth; enough for [`MAX_DEPTH`].
const DEPTH_BITS: u8 = 5;

fn write_key(out: &mut BitWriter, key: &VoxelKey) -> MetavoxelResult<()> {
    let depth = key.depth();
    out.write_bits(u64::from(depth), DEPTH_BITS)?;
    for coord in key.coords() {
        out.write_bits(u64::from(coord), depth)?;
    }
    out.align_to_byte();
    Ok(())
}

fn read_key(input: &mut BitReader<'_>, limits: &DeltaLimits) -> MetavoxelResult<VoxelKey> {
    #[allow(clippy::cast_possible_truncation)]
    let depth = input.read_bits(DEPTH_BITS)? as u8;
    if depth > limits.max_depth {
        return Err(MetavoxelError::LimitsExceeded {
            kind: DeltaLimitKind::Depth,
            limit: usize::from(limits.max_depth),
            actual: usize::from(depth),
        });
    }
    if depth > MAX_DEPTH {
        return Err(MetavoxelError::DepthTooLarge {
            depth,
            max_depth: MAX_DEPTH,
        });
    }
    let mut coords = [0u32; 3];
    for coord in &mut coords {
        // depth <= MAX_DEPTH keeps each coordinate within 16 bits.
        #[allow(clippy::cast_possible_truncation)]
        let value = input.read_bits(depth)? as u32;
        *coord = value;
    }
    input.align_to_byte()?;
    let [x, y, z] = coords;
    VoxelKey::new(depth, x, y, z)
}
