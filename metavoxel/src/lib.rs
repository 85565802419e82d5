//! Metavoxel data model for mvsync.
//!
//! This crate defines the state that endpoints replicate:
//! - [`MetavoxelLod`], the viewer-relative level of detail
//! - [`MetavoxelData`], a sparse copy-on-write octree of [`Voxel`] cells
//! - LOD-aware deltas between two snapshots ([`write_delta`], [`read_delta`])
//!
//! # Design Principles
//!
//! - **Cheap snapshots** - Cloning data shares cells until the next write.
//! - **Receiver sees what its LOD shows** - Decoded data only holds visible cells.
//! - **Bounded decoding** - [`DeltaLimits`] caps change counts and key depth.

mod data;
mod delta;
mod error;
mod lod;

pub use data::{MetavoxelData, Voxel, VoxelKey, DEFAULT_SIZE, MAX_DEPTH};
pub use delta::{read_delta, write_delta, DeltaLimits, DeltaSummary};
pub use error::{DeltaLimitKind, MetavoxelError, MetavoxelResult};
pub use lod::MetavoxelLod;

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::{BitReader, BitWriter};

    #[test]
    fn public_api_exports() {
        let _ = MetavoxelLod::default();
        let _ = MetavoxelData::default();
        let _ = VoxelKey::ROOT;
        let _ = Voxel(0);
        let _ = DeltaLimits::default();
    }

    #[test]
    fn delta_chain_tracks_sender() {
        let lod = MetavoxelLod::default();
        let mut sender = MetavoxelData::with_size(8.0).unwrap();
        let mut receiver = MetavoxelData::default();
        let mut baseline = MetavoxelData::default();

        for step in 0..5u32 {
            sender.set(VoxelKey::new(3, step, 0, 0).unwrap(), Voxel(step));
            let mut writer = BitWriter::new();
            write_delta(&sender, &lod, &baseline, &lod, &mut writer).unwrap();
            let bytes = writer.finish();
            receiver =
                read_delta(&receiver, &lod, &mut BitReader::new(&bytes), &DeltaLimits::default())
                    .unwrap();
            baseline = sender.clone();
            assert_eq!(receiver, sender);
        }
    }
}
