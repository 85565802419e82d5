//! Bit packing primitives for mvsync.
//!
//! This crate provides [`BitWriter`] and [`BitReader`], the serialization
//! primitive that message envelopes and octree deltas are written with.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked, length prefixes are capped by the caller.
//! - **No domain knowledge** - This crate knows nothing about voxels, LODs, or packets.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(1, 1).unwrap();
//! writer.write_bits(42, 7).unwrap();
//! writer.write_f32_aligned(0.5).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! assert_eq!(reader.read_f32_aligned().unwrap(), 0.5);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use writer::BitWriter;
