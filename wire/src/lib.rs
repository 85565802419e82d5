//! Datagram framing for mvsync.
//!
//! This crate handles the binary wire format of a single datagram: the
//! fixed header (sequence number, piggybacked acknowledgment, payload
//! length) and limit enforcement. It does not know about messages, records,
//! or voxels.
//!
//! # Design Principles
//!
//! - **Stable wire format** - The header is versioned and validated strictly.
//! - **Bounded decoding** - Datagram size is checked against [`Limits`] before anything else.
//! - **Wraparound-aware** - [`SequenceNumber`] never compares across a wrap by raw value.

mod datagram;
mod error;
mod header;
mod limits;
mod sequence;

pub use datagram::{decode_datagram, encode_datagram, encode_header, Datagram};
pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use header::{DatagramFlags, DatagramHeader, HEADER_SIZE, MAGIC, VERSION};
pub use limits::Limits;
pub use sequence::SequenceNumber;
