//! Message envelopes carried in datagram payloads.
//!
//! A payload holds one message envelope followed by the payloads of its
//! leaves in depth-first order. Only [`Message::MetavoxelDelta`] has a
//! payload (an octree delta).
//!
//! ```text
//! tag: u8
//!   0 Empty
//!   1 List            count: varu32, then count envelopes
//!   2 ClientState     lod
//!   3 MetavoxelDelta  lod
//! lod = x: f32, y: f32, z: f32, threshold: f32
//! ```

use bitstream::{BitReader, BitWriter};
use metavoxel::MetavoxelLod;

use crate::error::{EndpointError, EndpointResult, MessageLimitKind};

const TAG_EMPTY: u8 = 0;
const TAG_LIST: u8 = 1;
const TAG_CLIENT_STATE: u8 = 2;
const TAG_METAVOXEL_DELTA: u8 = 3;

/// A decoded message envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// No content.
    Empty,
    /// Several messages, handled in order.
    List(Vec<Message>),
    /// Client to server: the client's current level of detail.
    ClientState { lod: MetavoxelLod },
    /// Server to client: an octree delta for `lod` follows.
    MetavoxelDelta { lod: MetavoxelLod },
}

/// Bounds applied while decoding envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageLimits {
    /// Maximum entries in one list.
    pub max_list_len: usize,
    /// Maximum list nesting.
    pub max_depth: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            max_list_len: 64,
            max_depth: 4,
        }
    }
}

impl MessageLimits {
    /// Small limits for unit tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_list_len: 8,
            max_depth: 2,
        }
    }
}

impl Message {
    /// Writes the envelope.
    pub fn encode(&self, out: &mut BitWriter) -> EndpointResult<()> {
        match self {
            Self::Empty => out.write_u8_aligned(TAG_EMPTY)?,
            Self::List(items) => {
                out.write_u8_aligned(TAG_LIST)?;
                let count = u32::try_from(items.len()).map_err(|_| EndpointError::MessageLimits {
                    kind: MessageLimitKind::ListLength,
                    limit: u32::MAX as usize,
                    actual: items.len(),
                })?;
                out.write_varu32(count)?;
                for item in items {
                    item.encode(out)?;
                }
            }
            Self::ClientState { lod } => {
                out.write_u8_aligned(TAG_CLIENT_STATE)?;
                write_lod(out, lod)?;
            }
            Self::MetavoxelDelta { lod } => {
                out.write_u8_aligned(TAG_METAVOXEL_DELTA)?;
                write_lod(out, lod)?;
            }
        }
        Ok(())
    }

    /// Reads an envelope.
    pub fn decode(input: &mut BitReader<'_>, limits: &MessageLimits) -> EndpointResult<Self> {
        Self::decode_nested(input, limits, 0)
    }

    fn decode_nested(
        input: &mut BitReader<'_>,
        limits: &MessageLimits,
        depth: usize,
    ) -> EndpointResult<Self> {
        let tag = input.read_u8_aligned()?;
        match tag {
            TAG_EMPTY => Ok(Self::Empty),
            TAG_LIST => {
                if depth >= limits.max_depth {
                    return Err(EndpointError::MessageLimits {
                        kind: MessageLimitKind::Depth,
                        limit: limits.max_depth,
                        actual: depth + 1,
                    });
                }
                let count = input.read_varu32()? as usize;
                if count > limits.max_list_len {
                    return Err(EndpointError::MessageLimits {
                        kind: MessageLimitKind::ListLength,
                        limit: limits.max_list_len,
                        actual: count,
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(Self::decode_nested(input, limits, depth + 1)?);
                }
                Ok(Self::List(items))
            }
            TAG_CLIENT_STATE => Ok(Self::ClientState {
                lod: read_lod(input)?,
            }),
            TAG_METAVOXEL_DELTA => Ok(Self::MetavoxelDelta {
                lod: read_lod(input)?,
            }),
            _ => Err(EndpointError::UnknownMessageTag { tag }),
        }
    }
}

fn write_lod(out: &mut BitWriter, lod: &MetavoxelLod) -> EndpointResult<()> {
    for coord in lod.position {
        out.write_f32_aligned(coord)?;
    }
    out.write_f32_aligned(lod.threshold)?;
    Ok(())
}

fn read_lod(input: &mut BitReader<'_>) -> EndpointResult<MetavoxelLod> {
    let x = input.read_f32_aligned()?;
    let y = input.read_f32_aligned()?;
    let z = input.read_f32_aligned()?;
    let threshold = input.read_f32_aligned()?;
    Ok(MetavoxelLod::new([x, y, z], threshold))
}
