use bitstream::{BitReader, BitWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Bit(bool),
    Bits { bits: u8, value: u64 },
    Align,
    U8(u8),
    F32(f32),
    VarU32(u32),
    Bytes(Vec<u8>),
}

impl Op {
    const fn is_aligned(&self) -> bool {
        !matches!(self, Self::Bit(_) | Self::Bits { .. } | Self::Align)
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Bit),
        (1u8..=64, any::<u64>()).prop_map(|(bits, value)| Op::Bits {
            bits,
            value: if bits == 64 {
                value
            } else {
                value & ((1u64 << bits) - 1)
            },
        }),
        Just(Op::Align),
        any::<u8>().prop_map(Op::U8),
        (-1.0e6f32..1.0e6).prop_map(Op::F32),
        any::<u32>().prop_map(Op::VarU32),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Op::Bytes),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = BitWriter::new();
        for op in &ops {
            if op.is_aligned() {
                writer.align_to_byte();
            }
            match op {
                Op::Bit(b) => writer.write_bits(u64::from(*b), 1).unwrap(),
                Op::Bits { bits, value } => writer.write_bits(*value, *bits).unwrap(),
                Op::Align => writer.align_to_byte(),
                Op::U8(v) => writer.write_u8_aligned(*v).unwrap(),
                Op::F32(v) => writer.write_f32_aligned(*v).unwrap(),
                Op::VarU32(v) => writer.write_varu32(*v).unwrap(),
                Op::Bytes(v) => writer.write_bytes(v).unwrap(),
            }
        }

        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        for op in &ops {
            if op.is_aligned() {
                reader.align_to_byte().unwrap();
            }
            match op {
                Op::Bit(b) => prop_assert_eq!(reader.read_bit().unwrap(), *b),
                Op::Bits { bits, value } => prop_assert_eq!(reader.read_bits(*bits).unwrap(), *value),
                Op::Align => reader.align_to_byte().unwrap(),
                Op::U8(v) => prop_assert_eq!(reader.read_u8_aligned().unwrap(), *v),
                Op::F32(v) => prop_assert_eq!(reader.read_f32_aligned().unwrap(), *v),
                Op::VarU32(v) => prop_assert_eq!(reader.read_varu32().unwrap(), *v),
                Op::Bytes(v) => prop_assert_eq!(reader.read_bytes(64).unwrap(), v.as_slice()),
            }
        }
        prop_assert!(reader.bits_remaining() < 8);
    }

    #[test]
    fn prop_reader_never_panics(data in prop::collection::vec(any::<u8>(), 0..64), steps in 0usize..32) {
        let mut reader = BitReader::new(&data);
        for step in 0..steps {
            let _ = match step % 4 {
                0 => reader.read_bits((step % 65) as u8).map(|_| ()),
                1 => reader.align_to_byte(),
                2 => reader.read_varu32().map(|_| ()),
                _ => reader.read_bytes(16).map(|_| ()),
            };
        }
    }
}
