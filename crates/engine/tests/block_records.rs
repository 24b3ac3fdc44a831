//! End-to-end behaviour of block records through the public API: packed
//! id/meta accessors, the fixed 8-byte encoding, and the extended metadata bag.

use std::io::Cursor;

use chrono::{DateTime, TimeZone, Utc};
use infinimap_engine::BlockError;
use infinimap_engine::world::{
    BLOCK_ENCODED_LEN, Block, BlockId, BlockMeta, ExtendedMetadata, MetaValue,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Packed fields
// ---------------------------------------------------------------------------

#[test]
fn id_then_meta_packs_into_one_word() {
    let mut block = Block::new(0, 0);
    block.set_block_id(BlockId(0x1234));
    block.set_block_meta(BlockMeta(0x5678));
    assert_eq!(block.block_data(), 0x5678_1234);

    let mut out = Vec::new();
    block.write(&mut out).unwrap();
    assert_eq!(out.len(), BLOCK_ENCODED_LEN);

    let back = Block::read_from(&mut Cursor::new(out)).unwrap();
    assert_eq!(back.block_data(), 0x5678_1234);
    assert_eq!(back.block_id(), BlockId(0x1234));
    assert_eq!(back.block_meta(), BlockMeta(0x5678));
}

proptest! {
    #[test]
    fn packing_is_order_independent(a: u16, b: u16, start: u32) {
        let mut id_first = Block::new(start, 0);
        id_first.set_block_id(BlockId(a));
        id_first.set_block_meta(BlockMeta(b));

        let mut meta_first = Block::new(start, 0);
        meta_first.set_block_meta(BlockMeta(b));
        meta_first.set_block_id(BlockId(a));

        prop_assert_eq!(id_first.block_id(), BlockId(a));
        prop_assert_eq!(id_first.block_meta(), BlockMeta(b));
        prop_assert_eq!(id_first.block_data(), meta_first.block_data());
    }

    #[test]
    fn write_then_read_reproduces_fields(data: u32, flags: u32) {
        let block = Block::new(data, flags);
        let mut out = Vec::new();
        block.write(&mut out).unwrap();

        let mut fresh = Block::default();
        fresh.read(&mut Cursor::new(out)).unwrap();
        prop_assert_eq!(fresh.block_data(), data);
        prop_assert_eq!(fresh.flags(), flags);
    }

    #[test]
    fn short_read_never_corrupts(
        len in 0usize..BLOCK_ENCODED_LEN,
        data in any::<u32>(),
        flags in any::<u32>(),
    ) {
        let mut block = Block::new(data, flags);
        let err = block.read(&mut Cursor::new(vec![0x5A; len])).unwrap_err();
        prop_assert!(matches!(err, BlockError::StreamExhausted { .. }), "got {:?}", err);
        prop_assert_eq!(block.block_data(), data);
        prop_assert_eq!(block.flags(), flags);
    }
}

#[test]
fn many_blocks_stream_back_in_order() {
    let blocks: Vec<Block> = (0..16u16)
        .map(|i| Block::from_parts(BlockId(i), BlockMeta(i * 3), u32::from(i) << 8))
        .collect();

    let mut out = Vec::new();
    for block in &blocks {
        block.write(&mut out).unwrap();
    }
    assert_eq!(out.len(), blocks.len() * BLOCK_ENCODED_LEN);

    let mut src = Cursor::new(out);
    for expected in &blocks {
        let got = Block::read_from(&mut src).unwrap();
        assert_eq!(&got, expected);
    }
    assert!(matches!(
        Block::read_from(&mut src),
        Err(BlockError::StreamExhausted { .. })
    ));
}

// ---------------------------------------------------------------------------
// Extended metadata
// ---------------------------------------------------------------------------

#[test]
fn fresh_block_has_no_metadata_bytes() {
    let block = Block::new(42, 0);
    assert!(block.metadata_buffer().unwrap().is_empty());
    assert!(block.metadata().get("missing").is_none());
}

#[test]
fn metadata_is_not_shared_between_blocks() {
    let mut a = Block::default();
    let b = a.clone();
    a.metadata_mut().set("lit", true);
    assert!(a.metadata().contains_key("lit"));
    assert!(b.metadata().is_empty());
    assert!(Block::default().metadata().is_empty());
}

#[test]
fn unsupported_value_leaves_bag_unchanged() {
    let mut block = Block::default();
    block.metadata_mut().set("k", 42);

    let err = block
        .metadata_mut()
        .set_any("k", &std::collections::HashMap::<String, i32>::new())
        .unwrap_err();
    assert!(matches!(err, BlockError::UnsupportedType { .. }));
    assert_eq!(block.metadata().get("k"), Some(&MetaValue::I32(42)));
}

#[test]
fn metadata_buffer_decodes_to_same_bag() {
    let mut block = Block::from_parts(BlockId(54), BlockMeta(2), 0);
    let meta = block.metadata_mut();
    meta.set("owner", "alex");
    meta.set("locked", true);
    meta.set("slots", 27u8);
    meta.set("placed", Utc.with_ymd_and_hms(2023, 11, 14, 8, 0, 0).unwrap());

    let bytes = block.metadata_buffer().unwrap();
    assert!(!bytes.is_empty());

    let back = ExtendedMetadata::deserialize(&bytes).unwrap();
    assert_eq!(&back, block.metadata());
    assert_eq!(back.get("slots"), Some(&MetaValue::U8(27)));
    assert_eq!(back.get("locked").and_then(MetaValue::as_bool), Some(true));
}

#[test]
fn empty_buffer_means_no_metadata() {
    let meta = ExtendedMetadata::deserialize(&[]).unwrap();
    assert!(meta.is_empty());
    assert_eq!(meta.len(), 0);
}

fn integer_value() -> impl Strategy<Value = MetaValue> {
    prop_oneof![
        any::<i8>().prop_map(MetaValue::I8),
        any::<i16>().prop_map(MetaValue::I16),
        any::<i32>().prop_map(MetaValue::I32),
        any::<i64>().prop_map(MetaValue::I64),
        any::<i128>().prop_map(MetaValue::I128),
        any::<isize>().prop_map(MetaValue::Isize),
        any::<u8>().prop_map(MetaValue::U8),
        any::<u16>().prop_map(MetaValue::U16),
        any::<u32>().prop_map(MetaValue::U32),
    ]
}

fn other_value() -> impl Strategy<Value = MetaValue> {
    prop_oneof![
        any::<u64>().prop_map(MetaValue::U64),
        any::<u128>().prop_map(MetaValue::U128),
        any::<usize>().prop_map(MetaValue::Usize),
        any::<bool>().prop_map(MetaValue::Bool),
        any::<f32>()
            .prop_filter("NaN never compares equal", |v| !v.is_nan())
            .prop_map(MetaValue::F32),
        any::<f64>()
            .prop_filter("NaN never compares equal", |v| !v.is_nan())
            .prop_map(MetaValue::F64),
        any::<char>().prop_map(MetaValue::Char),
        any::<String>().prop_map(MetaValue::String),
        // Roughly +/- 250 years around the epoch, whole milliseconds only.
        (-8_000_000_000_000i64..8_000_000_000_000i64).prop_map(|ms| {
            MetaValue::DateTime(DateTime::<Utc>::from_timestamp_millis(ms).unwrap())
        }),
    ]
}

fn meta_value() -> impl Strategy<Value = MetaValue> {
    prop_oneof![integer_value(), other_value()]
}

proptest! {
    #[test]
    fn metadata_survives_encoding(
        entries in prop::collection::hash_map(".{0,12}", meta_value(), 0..10)
    ) {
        let mut meta = ExtendedMetadata::new();
        for (key, value) in &entries {
            meta.set(key.as_str(), value.clone());
        }

        let bytes = meta.serialize().unwrap();
        prop_assert_eq!(bytes.is_empty(), entries.is_empty());

        let back = ExtendedMetadata::deserialize(&bytes).unwrap();
        prop_assert_eq!(back.len(), entries.len());
        prop_assert_eq!(&back, &meta);
    }
}

#[test]
fn extreme_values_survive_encoding() {
    let mut meta = ExtendedMetadata::new();
    meta.set("", i8::MIN);
    meta.set("before_epoch", DateTime::<Utc>::from_timestamp_millis(-1).unwrap());
    meta.set("glyph", '\u{10FFFF}');
    meta.set("nul", "a\0b");
    meta.set("len", usize::MAX);
    meta.set("wide", i128::MIN);

    let back = ExtendedMetadata::deserialize(&meta.serialize().unwrap()).unwrap();
    assert_eq!(back, meta);
    assert_eq!(back.get(""), Some(&MetaValue::I8(i8::MIN)));
}
