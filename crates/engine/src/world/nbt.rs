//! Extended-metadata documents in uncompressed NBT.
//!
//! Layout of the root compound:
//!
//! - `Version`: Int, see [`FORMAT_VERSION`].
//! - `Values`: Compound of key -> native NBT tag.
//! - `Kinds`: Compound of key -> String naming the [`MetaKind`].
//!
//! NBT has no unsigned, boolean, char or date tags, so those ride in the
//! nearest signed tag (bit-cast, not widened) and `Kinds` restores them.
//! `isize`/`usize` ride in a Long, 128-bit integers in a two-element
//! LongArray (high word first). Date/times are stored as milliseconds since
//! the Unix epoch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fastnbt::{LongArray, Value};
use serde::{Deserialize, Serialize};

use super::metadata::{MetaKind, MetaValue};
use crate::error::{BlockError, Result};

/// Written into every document; decoding rejects anything else.
pub const FORMAT_VERSION: i32 = 1;

#[derive(Serialize, Deserialize, Debug)]
struct MetadataNbt {
    #[serde(rename = "Version")]
    version: i32,
    #[serde(rename = "Values")]
    values: HashMap<String, Value>,
    #[serde(rename = "Kinds")]
    kinds: HashMap<String, String>,
}

pub(crate) fn encode(entries: &HashMap<String, MetaValue>) -> Result<Vec<u8>> {
    let mut values = HashMap::with_capacity(entries.len());
    let mut kinds = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        values.insert(key.clone(), to_tag(value));
        kinds.insert(key.clone(), value.kind().as_str().to_owned());
    }

    let doc = MetadataNbt {
        version: FORMAT_VERSION,
        values,
        kinds,
    };
    Ok(fastnbt::to_bytes(&doc)?)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<HashMap<String, MetaValue>> {
    let doc: MetadataNbt = fastnbt::from_bytes(bytes)?;
    if doc.version != FORMAT_VERSION {
        return Err(BlockError::MalformedMetadata(format!(
            "unsupported version {}",
            doc.version
        )));
    }
    if doc.kinds.len() != doc.values.len() {
        return Err(BlockError::MalformedMetadata(format!(
            "{} values but {} kinds",
            doc.values.len(),
            doc.kinds.len()
        )));
    }

    let mut entries = HashMap::with_capacity(doc.values.len());
    for (key, tag) in doc.values {
        let Some(kind_name) = doc.kinds.get(&key) else {
            return Err(BlockError::MalformedMetadata(format!("no kind for {key:?}")));
        };
        let Some(kind) = MetaKind::from_name(kind_name) else {
            return Err(BlockError::MalformedMetadata(format!(
                "unknown kind {kind_name:?} for {key:?}"
            )));
        };
        let value = from_tag(kind, &tag)
            .map_err(|reason| BlockError::MalformedMetadata(format!("{key:?}: {reason}")))?;
        entries.insert(key, value);
    }
    Ok(entries)
}

fn to_tag(value: &MetaValue) -> Value {
    match value {
        MetaValue::Bool(v) => Value::Byte(i8::from(*v)),
        MetaValue::I8(v) => Value::Byte(*v),
        MetaValue::U8(v) => Value::Byte(*v as i8),
        MetaValue::I16(v) => Value::Short(*v),
        MetaValue::U16(v) => Value::Short(*v as i16),
        MetaValue::I32(v) => Value::Int(*v),
        MetaValue::U32(v) => Value::Int(*v as i32),
        MetaValue::Char(v) => Value::Int(u32::from(*v) as i32),
        MetaValue::I64(v) => Value::Long(*v),
        MetaValue::U64(v) => Value::Long(*v as i64),
        MetaValue::Isize(v) => Value::Long(*v as i64),
        MetaValue::Usize(v) => Value::Long(*v as u64 as i64),
        MetaValue::I128(v) => split_128(*v as u128),
        MetaValue::U128(v) => split_128(*v),
        MetaValue::F32(v) => Value::Float(*v),
        MetaValue::F64(v) => Value::Double(*v),
        MetaValue::String(v) => Value::String(v.clone()),
        MetaValue::DateTime(v) => Value::Long(v.timestamp_millis()),
    }
}

fn from_tag(kind: MetaKind, tag: &Value) -> std::result::Result<MetaValue, String> {
    let value = match (kind, tag) {
        (MetaKind::Bool, Value::Byte(v)) => MetaValue::Bool(*v != 0),
        (MetaKind::I8, Value::Byte(v)) => MetaValue::I8(*v),
        (MetaKind::U8, Value::Byte(v)) => MetaValue::U8(*v as u8),
        (MetaKind::I16, Value::Short(v)) => MetaValue::I16(*v),
        (MetaKind::U16, Value::Short(v)) => MetaValue::U16(*v as u16),
        (MetaKind::I32, Value::Int(v)) => MetaValue::I32(*v),
        (MetaKind::U32, Value::Int(v)) => MetaValue::U32(*v as u32),
        (MetaKind::Char, Value::Int(v)) => match char::from_u32(*v as u32) {
            Some(c) => MetaValue::Char(c),
            None => return Err(format!("invalid char code point {v:#x}")),
        },
        (MetaKind::I64, Value::Long(v)) => MetaValue::I64(*v),
        (MetaKind::U64, Value::Long(v)) => MetaValue::U64(*v as u64),
        (MetaKind::Isize, Value::Long(v)) => match isize::try_from(*v) {
            Ok(v) => MetaValue::Isize(v),
            Err(_) => return Err(format!("{v} does not fit in isize")),
        },
        (MetaKind::Usize, Value::Long(v)) => match usize::try_from(*v as u64) {
            Ok(v) => MetaValue::Usize(v),
            Err(_) => return Err(format!("{} does not fit in usize", *v as u64)),
        },
        (MetaKind::I128, Value::LongArray(words)) => MetaValue::I128(join_128(words)? as i128),
        (MetaKind::U128, Value::LongArray(words)) => MetaValue::U128(join_128(words)?),
        (MetaKind::F32, Value::Float(v)) => MetaValue::F32(*v),
        (MetaKind::F64, Value::Double(v)) => MetaValue::F64(*v),
        (MetaKind::String, Value::String(v)) => MetaValue::String(v.clone()),
        (MetaKind::DateTime, Value::Long(ms)) => {
            match DateTime::<Utc>::from_timestamp_millis(*ms) {
                Some(t) => MetaValue::DateTime(t),
                None => return Err(format!("timestamp {ms} out of range")),
            }
        }
        (kind, tag) => return Err(format!("{} stored as {:?}", kind.as_str(), tag)),
    };
    Ok(value)
}

fn split_128(v: u128) -> Value {
    let hi = (v >> 64) as u64 as i64;
    let lo = v as u64 as i64;
    Value::LongArray(LongArray::new(vec![hi, lo]))
}

fn join_128(words: &LongArray) -> std::result::Result<u128, String> {
    let words: &[i64] = words;
    match *words {
        [hi, lo] => Ok((u128::from(hi as u64) << 64) | u128::from(lo as u64)),
        _ => Err(format!("expected 2 words for a 128-bit value, got {}", words.len())),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
