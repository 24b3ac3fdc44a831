use std::any::Any;
use std::collections::HashMap;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use super::nbt;
use crate::error::{BlockError, Result};

/// A single extended-metadata value.
///
/// Only scalars, strings and date/times are representable. Anything nested
/// (lists, maps, arbitrary structs) is rejected at the gate so the document
/// encoding stays flat.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    DateTime(DateTime<Utc>),
}

/// The variant of a [`MetaValue`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    String,
    DateTime,
}

impl MetaKind {
    /// Stable name written into metadata documents.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetaKind::Bool => "bool",
            MetaKind::I8 => "i8",
            MetaKind::I16 => "i16",
            MetaKind::I32 => "i32",
            MetaKind::I64 => "i64",
            MetaKind::I128 => "i128",
            MetaKind::Isize => "isize",
            MetaKind::U8 => "u8",
            MetaKind::U16 => "u16",
            MetaKind::U32 => "u32",
            MetaKind::U64 => "u64",
            MetaKind::U128 => "u128",
            MetaKind::Usize => "usize",
            MetaKind::F32 => "f32",
            MetaKind::F64 => "f64",
            MetaKind::Char => "char",
            MetaKind::String => "string",
            MetaKind::DateTime => "date_time",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => MetaKind::Bool,
            "i8" => MetaKind::I8,
            "i16" => MetaKind::I16,
            "i32" => MetaKind::I32,
            "i64" => MetaKind::I64,
            "i128" => MetaKind::I128,
            "isize" => MetaKind::Isize,
            "u8" => MetaKind::U8,
            "u16" => MetaKind::U16,
            "u32" => MetaKind::U32,
            "u64" => MetaKind::U64,
            "u128" => MetaKind::U128,
            "usize" => MetaKind::Usize,
            "f32" => MetaKind::F32,
            "f64" => MetaKind::F64,
            "char" => MetaKind::Char,
            "string" => MetaKind::String,
            "date_time" => MetaKind::DateTime,
            _ => return None,
        };
        Some(kind)
    }
}

impl MetaValue {
    pub const fn kind(&self) -> MetaKind {
        match self {
            MetaValue::Bool(_) => MetaKind::Bool,
            MetaValue::I8(_) => MetaKind::I8,
            MetaValue::I16(_) => MetaKind::I16,
            MetaValue::I32(_) => MetaKind::I32,
            MetaValue::I64(_) => MetaKind::I64,
            MetaValue::I128(_) => MetaKind::I128,
            MetaValue::Isize(_) => MetaKind::Isize,
            MetaValue::U8(_) => MetaKind::U8,
            MetaValue::U16(_) => MetaKind::U16,
            MetaValue::U32(_) => MetaKind::U32,
            MetaValue::U64(_) => MetaKind::U64,
            MetaValue::U128(_) => MetaKind::U128,
            MetaValue::Usize(_) => MetaKind::Usize,
            MetaValue::F32(_) => MetaKind::F32,
            MetaValue::F64(_) => MetaKind::F64,
            MetaValue::Char(_) => MetaKind::Char,
            MetaValue::String(_) => MetaKind::String,
            MetaValue::DateTime(_) => MetaKind::DateTime,
        }
    }

    /// Downcast a dynamically-typed value into the allowed set.
    ///
    /// A boxed `dyn Any` is looked through, so `&boxed` and `&*boxed` behave
    /// the same. Returns `None` for anything that is not a primitive scalar,
    /// a string or a date/time.
    pub fn from_any(value: &dyn Any) -> Option<Self> {
        if let Some(inner) = value.downcast_ref::<Box<dyn Any>>() {
            return Self::from_any(&**inner);
        }
        if let Some(inner) = value.downcast_ref::<Box<dyn Any + Send>>() {
            return Self::from_any(&**inner);
        }

        macro_rules! try_downcast {
            ($($ty:ty),* $(,)?) => {
                $(
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return Some(MetaValue::from(*v));
                    }
                )*
            };
        }

        try_downcast!(
            bool,
            i8,
            i16,
            i32,
            i64,
            i128,
            isize,
            u8,
            u16,
            u32,
            u64,
            u128,
            usize,
            f32,
            f64,
            char,
            DateTime<Utc>,
        );

        if let Some(v) = value.downcast_ref::<String>() {
            return Some(MetaValue::String(v.clone()));
        }
        if let Some(v) = value.downcast_ref::<&'static str>() {
            return Some(MetaValue::String((*v).to_owned()));
        }
        if let Some(v) = value.downcast_ref::<SystemTime>() {
            return Some(MetaValue::DateTime(DateTime::<Utc>::from(*v)));
        }
        value.downcast_ref::<MetaValue>().cloned()
    }

    /// Any integer variant that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            MetaValue::I8(v) => Some(v.into()),
            MetaValue::I16(v) => Some(v.into()),
            MetaValue::I32(v) => Some(v.into()),
            MetaValue::I64(v) => Some(v),
            MetaValue::U8(v) => Some(v.into()),
            MetaValue::U16(v) => Some(v.into()),
            MetaValue::U32(v) => Some(v.into()),
            MetaValue::U64(v) => i64::try_from(v).ok(),
            MetaValue::I128(v) => i64::try_from(v).ok(),
            MetaValue::U128(v) => i64::try_from(v).ok(),
            MetaValue::Isize(v) => i64::try_from(v).ok(),
            MetaValue::Usize(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            MetaValue::F32(v) => Some(v.into()),
            MetaValue::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            MetaValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match *self {
            MetaValue::DateTime(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for MetaValue {
                fn from(v: $ty) -> Self {
                    MetaValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    DateTime<Utc> => DateTime,
}

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::String(v.to_owned())
    }
}

impl From<SystemTime> for MetaValue {
    fn from(v: SystemTime) -> Self {
        MetaValue::DateTime(v.into())
    }
}

/// Reported by [`ExtendedMetadata::set_any`]; a `&dyn Any` does not carry
/// its concrete type name.
const DYN_TYPE_NAME: &str = "<dyn Any>";

/// Named, optional, scalar-only properties attached to one block instance.
///
/// Entries are only ever added or replaced; there is no removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedMetadata {
    entries: HashMap<String, MetaValue>,
}

impl ExtendedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property. A missing key is `None`, not an error.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Store a property, replacing any previous value under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Store a property whose type is only known at runtime.
    ///
    /// Fails with [`BlockError::UnsupportedType`] for anything outside the
    /// scalar/string/date-time set; the bag is not touched in that case.
    pub fn set_any(&mut self, key: impl Into<String>, value: &dyn Any) -> Result<()> {
        let key = key.into();
        match MetaValue::from_any(value) {
            Some(value) => {
                self.entries.insert(key, value);
                Ok(())
            }
            None => {
                tracing::warn!("Rejected metadata value for {:?}: unsupported type", key);
                Err(BlockError::UnsupportedType {
                    key,
                    type_name: DYN_TYPE_NAME.to_owned(),
                })
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all properties in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode the bag as an NBT document.
    ///
    /// An empty bag encodes to a zero-length buffer, which means "no
    /// metadata" and must not be handed to an NBT parser.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut bytes = nbt::encode(&self.entries)?;
        bytes.shrink_to_fit();
        tracing::debug!(
            "Encoded {} metadata entries into {} bytes",
            self.entries.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Decode a buffer produced by [`serialize`](Self::serialize).
    /// A zero-length buffer yields an empty bag.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let entries = nbt::decode(bytes)?;
        tracing::debug!(
            "Decoded {} metadata entries from {} bytes",
            entries.len(),
            bytes.len()
        );
        Ok(Self { entries })
    }
}
