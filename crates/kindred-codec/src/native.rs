use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use kindred_types::{LatLng, Record};
use url::Url;

/// Whole seconds since the Unix epoch, as a distinct temporal field type.
///
/// A plain `i64` field encodes as an Integer; an `EpochSeconds` field encodes
/// as a Timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochSeconds(pub i64);

impl EpochSeconds {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl From<i64> for EpochSeconds {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

/// A language-level value, before encoding or after decoding.
///
/// Each variant is one recognized semantic shape. `Record` is the catch-all
/// arm for nested objects that have already been walked by their schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Native {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Uri(Url),
    /// Owned byte sequence.
    Bytes(Vec<u8>),
    /// Shared fixed-size buffer.
    Buffer(Bytes),
    Instant(DateTime<Utc>),
    Offset(DateTime<FixedOffset>),
    Calendar(DateTime<Local>),
    /// Zone-naive date-time, interpreted in the system zone.
    LocalDateTime(NaiveDateTime),
    Date(NaiveDate),
    SystemTime(SystemTime),
    EpochSeconds(i64),
    GeoPoint(LatLng),
    List(Vec<Native>),
    Map(BTreeMap<String, Native>),
    Record(Record),
}

impl Default for Native {
    fn default() -> Self {
        Self::Null
    }
}

impl Native {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, for logs and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Uri(_) => "uri",
            Self::Bytes(_) => "bytes",
            Self::Buffer(_) => "buffer",
            Self::Instant(_) => "instant",
            Self::Offset(_) => "offset_date_time",
            Self::Calendar(_) => "calendar",
            Self::LocalDateTime(_) => "local_date_time",
            Self::Date(_) => "date",
            Self::SystemTime(_) => "system_time",
            Self::EpochSeconds(_) => "epoch_seconds",
            Self::GeoPoint(_) => "geo_point",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }
}

impl fmt::Display for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::I8(i) => write!(f, "{i}"),
            Self::I16(i) => write!(f, "{i}"),
            Self::I32(i) => write!(f, "{i}"),
            Self::I64(i) => write!(f, "{i}"),
            Self::F32(x) => write!(f, "{x:?}"),
            Self::F64(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Uri(u) => write!(f, "{u}"),
            Self::Bytes(b) => write!(f, "{} bytes", b.len()),
            Self::Buffer(b) => write!(f, "{} bytes", b.len()),
            Self::Instant(ts) => write!(f, "{ts}"),
            Self::Offset(ts) => write!(f, "{ts}"),
            Self::Calendar(ts) => write!(f, "{ts}"),
            Self::LocalDateTime(ts) => write!(f, "{ts}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::SystemTime(st) => write!(f, "{}", DateTime::<Utc>::from(*st)),
            Self::EpochSeconds(s) => write!(f, "@{s}"),
            Self::GeoPoint(p) => write!(f, "{p}"),
            Self::List(items) => write!(f, "list[{}]", items.len()),
            Self::Map(map) => write!(f, "map[{}]", map.len()),
            Self::Record(record) => write!(f, "{record}"),
        }
    }
}

macro_rules! native_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Native {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

native_from!(
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
    Url => Uri,
    Vec<u8> => Bytes,
    Bytes => Buffer,
    DateTime<Utc> => Instant,
    DateTime<FixedOffset> => Offset,
    DateTime<Local> => Calendar,
    NaiveDateTime => LocalDateTime,
    NaiveDate => Date,
    SystemTime => SystemTime,
    LatLng => GeoPoint,
    Vec<Native> => List,
    BTreeMap<String, Native> => Map,
    Record => Record,
);

impl From<&str> for Native {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<EpochSeconds> for Native {
    fn from(value: EpochSeconds) -> Self {
        Self::EpochSeconds(value.0)
    }
}

impl<T: Into<Native>> From<Option<T>> for Native {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
