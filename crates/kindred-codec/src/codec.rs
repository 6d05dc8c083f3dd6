//! Single-value conversion between [`Native`] values and wire [`Value`]s.
//!
//! Encoding is total. Decoding is directed by the declared kind of the
//! target field and returns `None` when the source value has no conversion
//! onto that kind; callers leave the target unmodified in that case.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use bytes::Bytes;
use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use kindred_types::{Record, Value};
use tracing::debug;
use url::Url;

use crate::native::Native;

/// The declared kind of a decode target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// An arbitrary reference: receives the generic decoding of any value.
    Any,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Buffer,
    Uri,
    Instant,
    SystemTime,
    Calendar,
    LocalDateTime,
    OffsetDateTime,
    Date,
    EpochSeconds,
    GeoPoint,
    List,
    Map,
    Record,
}

impl FieldKind {
    pub fn is_integer(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Instant
                | Self::SystemTime
                | Self::Calendar
                | Self::LocalDateTime
                | Self::OffsetDateTime
                | Self::Date
                | Self::EpochSeconds
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Buffer => "buffer",
            Self::Uri => "uri",
            Self::Instant => "instant",
            Self::SystemTime => "system_time",
            Self::Calendar => "calendar",
            Self::LocalDateTime => "local_date_time",
            Self::OffsetDateTime => "offset_date_time",
            Self::Date => "date",
            Self::EpochSeconds => "epoch_seconds",
            Self::GeoPoint => "geo_point",
            Self::List => "list",
            Self::Map => "map",
            Self::Record => "record",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode a native value. Temporal values are normalized to UTC.
pub fn encode(native: Native) -> Value {
    match native {
        Native::Null => Value::Null,
        Native::Bool(b) => Value::Boolean(b),
        Native::I8(i) => Value::Integer(i.into()),
        Native::I16(i) => Value::Integer(i.into()),
        Native::I32(i) => Value::Integer(i.into()),
        Native::I64(i) => Value::Integer(i),
        Native::F32(x) => Value::Float(x.into()),
        Native::F64(x) => Value::Float(x),
        Native::String(s) => Value::String(s),
        Native::Uri(url) => Value::String(url.into()),
        Native::Bytes(bytes) => Value::Blob(Bytes::from(bytes)),
        Native::Buffer(buffer) => Value::Blob(buffer),
        Native::Instant(ts) => Value::Timestamp(ts),
        Native::Offset(ts) => Value::Timestamp(ts.with_timezone(&Utc)),
        Native::Calendar(ts) => Value::Timestamp(ts.with_timezone(&Utc)),
        Native::LocalDateTime(naive) => Value::Timestamp(local_to_utc(naive)),
        Native::Date(date) => Value::Timestamp(date.and_time(NaiveTime::MIN).and_utc()),
        Native::SystemTime(st) => Value::Timestamp(DateTime::<Utc>::from(st)),
        Native::EpochSeconds(secs) => match DateTime::from_timestamp(secs, 0) {
            Some(ts) => Value::Timestamp(ts),
            None => Value::Integer(secs),
        },
        Native::GeoPoint(point) => Value::GeoPoint(point),
        Native::List(items) => Value::List(items.into_iter().map(encode).collect()),
        Native::Map(map) => Value::Record(
            map.into_iter()
                .map(|(name, value)| (name, encode(value)))
                .collect(),
        ),
        Native::Record(record) => Value::Record(record),
    }
}

/// Interpret a zone-naive date-time in the system zone.
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Inside a zone gap: no local reading exists, fall back to UTC.
        None => naive.and_utc(),
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode `value` onto a target of kind `target`.
///
/// Returns `None` when the coercion matrix has no cell for the pair. Null
/// decodes only onto [`FieldKind::Any`]; nullable typed targets handle Null
/// themselves.
pub fn decode(value: &Value, target: FieldKind) -> Option<Native> {
    use FieldKind as K;

    match (value, target) {
        (_, K::Any) => decode_generic(value),

        (Value::Blob(blob), K::Bytes) => Some(Native::Bytes(blob.to_vec())),
        (Value::Blob(blob), K::Buffer) => Some(Native::Buffer(blob.clone())),
        // Invalid sequences become U+FFFD rather than a miss.
        (Value::Blob(blob), K::String) => {
            Some(Native::String(String::from_utf8_lossy(blob).into_owned()))
        }

        (Value::Boolean(b), K::Bool) => Some(Native::Bool(*b)),

        (Value::Float(x), k) if k.is_numeric() => Some(narrow_float(*x, k)),
        (Value::Integer(i), k) if k.is_numeric() => Some(narrow_integer(*i, k)),

        (Value::String(s), K::String) => Some(Native::String(s.clone())),
        (Value::String(s), K::Bytes) => Some(Native::Bytes(s.as_bytes().to_vec())),
        (Value::String(s), K::Buffer) => Some(Native::Buffer(Bytes::copy_from_slice(s.as_bytes()))),
        (Value::String(s), K::Uri) => match Url::parse(s) {
            Ok(url) => Some(Native::Uri(url)),
            Err(e) => {
                debug!(text = %s, error = %e, "string is not a URI");
                None
            }
        },
        (Value::String(s), k) if k.is_integer() => {
            let parsed = decode_integer(s).and_then(|i| narrow_exact(i, k));
            if parsed.is_none() {
                debug!(text = %s, target = %k, "string is not an integer of the target width");
            }
            parsed
        }
        (Value::String(s), K::F32) => parse_float(s).map(Native::F32),
        (Value::String(s), K::F64) => parse_float(s).map(Native::F64),

        (Value::Timestamp(ts), k) if k.is_integer() => Some(narrow_integer(ts.timestamp(), k)),
        (Value::Timestamp(ts), k) => decode_timestamp(ts, k),

        (Value::GeoPoint(point), K::GeoPoint) => Some(Native::GeoPoint(*point)),

        (Value::List(items), K::List) => Some(Native::List(decode_list(items))),
        (Value::Record(record), K::Map) => Some(Native::Map(decode_map(record))),
        (Value::Record(record), K::Record) => Some(Native::Record(record.clone())),

        _ => None,
    }
}

/// Decode a value onto an arbitrary reference target.
///
/// Key values have no generic decoding and yield `None`.
pub fn decode_generic(value: &Value) -> Option<Native> {
    let native = match value {
        Value::Null => Native::Null,
        Value::Boolean(b) => Native::Bool(*b),
        Value::Integer(i) => Native::I64(*i),
        Value::Float(x) => Native::F64(*x),
        Value::String(s) => Native::String(s.clone()),
        Value::Blob(blob) => Native::Bytes(blob.to_vec()),
        Value::Timestamp(ts) => Native::Instant(*ts),
        Value::GeoPoint(point) => Native::GeoPoint(*point),
        Value::List(items) => Native::List(decode_list(items)),
        Value::Record(record) => Native::Map(decode_map(record)),
        Value::Key(_) => return None,
    };
    Some(native)
}

fn decode_list(items: &[Value]) -> Vec<Native> {
    items.iter().filter_map(decode_generic).collect()
}

fn decode_map(record: &Record) -> BTreeMap<String, Native> {
    record
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), decode_generic(value)?)))
        .collect()
}

fn decode_timestamp(ts: &DateTime<Utc>, target: FieldKind) -> Option<Native> {
    let native = match target {
        FieldKind::Instant => Native::Instant(*ts),
        FieldKind::SystemTime => Native::SystemTime(SystemTime::from(*ts)),
        FieldKind::Calendar => Native::Calendar(ts.with_timezone(&Local)),
        // System zone, unlike every other temporal target.
        FieldKind::LocalDateTime => Native::LocalDateTime(ts.with_timezone(&Local).naive_local()),
        FieldKind::OffsetDateTime => Native::Offset(ts.fixed_offset()),
        FieldKind::Date => Native::Date(ts.date_naive()),
        FieldKind::EpochSeconds => Native::EpochSeconds(ts.timestamp()),
        _ => return None,
    };
    Some(native)
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Truncate toward zero. Widths below 32 bits narrow through `i32`.
fn narrow_float(x: f64, target: FieldKind) -> Native {
    match target {
        FieldKind::I8 => Native::I8((x as i32) as i8),
        FieldKind::I16 => Native::I16((x as i32) as i16),
        FieldKind::I32 => Native::I32(x as i32),
        FieldKind::I64 => Native::I64(x as i64),
        FieldKind::F32 => Native::F32(x as f32),
        _ => Native::F64(x),
    }
}

/// Keep the low bits of the source for narrower widths.
///
/// Integers narrow directly and do not pass through `f64`, so `i64` targets
/// stay exact beyond 2^53.
fn narrow_integer(i: i64, target: FieldKind) -> Native {
    match target {
        FieldKind::I8 => Native::I8(i as i8),
        FieldKind::I16 => Native::I16(i as i16),
        FieldKind::I32 => Native::I32(i as i32),
        FieldKind::I64 => Native::I64(i),
        FieldKind::F32 => Native::F32(i as f32),
        _ => Native::F64(i as f64),
    }
}

/// Range-checked narrowing for parsed text.
fn narrow_exact(i: i64, target: FieldKind) -> Option<Native> {
    match target {
        FieldKind::I8 => i8::try_from(i).ok().map(Native::I8),
        FieldKind::I16 => i16::try_from(i).ok().map(Native::I16),
        FieldKind::I32 => i32::try_from(i).ok().map(Native::I32),
        FieldKind::I64 => Some(Native::I64(i)),
        _ => None,
    }
}

fn parse_float<T: std::str::FromStr>(text: &str) -> Option<T> {
    let parsed = text.trim().parse().ok();
    if parsed.is_none() {
        debug!(text = %text, "string is not a decimal number");
    }
    parsed
}

/// Parse an integer literal with an optional sign and radix prefix.
///
/// `0x`, `0X` and `#` select hexadecimal, a leading `0` selects octal, and
/// anything else is decimal.
pub fn decode_integer(text: &str) -> Option<i64> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = if let Some(hex) = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .or_else(|| rest.strip_prefix('#'))
    {
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    if digits.is_empty() || digits.starts_with(|c| c == '+' || c == '-') {
        return None;
    }

    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}
