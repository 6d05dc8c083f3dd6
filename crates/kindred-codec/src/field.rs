use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use kindred_types::{LatLng, Value};
use url::Url;

use crate::codec::{self, FieldKind};
use crate::native::{EpochSeconds, Native};

/// A field type that can be stored as a record property.
///
/// `KIND` is the declared kind that directs decoding. The default
/// `decode_into` replaces the current value on success and leaves it
/// untouched on a coercion miss; containers override it to refill in place.
pub trait Field: Sized + Send + Sync + 'static {
    const KIND: FieldKind;

    fn to_native(&self) -> Native;

    fn from_native(native: Native) -> Option<Self>;

    /// Decode a wire value into a fresh instance.
    fn decode_value(value: &Value) -> Option<Self> {
        codec::decode(value, Self::KIND).and_then(Self::from_native)
    }

    /// Decode a wire value onto `self`. Returns `false` on a coercion miss.
    fn decode_into(&mut self, value: &Value) -> bool {
        match Self::decode_value(value) {
            Some(decoded) => {
                *self = decoded;
                true
            }
            None => false,
        }
    }
}

macro_rules! scalar_field {
    ($($ty:ty => $kind:ident / $variant:ident),* $(,)?) => {
        $(
            impl Field for $ty {
                const KIND: FieldKind = FieldKind::$kind;

                fn to_native(&self) -> Native {
                    Native::$variant(self.clone())
                }

                fn from_native(native: Native) -> Option<Self> {
                    match native {
                        Native::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

scalar_field!(
    bool => Bool / Bool,
    i8 => I8 / I8,
    i16 => I16 / I16,
    i32 => I32 / I32,
    i64 => I64 / I64,
    f32 => F32 / F32,
    f64 => F64 / F64,
    String => String / String,
    Vec<u8> => Bytes / Bytes,
    Bytes => Buffer / Buffer,
    Url => Uri / Uri,
    DateTime<Utc> => Instant / Instant,
    DateTime<FixedOffset> => OffsetDateTime / Offset,
    DateTime<Local> => Calendar / Calendar,
    NaiveDateTime => LocalDateTime / LocalDateTime,
    NaiveDate => Date / Date,
    SystemTime => SystemTime / SystemTime,
    LatLng => GeoPoint / GeoPoint,
);

impl Field for EpochSeconds {
    const KIND: FieldKind = FieldKind::EpochSeconds;

    fn to_native(&self) -> Native {
        Native::EpochSeconds(self.0)
    }

    fn from_native(native: Native) -> Option<Self> {
        match native {
            Native::EpochSeconds(secs) => Some(Self(secs)),
            _ => None,
        }
    }
}

/// An arbitrary reference: takes whatever the value decodes to, Null included.
impl Field for Native {
    const KIND: FieldKind = FieldKind::Any;

    fn to_native(&self) -> Native {
        self.clone()
    }

    fn from_native(native: Native) -> Option<Self> {
        Some(native)
    }
}

impl Field for BTreeMap<String, Native> {
    const KIND: FieldKind = FieldKind::Map;

    fn to_native(&self) -> Native {
        Native::Map(self.clone())
    }

    fn from_native(native: Native) -> Option<Self> {
        match native {
            Native::Map(map) => Some(map),
            _ => None,
        }
    }

    fn decode_into(&mut self, value: &Value) -> bool {
        match Self::decode_value(value) {
            Some(decoded) => {
                self.clear();
                self.extend(decoded);
                true
            }
            None => false,
        }
    }
}

impl Field for HashMap<String, Native> {
    const KIND: FieldKind = FieldKind::Map;

    fn to_native(&self) -> Native {
        Native::Map(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn from_native(native: Native) -> Option<Self> {
        match native {
            Native::Map(map) => Some(map.into_iter().collect()),
            _ => None,
        }
    }

    fn decode_into(&mut self, value: &Value) -> bool {
        match codec::decode(value, FieldKind::Map) {
            Some(Native::Map(decoded)) => {
                self.clear();
                self.extend(decoded);
                true
            }
            _ => false,
        }
    }
}

/// Element-wise list decoding. One element without a coercion makes the
/// whole value a miss; key elements are dropped.
impl<T: Field> Field for Vec<T> {
    const KIND: FieldKind = FieldKind::List;

    fn to_native(&self) -> Native {
        Native::List(self.iter().map(Field::to_native).collect())
    }

    fn from_native(native: Native) -> Option<Self> {
        match native {
            Native::List(items) => items.into_iter().map(T::from_native).collect(),
            _ => None,
        }
    }

    fn decode_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items
                .iter()
                .filter(|item| !matches!(item, Value::Key(_)))
                .map(T::decode_value)
                .collect(),
            _ => None,
        }
    }

    fn decode_into(&mut self, value: &Value) -> bool {
        match Self::decode_value(value) {
            Some(decoded) => {
                self.clear();
                self.extend(decoded);
                true
            }
            None => false,
        }
    }
}

/// A nullable target: Null clears it, anything else decodes with `T`'s kind.
impl<T: Field> Field for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn to_native(&self) -> Native {
        self.as_ref().map_or(Native::Null, Field::to_native)
    }

    fn from_native(native: Native) -> Option<Self> {
        match native {
            Native::Null => Some(None),
            other => T::from_native(other).map(Some),
        }
    }

    fn decode_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::decode_value(other).map(Some),
        }
    }

    fn decode_into(&mut self, value: &Value) -> bool {
        if value.is_null() {
            *self = None;
            return true;
        }
        if let Some(inner) = self {
            return inner.decode_into(value);
        }
        match T::decode_value(value) {
            Some(decoded) => {
                *self = Some(decoded);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kindred_types::Record;

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    #[test]
    fn miss_leaves_scalar_unmodified() {
        let mut n = 7i32;
        assert!(!n.decode_into(&Value::Blob(Bytes::from_static(b"1"))));
        assert_eq!(n, 7);
        assert!(!n.decode_into(&Value::Null));
        assert_eq!(n, 7);
    }

    #[test]
    fn scalar_decode_replaces_value() {
        let mut n = 7i32;
        assert!(n.decode_into(&Value::Float(3.14)));
        assert_eq!(n, 3);

        let mut s = String::from("old");
        assert!(s.decode_into(&Value::Blob(Bytes::from_static(b"new"))));
        assert_eq!(s, "new");
    }

    #[test]
    fn epoch_seconds_field() {
        let ts = Utc.with_ymd_and_hms(2017, 7, 9, 12, 34, 56).unwrap();
        assert_eq!(EpochSeconds::decode_value(&Value::Timestamp(ts)), Some(EpochSeconds(1_499_603_696)));
        assert_eq!(codec::encode(EpochSeconds(1_499_603_696).to_native()), Value::Timestamp(ts));
    }

    // -----------------------------------------------------------------------
    // Nullable and arbitrary targets
    // -----------------------------------------------------------------------

    #[test]
    fn null_clears_option() {
        let mut field = Some(5i64);
        assert!(field.decode_into(&Value::Null));
        assert_eq!(field, None);
    }

    #[test]
    fn option_decodes_with_inner_kind() {
        let mut field: Option<i64> = None;
        assert!(field.decode_into(&Value::from("42")));
        assert_eq!(field, Some(42));

        assert!(!field.decode_into(&Value::Boolean(true)));
        assert_eq!(field, Some(42));
    }

    #[test]
    fn native_field_takes_anything_and_is_cleared_by_null() {
        let mut field = Native::I64(1);
        assert!(field.decode_into(&Value::from("x")));
        assert_eq!(field, Native::from("x"));
        assert!(field.decode_into(&Value::Null));
        assert_eq!(field, Native::Null);
    }

    // -----------------------------------------------------------------------
    // Containers
    // -----------------------------------------------------------------------

    #[test]
    fn list_decodes_element_wise() {
        let mut field = vec![9i32];
        let value = Value::List(vec![Value::Integer(1), Value::Float(2.5), Value::from("3")]);
        assert!(field.decode_into(&value));
        assert_eq!(field, vec![1, 2, 3]);
    }

    #[test]
    fn list_with_unconvertible_element_is_a_miss() {
        let mut field = vec![9i32];
        let value = Value::List(vec![Value::Integer(1), Value::Boolean(true)]);
        assert!(!field.decode_into(&value));
        assert_eq!(field, vec![9]);
    }

    #[test]
    fn nested_lists() {
        let value = Value::List(vec![
            Value::List(vec![Value::from("a")]),
            Value::List(vec![]),
        ]);
        assert_eq!(
            Vec::<Vec<String>>::decode_value(&value),
            Some(vec![vec!["a".to_string()], vec![]])
        );
    }

    #[test]
    fn bytes_field_is_a_blob_not_a_list() {
        let field = b"ab".to_vec();
        assert_eq!(codec::encode(field.to_native()), Value::Blob(Bytes::from_static(b"ab")));
        assert_eq!(Vec::<u8>::decode_value(&Value::from("ab")), Some(b"ab".to_vec()));
    }

    #[test]
    fn map_field_is_cleared_and_refilled() {
        let mut field = BTreeMap::new();
        field.insert("stale".to_string(), Native::Bool(true));
        let record = Record::new().with("n", 1i64).with("s", "x");
        assert!(field.decode_into(&Value::Record(record)));
        assert_eq!(field.len(), 2);
        assert!(!field.contains_key("stale"));
        assert_eq!(field.get("n"), Some(&Native::I64(1)));
    }

    #[test]
    fn hash_map_field() {
        let mut field: HashMap<String, Native> = HashMap::new();
        assert!(field.decode_into(&Value::Record(Record::new().with("a", true))));
        assert_eq!(field.get("a"), Some(&Native::Bool(true)));
        assert!(!field.decode_into(&Value::Integer(1)));
        assert_eq!(field.len(), 1);
    }
}
