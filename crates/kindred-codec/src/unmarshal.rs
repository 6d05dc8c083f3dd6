use std::collections::BTreeMap;

use kindred_types::{Record, Value};
use tracing::trace;

use crate::codec;
use crate::error::CodecResult;
use crate::native::Native;
use crate::schema::Schema;

/// Construct a `T` and apply every property of `record` to it.
pub fn unmarshal<T: Schema>(record: &Record) -> CodecResult<T> {
    let mut object = T::schema().instantiate()?;
    unmarshal_to_object(record, &mut object);
    Ok(object)
}

/// Apply every property of `record` onto `target`.
///
/// Properties with no matching field are dropped. A property whose value has
/// no coercion onto the field's kind leaves that field unmodified.
pub fn unmarshal_to_object<T: Schema>(record: &Record, target: &mut T) {
    let schema = T::schema();
    for (name, value) in record.iter() {
        let Some(field) = schema.field(name) else {
            trace!(type_name = schema.type_name(), property = name, "no such field; property dropped");
            continue;
        };
        if !field.set(target, value) {
            trace!(
                type_name = schema.type_name(),
                property = name,
                value_kind = %value.kind(),
                field_kind = %field.kind(),
                "no coercion; field unmodified"
            );
        }
    }
}

/// Decode a record into a new generic mapping.
pub fn unmarshal_map(record: &Record) -> BTreeMap<String, Native> {
    let mut map = BTreeMap::new();
    unmarshal_to_map(record, &mut map);
    map
}

/// Decode a record onto a generic mapping.
///
/// Nested records merge into a nested mapping already present under the same
/// name. Key values are skipped.
pub fn unmarshal_to_map(record: &Record, map: &mut BTreeMap<String, Native>) {
    for (name, value) in record.iter() {
        match value {
            Value::Key(_) => continue,
            Value::Record(nested) => match map.get_mut(name) {
                Some(Native::Map(existing)) => unmarshal_to_map(nested, existing),
                _ => {
                    map.insert(name.to_string(), Native::Map(unmarshal_map(nested)));
                }
            },
            other => {
                if let Some(native) = codec::decode_generic(other) {
                    map.insert(name.to_string(), native);
                }
            }
        }
    }
}

/// Decode a single value onto a fresh instance of `F`.
pub fn unmarshal_value<F: crate::field::Field>(value: &Value) -> Option<F> {
    F::decode_value(value)
}
