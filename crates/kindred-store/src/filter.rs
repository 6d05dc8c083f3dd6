use std::fmt;

use kindred_types::{Entity, Key, Record, Value};
use serde::{Deserialize, Serialize};

/// A store-native filter expression.
///
/// Property names are dotted paths into nested records. A path that passes
/// through a list property reaches every element of the list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// The property equals `value`, or is a list containing `value`.
    Eq { property: String, value: Value },
    /// The property is present and null.
    IsNull { property: String },
    /// The entity's key is `key` or a descendant of it.
    HasAncestor(Key),
    /// Every sub-filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Self::IsNull {
            property: property.into(),
        }
    }

    pub fn has_ancestor(key: Key) -> Self {
        Self::HasAncestor(key)
    }

    /// Conjunction of two filters.
    pub fn and(left: Filter, right: Filter) -> Self {
        Self::And(vec![left, right])
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Self::Eq { property, value } => {
                property_values(&entity.properties, property).any(|v| v == value)
            }
            Self::IsNull { property } => {
                property_values(&entity.properties, property).any(Value::is_null)
            }
            Self::HasAncestor(ancestor) => entity.key.has_ancestor(ancestor),
            Self::And(filters) => filters.iter().all(|f| f.matches(entity)),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { property, value } => write!(f, "{property} = {value}"),
            Self::IsNull { property } => write!(f, "{property} IS NULL"),
            Self::HasAncestor(key) => write!(f, "__key__ HAS ANCESTOR {key}"),
            Self::And(filters) => {
                f.write_str("(")?;
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    write!(f, "{filter}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Every scalar reachable at `path`, with list properties flattened.
fn property_values<'a>(record: &'a Record, path: &str) -> impl Iterator<Item = &'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut found = Vec::new();
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = record.get(first) {
            collect(value, rest, &mut found);
        }
    }
    found.into_iter()
}

fn collect<'a>(value: &'a Value, rest: &[&str], found: &mut Vec<&'a Value>) {
    match value {
        Value::List(items) => {
            for item in items {
                collect(item, rest, found);
            }
        }
        _ if rest.is_empty() => found.push(value),
        Value::Record(record) => {
            if let Some(next) = record.get(rest[0]) {
                collect(next, &rest[1..], found);
            }
        }
        _ => {}
    }
}
