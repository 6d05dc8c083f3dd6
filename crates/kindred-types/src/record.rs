use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::value::Value;

/// A structured set of named values.
///
/// Property names are kept in sorted order, so iteration order is stable for
/// equal contents but does not reflect insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    properties: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder-style variant of [`Record::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolve a dotted property path through nested records.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_record()?.get(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

/// A record stored under a complete key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub key: Key,
    pub properties: Record,
}

impl Entity {
    pub fn new(key: Key, properties: Record) -> Self {
        Self { key, properties }
    }

    /// An entity carrying only its key (the shape of keys-only query results).
    pub fn key_only(key: Key) -> Self {
        Self {
            key,
            properties: Record::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_value() {
        let mut record = Record::new();
        record.set("a", 1i64).set("a", 2i64);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&Value::Integer(2)));
    }

    #[test]
    fn iteration_order_is_stable() {
        let a = Record::new().with("b", 1i64).with("a", 2i64);
        let b = Record::new().with("a", 2i64).with("b", 1i64);
        assert_eq!(a, b);
        let names: Vec<_> = a.names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn lookup_descends_nested_records() {
        let address = Record::new().with("city", "Tokyo");
        let record = Record::new().with("address", address);
        assert_eq!(record.lookup("address.city"), Some(&Value::from("Tokyo")));
        assert_eq!(record.lookup("address.zip"), None);
        assert_eq!(record.lookup("address.city.more"), None);
    }

    #[test]
    fn display_format() {
        let record = Record::new().with("n", 1i64).with("s", "x");
        assert_eq!(record.to_string(), "{n: 1, s: \"x\"}");
    }
}
