use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identifier::Identifier;

/// One `(kind, identifier)` element of a hierarchical key path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct PathSegment {
    kind: String,
    id: Identifier,
}

impl PathSegment {
    pub fn new(kind: impl Into<String>, id: impl Into<Identifier>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    fn validate(&self) -> Result<(), TypeError> {
        if self.kind.is_empty() {
            return Err(TypeError::EmptyKind);
        }
        if let Identifier::Name(name) = &self.id {
            if name.is_empty() {
                return Err(TypeError::EmptyName {
                    kind: self.kind.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawSegment {
    kind: String,
    id: Identifier,
}

impl TryFrom<RawSegment> for PathSegment {
    type Error = TypeError;

    fn try_from(raw: RawSegment) -> Result<Self, TypeError> {
        let segment = Self::new(raw.kind, raw.id);
        segment.validate()?;
        Ok(segment)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

/// A complete hierarchical key.
///
/// The last segment is the entity's own location; every preceding segment is
/// one of its ancestors, outermost first. A key always has at least one
/// segment and every segment has a non-empty kind and a non-empty name.
/// Deserialization applies the same checks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawKey")]
pub struct Key {
    path: Vec<PathSegment>,
}

impl Key {
    /// Build a key from a full path, validating every segment.
    pub fn from_path(path: Vec<PathSegment>) -> Result<Self, TypeError> {
        if path.is_empty() {
            return Err(TypeError::EmptyPath);
        }
        for segment in &path {
            segment.validate()?;
        }
        Ok(Self { path })
    }

    /// The full path, outermost ancestor first.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// The ancestor segments (everything but the last).
    pub fn ancestors(&self) -> &[PathSegment] {
        &self.path[..self.path.len() - 1]
    }

    /// The entity's own segment.
    pub fn leaf(&self) -> &PathSegment {
        &self.path[self.path.len() - 1]
    }

    /// The entity kind of this key.
    pub fn kind(&self) -> &str {
        self.leaf().kind()
    }

    /// The identifier of this key.
    pub fn identifier(&self) -> &Identifier {
        self.leaf().id()
    }

    /// The key of the immediate parent, if any.
    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            path: self.ancestors().to_vec(),
        })
    }

    /// Returns `true` if `ancestor` is this key or one of its ancestors.
    pub fn has_ancestor(&self, ancestor: &Key) -> bool {
        self.path.starts_with(&ancestor.path)
    }
}

#[derive(Deserialize)]
struct RawKey {
    path: Vec<PathSegment>,
}

impl TryFrom<RawKey> for Key {
    type Error = TypeError;

    fn try_from(raw: RawKey) -> Result<Self, TypeError> {
        Self::from_path(raw.path)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Builder for keys of one kind under a fixed ancestor path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyFactory {
    kind: String,
    ancestors: Vec<PathSegment>,
}

impl KeyFactory {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ancestors: Vec::new(),
        }
    }

    /// Replace the kind of the keys this factory builds.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn add_ancestor(mut self, segment: PathSegment) -> Self {
        self.ancestors.push(segment);
        self
    }

    /// Append ancestors in order, after any already added.
    pub fn add_ancestors<I>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = PathSegment>,
    {
        self.ancestors.extend(segments);
        self
    }

    /// Build the key `ancestors... / (kind, id)`.
    pub fn new_key(&self, id: impl Into<Identifier>) -> Result<Key, TypeError> {
        let mut path = Vec::with_capacity(self.ancestors.len() + 1);
        path.extend(self.ancestors.iter().cloned());
        path.push(PathSegment::new(self.kind.clone(), id));
        Key::from_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn person_under_kind() -> Key {
        KeyFactory::new("Person")
            .add_ancestor(PathSegment::new("Kind", 1))
            .new_key(123)
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // KeyFactory
    // -----------------------------------------------------------------------

    #[test]
    fn factory_appends_own_segment_last() {
        let key = person_under_kind();
        assert_eq!(key.path().len(), 2);
        assert_eq!(key.kind(), "Person");
        assert_eq!(key.identifier(), &Identifier::Id(123));
        assert_eq!(key.ancestors(), &[PathSegment::new("Kind", 1)]);
    }

    #[test]
    fn factory_without_ancestors_builds_root_key() {
        let key = KeyFactory::new("Person").new_key("alice").unwrap();
        assert!(key.ancestors().is_empty());
        assert!(key.parent().is_none());
    }

    #[test]
    fn factory_kind_can_be_replaced() {
        let key = KeyFactory::new("A")
            .add_ancestors(vec![PathSegment::new("Root", "r")])
            .kind("B")
            .new_key(1)
            .unwrap();
        assert_eq!(key.to_string(), "Root(\"r\")/B(1)");
    }

    #[test]
    fn empty_kind_is_rejected() {
        assert_eq!(
            KeyFactory::new("").new_key(1).unwrap_err(),
            TypeError::EmptyKind
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = KeyFactory::new("Person").new_key("").unwrap_err();
        assert_eq!(
            err,
            TypeError::EmptyName {
                kind: "Person".into()
            }
        );
    }

    #[test]
    fn empty_ancestor_name_is_rejected() {
        let err = KeyFactory::new("Person")
            .add_ancestor(PathSegment::new("Kind", ""))
            .new_key(1)
            .unwrap_err();
        assert!(matches!(err, TypeError::EmptyName { .. }));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(Key::from_path(vec![]).unwrap_err(), TypeError::EmptyPath);
    }

    // -----------------------------------------------------------------------
    // Ancestry
    // -----------------------------------------------------------------------

    #[test]
    fn parent_drops_leaf() {
        let key = person_under_kind();
        let parent = key.parent().unwrap();
        assert_eq!(parent.kind(), "Kind");
        assert_eq!(parent.identifier(), &Identifier::Id(1));
    }

    #[test]
    fn has_ancestor_is_inclusive() {
        let key = person_under_kind();
        let parent = key.parent().unwrap();
        assert!(key.has_ancestor(&parent));
        assert!(key.has_ancestor(&key));
        assert!(!parent.has_ancestor(&key));
    }

    #[test]
    fn has_ancestor_requires_matching_identifier() {
        let key = person_under_kind();
        let other = KeyFactory::new("Kind").new_key(2).unwrap();
        assert!(!key.has_ancestor(&other));
    }

    #[test]
    fn keys_order_by_path() {
        let a = KeyFactory::new("Person").new_key(1).unwrap();
        let b = KeyFactory::new("Person").new_key(2).unwrap();
        let named = KeyFactory::new("Person").new_key("a").unwrap();
        assert!(a < b);
        assert!(b < named);
    }

    #[test]
    fn serde_roundtrip() {
        let key = person_under_kind();
        let json = serde_json::to_string(&key).unwrap();
        let parsed: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn deserialize_rejects_empty_path() {
        assert!(serde_json::from_str::<Key>(r#"{"path":[]}"#).is_err());
    }

    #[test]
    fn deserialize_rejects_invalid_segments() {
        let empty_kind = r#"{"path":[{"kind":"","id":{"Id":1}}]}"#;
        assert!(serde_json::from_str::<Key>(empty_kind).is_err());

        let empty_name = r#"{"kind":"Person","id":{"Name":""}}"#;
        assert!(serde_json::from_str::<PathSegment>(empty_name).is_err());

        let valid = r#"{"path":[{"kind":"Person","id":{"Name":"alice"}}]}"#;
        let key: Key = serde_json::from_str(valid).unwrap();
        assert_eq!(key.kind(), "Person");
    }

    proptest! {
        #[test]
        fn every_prefix_is_an_ancestor(
            ids in prop::collection::vec(prop_oneof![
                any::<i64>().prop_map(Identifier::Id),
                "[a-z]{1,8}".prop_map(Identifier::Name),
            ], 1..6)
        ) {
            let path: Vec<_> = ids
                .into_iter()
                .enumerate()
                .map(|(depth, id)| PathSegment::new(format!("Level{depth}"), id))
                .collect();
            let key = Key::from_path(path.clone()).unwrap();
            for len in 1..=path.len() {
                let prefix = Key::from_path(path[..len].to_vec()).unwrap();
                prop_assert!(key.has_ancestor(&prefix));
            }

            let mut depth = 1;
            let mut current = key;
            while let Some(parent) = current.parent() {
                prop_assert!(current.has_ancestor(&parent));
                current = parent;
                depth += 1;
            }
            prop_assert_eq!(depth, path.len());
        }
    }
}
